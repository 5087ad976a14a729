//! APIs for inspecting and annotating generated layout.

pub mod cell;
pub mod layers;
