//! Re-exports of crates that appear in Substrate's public API.

pub use arcstr;
pub use subgeom;
