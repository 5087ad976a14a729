pub mod deps;
pub mod error;
pub mod layout;
pub mod pdk;

pub(crate) mod log;
