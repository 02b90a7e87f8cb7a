pub mod defs;
pub mod empty;

pub use defs::*;
