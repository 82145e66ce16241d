//! Plan document parsing, unit validation, and config loading

mod loader;
mod plan_file;
mod unit;

pub use loader::*;
pub use plan_file::*;
pub use unit::*;
