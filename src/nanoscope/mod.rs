//! Core Nanoscope reader module

pub mod format;
pub mod reader;
pub mod types;
pub mod utils;

pub use reader::NanoscopeReader;
pub use types::error::{NanoscopeError, Result};
