//! Command implementations for the CLI.

pub mod convert;

pub use convert::{execute_convert, validate_args, ConvertArgs};
