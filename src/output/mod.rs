//! Output writers for converted trace documents.

pub mod json;

pub use json::{read_export, write_export};
