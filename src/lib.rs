//! Vespa Trace Convert
//!
//! Converts Vespa query execution traces (deeply nested, heterogeneous
//! JSON) into flat Jaeger-compatible trace documents, consumable by any
//! standard trace-visualization front end.
//!
//! This crate provides the core implementation for the
//! `vespa-trace` CLI tool; the conversion itself is available as a
//! library call:
//!
//! ```ignore
//! let raw: serde_json::Value = serde_json::from_str(&input)?;
//! let document = vespa_trace_convert::convert_trace(&raw)?;
//! ```

pub mod commands;
pub mod convert;
pub mod output;
pub mod parser;
pub mod utils;

pub use convert::{convert_trace, Converter, TraceDocument};
pub use utils::error::{ConvertError, OutputError, ParseError};
