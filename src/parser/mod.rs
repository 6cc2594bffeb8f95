//! Raw trace parsing and input schema definitions.
//!
//! This module handles:
//! - Deserializing the raw JSON emitted by the query engine
//! - Locating the sub-tree that contains timed work
//! - Extracting the preamble (root service + first operation name)

pub mod schema;
pub mod vespa_trace;

// Re-export main types
pub use schema::{DispatchRecord, NodeMessage, RawTrace, SubTrace, ThreadTrace, TraceEvent, TraceNode};
pub use vespa_trace::{extract_preamble, find_timed_children, parse_trace, Preamble};
