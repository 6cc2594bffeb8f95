//! Entry points for reading the raw trace document.
//!
//! Deserializes the engine's JSON, locates the node list that contains
//! timed work, and pulls the root service / first operation name out of
//! the preamble message.

use super::schema::{RawTrace, TraceNode};
use crate::utils::config::{
    DEFAULT_OPERATION_NAME, PREAMBLE_OPERATION_TOKEN, PREAMBLE_SERVICE_TOKEN,
};
use crate::utils::error::ParseError;
use log::debug;

/// Parse a raw trace document from JSON
///
/// # Errors
/// * `ParseError::JsonError` - the document does not match the raw trace shape
pub fn parse_trace(raw: &serde_json::Value) -> Result<RawTrace, ParseError> {
    let trace: RawTrace = serde_json::from_value(raw.clone())?;
    debug!(
        "Parsed raw trace with {} top-level nodes",
        trace.trace.children.len()
    );
    Ok(trace)
}

/// Locate the node list containing timed work.
///
/// Scans the top-level nodes in order and returns the `children` of the
/// first node exposing one. `None` means the input violates the expected
/// shape; the caller treats that as fatal.
pub fn find_timed_children(nodes: &[TraceNode]) -> Option<&[TraceNode]> {
    nodes
        .iter()
        .find_map(|node| node.children.as_deref())
}

/// Root service name and first operation name, derived from the preamble
#[derive(Debug, Clone)]
pub struct Preamble {
    pub service_name: String,
    pub operation_name: String,
}

/// Extract the preamble from the first top-level node's text message.
///
/// Token 3 of the whitespace-split message is the root process's service
/// name, token 6 the first span's operation name. Messages too short for
/// those indices degrade to the whole message / a fixed operation name
/// rather than failing.
pub fn extract_preamble(nodes: &[TraceNode]) -> Option<Preamble> {
    let text = nodes.first()?.message.as_ref()?.as_text()?;
    let tokens: Vec<&str> = text.split_whitespace().collect();

    let service_name = tokens
        .get(PREAMBLE_SERVICE_TOKEN)
        .map(|t| t.to_string())
        .unwrap_or_else(|| text.to_string());
    let operation_name = tokens
        .get(PREAMBLE_OPERATION_TOKEN)
        .map(|t| t.to_string())
        .unwrap_or_else(|| DEFAULT_OPERATION_NAME.to_string());

    Some(Preamble {
        service_name,
        operation_name,
    })
}
