//! Input schema for the raw query-engine trace.
//!
//! The trace emitter is external and unversioned, so every field here is
//! optional or defaulted: a missing field degrades the conversion of one
//! node, never the whole document.

use serde::Deserialize;

/// Top-level raw trace document
#[derive(Debug, Clone, Deserialize)]
pub struct RawTrace {
    pub trace: TraceRoot,
}

/// The `trace` envelope holding the top-level node list
#[derive(Debug, Clone, Deserialize)]
pub struct TraceRoot {
    #[serde(default)]
    pub children: Vec<TraceNode>,
}

/// One node of the recursive raw trace tree.
///
/// A node has either `children` (internal node) or `message` + `timestamp`
/// (leaf). Nodes matching neither shape are skipped during conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct TraceNode {
    #[serde(default)]
    pub message: Option<NodeMessage>,

    /// Offset in milliseconds relative to the trace's own start
    #[serde(default)]
    pub timestamp: Option<f64>,

    #[serde(default)]
    pub children: Option<Vec<TraceNode>>,
}

/// A leaf's `message` field: free text, or (for dispatch leaves) a list of
/// protocol-specific sub-records.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NodeMessage {
    Text(String),
    Dispatch(Vec<DispatchRecord>),
    /// Anything else the emitter produces; skipped by the walker
    Other(serde_json::Value),
}

impl NodeMessage {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            NodeMessage::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Envelope record of a dispatch payload. Only the first record of the
/// list carries the wall-clock anchor and the sub-trace list.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchRecord {
    /// Wall-clock start of the dispatched query, ISO-8601-ish
    #[serde(default)]
    pub start_time: Option<String>,

    #[serde(default)]
    pub duration_ms: Option<f64>,

    #[serde(default)]
    pub traces: Vec<SubTrace>,
}

/// One sub-trace inside a dispatch payload, discriminated by `tag`
#[derive(Debug, Clone, Deserialize)]
pub struct SubTrace {
    #[serde(default)]
    pub tag: Option<String>,

    /// Offset in milliseconds relative to the dispatch start
    #[serde(default)]
    pub timestamp_ms: f64,

    /// Per-thread event lists (present for `query_execution`)
    #[serde(default)]
    pub threads: Vec<ThreadTrace>,

    /// Flat event list (present for generic tags)
    #[serde(default)]
    pub traces: Vec<TraceEvent>,
}

/// Event list of one match thread
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadTrace {
    #[serde(default)]
    pub traces: Vec<TraceEvent>,
}

/// A single timed event inside a sub-trace
#[derive(Debug, Clone, Deserialize)]
pub struct TraceEvent {
    #[serde(default)]
    pub timestamp_ms: f64,

    #[serde(default)]
    pub event: Option<String>,

    #[serde(default)]
    pub tag: Option<String>,
}

impl SubTrace {
    /// Event list of the first match thread, empty when absent
    pub fn first_thread_events(&self) -> &[TraceEvent] {
        self.threads
            .first()
            .map(|t| t.traces.as_slice())
            .unwrap_or(&[])
    }
}
