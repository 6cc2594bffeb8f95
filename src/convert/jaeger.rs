//! Output data model: the Jaeger-compatible trace document.
//!
//! Field names, casing, and nesting are a compatibility surface consumed
//! by standard trace-visualization front ends; the serde renames here are
//! part of the contract.

use crate::utils::config::REF_CHILD_OF;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One converted trace: a flat span list plus the process map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceDocument {
    #[serde(rename = "traceID")]
    pub trace_id: String,

    /// Insertion order = emission order: parents before descendants,
    /// siblings left-to-right
    pub spans: Vec<Span>,

    /// processID -> process; BTreeMap keeps serialized output stable
    pub processes: BTreeMap<String, Process>,
}

/// A single flattened span
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    #[serde(rename = "traceID")]
    pub trace_id: String,

    #[serde(rename = "spanID")]
    pub span_id: String,

    pub operation_name: String,

    /// Absolute instant in microseconds (0-based when the trace start
    /// could not be anchored to a wall clock)
    pub start_time: i64,

    /// Microseconds, always >= 1
    pub duration: u64,

    /// Zero (root) or exactly one CHILD_OF edge
    pub references: Vec<SpanReference>,

    pub tags: Vec<serde_json::Value>,

    pub logs: Vec<serde_json::Value>,

    #[serde(rename = "processID")]
    pub process_id: String,
}

/// A reference edge between two spans of the same trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanReference {
    #[serde(rename = "refType")]
    pub ref_type: String,

    #[serde(rename = "traceID")]
    pub trace_id: String,

    #[serde(rename = "spanID")]
    pub span_id: String,
}

impl SpanReference {
    pub fn child_of(trace_id: &str, span_id: &str) -> Self {
        Self {
            ref_type: REF_CHILD_OF.to_string(),
            trace_id: trace_id.to_string(),
            span_id: span_id.to_string(),
        }
    }
}

/// One entry of the process map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    #[serde(rename = "serviceName")]
    pub service_name: String,

    pub tags: Vec<serde_json::Value>,
}

impl Process {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            tags: Vec::new(),
        }
    }
}

/// File-format wrapper expected by the Jaeger UI importer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JaegerExport {
    pub data: Vec<TraceDocument>,
}

impl TraceDocument {
    /// Check the structural invariants of a converted document.
    ///
    /// Returns one message per violation: dangling or multiple references,
    /// mismatched trace IDs, duplicate span IDs, zero durations, unknown
    /// process IDs. Used by the `validate` command and by tests.
    pub fn integrity_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen_ids = std::collections::HashSet::new();

        for span in &self.spans {
            if !seen_ids.insert(span.span_id.as_str()) {
                errors.push(format!("duplicate spanID {}", span.span_id));
            }
            if span.trace_id != self.trace_id {
                errors.push(format!(
                    "span {} carries foreign traceID {}",
                    span.span_id, span.trace_id
                ));
            }
            if span.duration == 0 {
                errors.push(format!("span {} has zero duration", span.span_id));
            }
            if span.references.len() > 1 {
                errors.push(format!(
                    "span {} has {} references, expected at most one",
                    span.span_id,
                    span.references.len()
                ));
            }
            if !self.processes.contains_key(&span.process_id) {
                errors.push(format!(
                    "span {} references unknown process {}",
                    span.span_id, span.process_id
                ));
            }
        }

        let known: std::collections::HashSet<&str> =
            self.spans.iter().map(|s| s.span_id.as_str()).collect();
        for span in &self.spans {
            for reference in &span.references {
                if !known.contains(reference.span_id.as_str()) {
                    errors.push(format!(
                        "span {} references missing span {}",
                        span.span_id, reference.span_id
                    ));
                }
            }
        }

        errors
    }
}
