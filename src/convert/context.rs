//! Per-conversion state.
//!
//! Everything a single conversion mutates lives here: the trace ID, the
//! emitted span list, the process map, the service-name cache, and the
//! running counters. A fresh [`Converter`] per call keeps repeated and
//! concurrent conversions fully independent.

use super::jaeger::{Process, Span, SpanReference, TraceDocument};
use super::names::extract_service_name;
use super::to_micros;
use crate::utils::config::ROOT_PROCESS_ID;
use log::debug;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Generate a random hex string of `len` digits.
///
/// Not cryptographic; the contract is only uniqueness within one output
/// document.
pub(crate) fn gen_ran_hex(len: usize) -> String {
    let mut rng = rand::rng();
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        out.push(HEX_DIGITS[rng.random_range(0..16)] as char);
    }
    out
}

/// State of one conversion call
pub struct Converter {
    trace_id: String,
    spans: Vec<Span>,
    processes: BTreeMap<String, Process>,

    /// service name -> processID; guarantees idempotent assignment
    name_cache: HashMap<String, String>,

    /// Next numeric suffix for minted `pN` keys (p0 is the root process)
    next_process: u32,

    /// Resolved trace start in microseconds; 0 means unanchored
    pub(crate) trace_start_us: f64,

    /// Leaf nodes whose shape was not recognized and had to be skipped
    skipped_nodes: u32,
}

impl Converter {
    pub fn new() -> Self {
        Self {
            trace_id: gen_ran_hex(32),
            spans: Vec::new(),
            processes: BTreeMap::new(),
            name_cache: HashMap::new(),
            next_process: 1,
            trace_start_us: 0.0,
            skipped_nodes: 0,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Number of nodes skipped because their shape was unrecognized
    pub fn skipped_nodes(&self) -> u32 {
        self.skipped_nodes
    }

    pub(crate) fn count_skipped(&mut self) {
        self.skipped_nodes += 1;
    }

    /// Register the root process `p0`
    pub(crate) fn set_root_process(&mut self, service_name: String) {
        self.processes
            .insert(ROOT_PROCESS_ID.to_string(), Process::new(service_name));
    }

    /// Resolve an operation name to a process ID.
    ///
    /// Names without a dotted identifier map to the root process; the rest
    /// go through the name cache, so the same service name always yields
    /// the same process ID within one conversion.
    pub(crate) fn resolve_process(&mut self, operation_name: &str) -> String {
        let Some(service) = extract_service_name(operation_name) else {
            return ROOT_PROCESS_ID.to_string();
        };
        if let Some(id) = self.name_cache.get(service) {
            return id.clone();
        }
        let service = service.to_string();
        let id = self.mint_process(service.clone());
        self.name_cache.insert(service, id.clone());
        id
    }

    /// Mint a fresh `pN` process entry, bypassing the name cache.
    ///
    /// Used for dispatch sub-traces, which are distinct runtime instances
    /// rather than reusable services. The counter is shared with
    /// [`resolve_process`](Self::resolve_process) so keys never collide.
    pub(crate) fn mint_process(&mut self, service_name: String) -> String {
        let id = format!("p{}", self.next_process);
        self.next_process += 1;
        self.processes.insert(id.clone(), Process::new(service_name));
        id
    }

    /// Register a process under an explicit (random) key
    pub(crate) fn insert_process(&mut self, key: String, service_name: String) {
        self.processes.insert(key, Process::new(service_name));
    }

    /// Emit a span and return its index in the output list.
    ///
    /// `parent` is the spanID of the structural parent; `None` only for
    /// the root span.
    pub(crate) fn push_span(
        &mut self,
        start_us: f64,
        duration_us: u64,
        process_id: &str,
        operation_name: &str,
        parent: Option<&str>,
    ) -> usize {
        let references = match parent {
            Some(parent_id) => vec![SpanReference::child_of(&self.trace_id, parent_id)],
            None => Vec::new(),
        };
        self.spans.push(Span {
            trace_id: self.trace_id.clone(),
            span_id: gen_ran_hex(16),
            operation_name: operation_name.to_string(),
            start_time: to_micros(start_us),
            duration: duration_us,
            references,
            tags: Vec::new(),
            logs: Vec::new(),
            process_id: process_id.to_string(),
        });
        self.spans.len() - 1
    }

    pub(crate) fn span_id_at(&self, index: usize) -> String {
        self.spans[index].span_id.clone()
    }

    pub(crate) fn operation_name_at(&self, index: usize) -> String {
        self.spans[index].operation_name.clone()
    }

    pub(crate) fn set_duration(&mut self, index: usize, duration_us: u64) {
        self.spans[index].duration = duration_us;
    }

    pub(crate) fn duration_at(&self, index: usize) -> u64 {
        self.spans[index].duration
    }

    /// Finish the conversion and hand over the document
    pub fn into_document(self) -> TraceDocument {
        debug!(
            "Conversion finished: {} spans, {} processes, {} skipped nodes",
            self.spans.len(),
            self.processes.len(),
            self.skipped_nodes
        );
        TraceDocument {
            trace_id: self.trace_id,
            spans: self.spans,
            processes: self.processes,
        }
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}
