//! Time-base resolution and the recursive tree walk.
//!
//! The walker flattens the raw trace tree into the output span list. Each
//! node is handled by a uniform three-way branch: internal node (has
//! children), dispatch leaf (structured message), or text leaf. Durations
//! for text leaves are forward-looking to the next timestamped sibling.

use super::context::Converter;
use super::{clamp_duration_us, dispatch};
use crate::parser::schema::{NodeMessage, TraceNode};
use crate::parser::{extract_preamble, find_timed_children, RawTrace};
use crate::utils::config::{MIN_DURATION_US, ROOT_PROCESS_ID, TIME_SCALE};
use crate::utils::error::ConvertError;
use chrono::{DateTime, NaiveDateTime};
use log::{debug, warn};

/// Fallback format for wall-clock stamps the engine writes without a zone
const WALL_CLOCK_FALLBACK: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Parse a wall-clock instant into microseconds since the epoch.
///
/// RFC 3339 first; the engine also emits zone-less `YYYY-MM-DD HH:MM:SS.f`
/// stamps, read as UTC.
pub(crate) fn parse_wall_clock_us(text: &str) -> Option<f64> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.timestamp_millis() as f64 * TIME_SCALE);
    }
    NaiveDateTime::parse_from_str(text, WALL_CLOCK_FALLBACK)
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis() as f64 * TIME_SCALE)
}

/// Resolve the absolute trace start in microseconds.
///
/// Depth-first search for the first dispatch leaf carrying a parseable
/// wall-clock start; the trace start is that instant minus the leaf's own
/// relative offset. 0 when nothing anchors the trace (degraded mode: all
/// output timestamps stay relative).
pub(crate) fn find_trace_start(nodes: &[TraceNode]) -> f64 {
    for node in nodes {
        if let Some(children) = &node.children {
            let start = find_trace_start(children);
            if start != 0.0 {
                return start;
            }
        } else if let Some(NodeMessage::Dispatch(records)) = &node.message {
            let parsed = records
                .first()
                .and_then(|record| record.start_time.as_deref())
                .and_then(parse_wall_clock_us);
            if let Some(start) = parsed {
                return start - node.timestamp.unwrap_or(0.0) * TIME_SCALE;
            }
        }
    }
    0.0
}

/// Forward-looking duration of the leaf at `index`: gap to the next
/// sibling carrying a timestamp. The last timestamped leaf gets the floor.
fn forward_duration_us(siblings: &[TraceNode], index: usize, timestamp_ms: f64) -> u64 {
    match siblings[index + 1..].iter().find_map(|n| n.timestamp) {
        Some(next_ms) => clamp_duration_us((next_ms - timestamp_ms) * TIME_SCALE),
        None => MIN_DURATION_US,
    }
}

/// Overall trace duration: the last top-level timestamp, scaled
fn total_duration_us(nodes: &[TraceNode]) -> u64 {
    match nodes.iter().rev().find_map(|n| n.timestamp) {
        Some(last_ms) => clamp_duration_us(last_ms * TIME_SCALE),
        None => MIN_DURATION_US,
    }
}

impl Converter {
    /// Run the full conversion over one parsed raw trace.
    ///
    /// Locator, time-base resolver, then the top-level driving loop.
    pub fn transform(&mut self, raw: &RawTrace) -> Result<(), ConvertError> {
        let top = &raw.trace.children;
        let preamble = extract_preamble(top).ok_or(ConvertError::MissingPreamble)?;
        let located = find_timed_children(top).ok_or(ConvertError::NoTimedWork)?;

        self.trace_start_us = find_trace_start(located);
        if self.trace_start_us == 0.0 {
            debug!("No wall-clock anchor found; timestamps stay relative");
        }

        self.set_root_process(preamble.service_name);
        let first = self.push_span(
            self.trace_start_us,
            total_duration_us(located),
            ROOT_PROCESS_ID,
            &preamble.operation_name,
            None,
        );

        self.walk_level(located, first);

        if self.skipped_nodes() > 0 {
            warn!("Skipped {} nodes with unrecognized shape", self.skipped_nodes());
        }
        Ok(())
    }

    /// Walk one level of siblings under the span at `parent_idx`,
    /// applying the three-way branch to each node.
    fn walk_level(&mut self, siblings: &[TraceNode], parent_idx: usize) {
        let parent_id = self.span_id_at(parent_idx);

        for (index, node) in siblings.iter().enumerate() {
            if node.children.is_some() {
                // Nested timeline segment sharing the parent's operation:
                // flatten into a same-named sibling span so the timeline
                // stays readable in tools assuming non-overlapping children.
                let operation = self.operation_name_at(parent_idx);
                let parent_duration = self.duration_at(parent_idx);
                let process_id = self.resolve_process(&operation);
                let start =
                    self.trace_start_us + node.timestamp.unwrap_or(0.0) * TIME_SCALE;
                let segment = self.push_span(
                    start,
                    parent_duration,
                    &process_id,
                    &operation,
                    Some(&parent_id),
                );
                self.descend(node, segment);
                continue;
            }

            match (&node.message, node.timestamp) {
                (Some(NodeMessage::Dispatch(records)), _) => {
                    dispatch::expand_dispatch(self, records, &parent_id);
                }
                (Some(NodeMessage::Text(text)), Some(timestamp_ms)) => {
                    let duration = forward_duration_us(siblings, index, timestamp_ms);
                    let process_id = self.resolve_process(text);
                    self.push_span(
                        self.trace_start_us + timestamp_ms * TIME_SCALE,
                        duration,
                        &process_id,
                        text,
                        Some(&parent_id),
                    );
                }
                _ => {
                    warn!("Skipping trace node with unrecognized shape");
                    self.count_skipped();
                }
            }
        }
    }

    /// Recurse into an internal node whose span is already emitted at
    /// `parent_idx`. The node's own duration is the window spanned by its
    /// first and last child.
    fn descend(&mut self, node: &TraceNode, parent_idx: usize) {
        let Some(children) = node.children.as_deref() else {
            return;
        };

        let first_ts = children.first().and_then(|c| c.timestamp);
        let last_ts = children.last().and_then(|c| c.timestamp);
        let window = match (first_ts, last_ts) {
            (Some(first), Some(last)) => clamp_duration_us((last - first) * TIME_SCALE),
            _ => MIN_DURATION_US,
        };
        self.set_duration(parent_idx, window);

        self.walk_level(children, parent_idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(value: serde_json::Value) -> Vec<TraceNode> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_wall_clock_rfc3339() {
        let us = parse_wall_clock_us("2024-03-18T10:00:00.000Z").unwrap();
        assert_eq!(us, 1_710_756_000_000_000.0);
    }

    #[test]
    fn test_parse_wall_clock_fallback_format() {
        let us = parse_wall_clock_us("2024-03-18 10:00:00.000").unwrap();
        assert_eq!(us, 1_710_756_000_000_000.0);
    }

    #[test]
    fn test_parse_wall_clock_garbage() {
        assert!(parse_wall_clock_us("not a date").is_none());
    }

    #[test]
    fn test_find_trace_start_subtracts_relative_offset() {
        let located = nodes(serde_json::json!([
            {"message": "text leaf", "timestamp": 0.1},
            {"message": [{"start_time": "2024-03-18T10:00:00.000Z"}], "timestamp": 2.0}
        ]));

        let start = find_trace_start(&located);
        assert_eq!(start, 1_710_756_000_000_000.0 - 2000.0);
    }

    #[test]
    fn test_find_trace_start_degrades_to_zero() {
        let located = nodes(serde_json::json!([
            {"message": "no anchor here", "timestamp": 0.1}
        ]));
        assert_eq!(find_trace_start(&located), 0.0);
    }

    #[test]
    fn test_forward_duration_skips_untimed_siblings() {
        let siblings = nodes(serde_json::json!([
            {"message": "a", "timestamp": 1.0},
            {"message": "no timestamp"},
            {"message": "b", "timestamp": 4.0}
        ]));
        assert_eq!(forward_duration_us(&siblings, 0, 1.0), 3000);
    }

    #[test]
    fn test_forward_duration_last_leaf_gets_floor() {
        let siblings = nodes(serde_json::json!([
            {"message": "a", "timestamp": 1.0}
        ]));
        assert_eq!(forward_duration_us(&siblings, 0, 1.0), MIN_DURATION_US);
    }

    #[test]
    fn test_total_duration_uses_last_timestamp() {
        let located = nodes(serde_json::json!([
            {"message": "a", "timestamp": 0.1},
            {"message": "b", "timestamp": 0.3},
            {"message": "untimed"}
        ]));
        assert_eq!(total_duration_us(&located), 300);
    }
}
