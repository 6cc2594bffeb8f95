//! Expansion of embedded dispatch payloads.
//!
//! A dispatch leaf carries the engine-internal execution trace of one
//! dispatched query: an envelope with a wall-clock anchor, a list of
//! tagged sub-traces, and per-thread event lists. Each dispatch instance
//! is a distinct runtime entity, so its processes are minted fresh and
//! never deduplicated.

use super::clamp_duration_us;
use super::context::{gen_ran_hex, Converter};
use super::walker::parse_wall_clock_us;
use crate::parser::schema::{DispatchRecord, SubTrace, TraceEvent};
use crate::utils::config::{
    DISPATCH_OPERATION_NAME, DISPATCH_SERVICE_PREFIX, MIN_DURATION_US, TAG_QUERY_EXECUTION,
    TAG_QUERY_EXECUTION_PLAN, TERMINAL_EVENT_LABELS, TIME_SCALE,
};
use log::{debug, warn};

/// Expand one dispatch payload into spans under `parent_id`.
pub(crate) fn expand_dispatch(
    converter: &mut Converter,
    records: &[DispatchRecord],
    parent_id: &str,
) {
    let Some(envelope) = records.first() else {
        warn!("Dispatch payload is empty, skipping");
        converter.count_skipped();
        return;
    };

    // The dispatch is anchored on its own wall clock, independent of the
    // resolved trace start.
    let start_us = envelope
        .start_time
        .as_deref()
        .and_then(parse_wall_clock_us)
        .unwrap_or_else(|| {
            debug!("Dispatch payload has no parseable start_time, anchoring at 0");
            0.0
        });

    let process_key = gen_ran_hex(5);
    converter.insert_process(
        process_key.clone(),
        format!("{}{}", DISPATCH_SERVICE_PREFIX, gen_ran_hex(3)),
    );

    let wrapper = converter.push_span(
        start_us,
        clamp_duration_us(envelope.duration_ms.unwrap_or(0.0) * TIME_SCALE),
        &process_key,
        DISPATCH_OPERATION_NAME,
        Some(parent_id),
    );
    let wrapper_id = converter.span_id_at(wrapper);

    for (index, sub) in envelope.traces.iter().enumerate() {
        expand_sub_trace(converter, envelope, sub, index, start_us, &wrapper_id);
    }
}

/// Emit the span for one tagged sub-trace plus one span per nested event.
fn expand_sub_trace(
    converter: &mut Converter,
    envelope: &DispatchRecord,
    sub: &SubTrace,
    index: usize,
    dispatch_start_us: f64,
    wrapper_id: &str,
) {
    let tag = sub.tag.as_deref().unwrap_or("trace");
    let timestamp_ms = sub.timestamp_ms;

    // Fresh process per sub-trace occurrence, bypassing the name cache
    let process_id = converter.mint_process(tag.to_string());

    let (events, anchor_ms, duration) = match tag {
        // The engine registers this sub-trace at the END of its window;
        // duration is measured backward to the first nested event.
        TAG_QUERY_EXECUTION => {
            let events = sub.first_thread_events();
            let first_ms = events
                .first()
                .map(|e| e.timestamp_ms)
                .unwrap_or(timestamp_ms);
            let duration = clamp_duration_us((timestamp_ms - first_ms) * TIME_SCALE);
            (events, first_ms, duration)
        }
        // No nested events; the end boundary comes from the next sibling
        // (two-step lookahead when that sibling is a query_execution).
        TAG_QUERY_EXECUTION_PLAN => {
            let duration = match envelope.traces.get(index + 1) {
                Some(next) => {
                    let end_ms = if next.tag.as_deref() == Some(TAG_QUERY_EXECUTION) {
                        next.first_thread_events()
                            .first()
                            .map(|e| e.timestamp_ms)
                            .unwrap_or(next.timestamp_ms)
                    } else {
                        next.timestamp_ms
                    };
                    clamp_duration_us((end_ms - timestamp_ms) * TIME_SCALE)
                }
                None => MIN_DURATION_US,
            };
            (&[][..], timestamp_ms, duration)
        }
        _ => {
            let events = sub.traces.as_slice();
            let first_ms = events
                .first()
                .map(|e| e.timestamp_ms)
                .unwrap_or(timestamp_ms);
            let duration = clamp_duration_us((timestamp_ms - first_ms) * TIME_SCALE);
            (events, first_ms, duration)
        }
    };

    let sub_span = converter.push_span(
        dispatch_start_us + anchor_ms * TIME_SCALE,
        duration,
        &process_id,
        tag,
        Some(wrapper_id),
    );
    let sub_span_id = converter.span_id_at(sub_span);

    for (position, event) in events.iter().enumerate() {
        emit_event_span(
            converter,
            events,
            event,
            position,
            timestamp_ms,
            dispatch_start_us,
            &process_id,
            &sub_span_id,
        );
    }
}

/// Emit the span for one nested event.
///
/// Forward-looking duration to the next event, except the terminal labels
/// that mark the tail of the window: those measure backward to the
/// sub-trace's own timestamp.
#[allow(clippy::too_many_arguments)]
fn emit_event_span(
    converter: &mut Converter,
    events: &[TraceEvent],
    event: &TraceEvent,
    position: usize,
    sub_timestamp_ms: f64,
    dispatch_start_us: f64,
    process_id: &str,
    sub_span_id: &str,
) {
    let event_ms = event.timestamp_ms;

    let (operation, backward) = match (&event.event, &event.tag) {
        (Some(label), _) => {
            let backward = TERMINAL_EVENT_LABELS.contains(&label.as_str());
            (label.as_str(), backward)
        }
        (None, Some(tag)) => (tag.as_str(), false),
        (None, None) => ("event", false),
    };

    let duration = if backward {
        clamp_duration_us((sub_timestamp_ms - event_ms) * TIME_SCALE)
    } else {
        match events.get(position + 1) {
            Some(next) => clamp_duration_us((next.timestamp_ms - event_ms) * TIME_SCALE),
            None => MIN_DURATION_US,
        }
    };

    converter.push_span(
        dispatch_start_us + event_ms * TIME_SCALE,
        duration,
        process_id,
        operation,
        Some(sub_span_id),
    );
}
