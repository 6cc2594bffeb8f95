//! End-to-end conversion scenarios over in-memory raw traces.

use pretty_assertions::assert_eq;
use serde_json::json;
use vespa_trace_convert::convert::{convert_trace, Span, TraceDocument};
use vespa_trace_convert::utils::error::ConvertError;

/// Preamble leaf: token 3 = "container" (service), token 6 = "search" (operation)
fn preamble() -> serde_json::Value {
    json!({"message": "query execution for container at node0 search", "timestamp": 0})
}

fn raw_trace(children: serde_json::Value) -> serde_json::Value {
    json!({"trace": {"children": children}})
}

fn find_span<'a>(document: &'a TraceDocument, operation: &str) -> &'a Span {
    document
        .spans
        .iter()
        .find(|s| s.operation_name == operation)
        .unwrap_or_else(|| panic!("no span named {operation}"))
}

#[test]
fn test_flat_trace_produces_four_spans() {
    let raw = raw_trace(json!([
        preamble(),
        {"children": [
            {"message": "first phase", "timestamp": 0.1},
            {"message": "second phase", "timestamp": 0.2},
            {"message": "third phase", "timestamp": 0.3}
        ]}
    ]));

    let document = convert_trace(&raw).unwrap();

    assert_eq!(document.spans.len(), 4);

    let root = &document.spans[0];
    assert_eq!(root.operation_name, "search");
    assert_eq!(root.duration, 300);
    assert!(root.references.is_empty());

    // forward-looking leaf durations, floor for the last leaf
    assert_eq!(document.spans[1].duration, 100);
    assert_eq!(document.spans[2].duration, 100);
    assert_eq!(document.spans[3].duration, 1);

    // no dotted names and no wall-clock anchor: everything on p0, relative times
    for span in &document.spans {
        assert_eq!(span.process_id, "p0");
    }
    assert_eq!(document.processes["p0"].service_name, "container");
    assert_eq!(document.spans[1].start_time, 100);
    assert_eq!(document.spans[3].start_time, 300);

    for span in &document.spans[1..] {
        assert_eq!(span.references.len(), 1);
        assert_eq!(span.references[0].ref_type, "CHILD_OF");
        assert_eq!(span.references[0].span_id, root.span_id);
        assert_eq!(span.references[0].trace_id, document.trace_id);
    }
}

#[test]
fn test_identifier_shape_and_uniqueness() {
    let raw = raw_trace(json!([
        preamble(),
        {"children": [
            {"message": "a", "timestamp": 0.1},
            {"message": "b", "timestamp": 0.2}
        ]}
    ]));

    let document = convert_trace(&raw).unwrap();

    assert_eq!(document.trace_id.len(), 32);
    assert!(document.trace_id.chars().all(|c| c.is_ascii_hexdigit()));

    let mut seen = std::collections::HashSet::new();
    for span in &document.spans {
        assert_eq!(span.span_id.len(), 16);
        assert!(span.span_id.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(seen.insert(span.span_id.clone()), "duplicate span id");
        assert_eq!(span.trace_id, document.trace_id);
    }

    assert!(document.integrity_errors().is_empty());
}

#[test]
fn test_dotted_names_share_a_process() {
    let raw = raw_trace(json!([
        preamble(),
        {"children": [
            {"message": "Invoke searcher my.pkg.ServiceName", "timestamp": 0.1},
            {"message": "Return searcher my.pkg.ServiceName", "timestamp": 0.2},
            {"message": "other.pkg.Second stage", "timestamp": 0.3}
        ]}
    ]));

    let document = convert_trace(&raw).unwrap();

    let invoke = find_span(&document, "Invoke searcher my.pkg.ServiceName");
    let ret = find_span(&document, "Return searcher my.pkg.ServiceName");
    let second = find_span(&document, "other.pkg.Second stage");

    assert_eq!(invoke.process_id, ret.process_id);
    assert_eq!(
        document.processes[&invoke.process_id].service_name,
        "ServiceName"
    );
    assert_ne!(second.process_id, invoke.process_id);
    assert_eq!(document.processes[&second.process_id].service_name, "Second");
}

#[test]
fn test_nested_children_become_sibling_segments() {
    let raw = raw_trace(json!([
        preamble(),
        {"children": [
            {"message": "before", "timestamp": 0.1},
            {"timestamp": 0.2, "children": [
                {"message": "inner one", "timestamp": 0.25},
                {"message": "inner two", "timestamp": 0.45}
            ]}
        ]}
    ]));

    let document = convert_trace(&raw).unwrap();
    assert_eq!(document.spans.len(), 5);

    let root = &document.spans[0];

    // the leaf before the nested segment is bounded by the segment's timestamp
    let before = find_span(&document, "before");
    assert_eq!(before.duration, 100);

    // the nested segment reuses the parent's operation name and hangs off it
    let segment = &document.spans[2];
    assert_eq!(segment.operation_name, "search");
    assert_eq!(segment.start_time, 200);
    assert_eq!(segment.duration, 200); // inner window 0.25..0.45
    assert_eq!(segment.references[0].span_id, root.span_id);

    let inner_one = find_span(&document, "inner one");
    let inner_two = find_span(&document, "inner two");
    assert_eq!(inner_one.duration, 200);
    assert_eq!(inner_two.duration, 1);
    assert_eq!(inner_one.references[0].span_id, segment.span_id);
    assert_eq!(inner_two.references[0].span_id, segment.span_id);
}

#[test]
fn test_dispatch_expansion() {
    let raw = raw_trace(json!([
        preamble(),
        {"children": [
            {"timestamp": 0.2, "message": [{
                "start_time": "2024-03-18T10:00:00.000Z",
                "duration_ms": 5.0,
                "traces": [
                    {"tag": "query_execution_plan", "timestamp_ms": 1.0},
                    {"tag": "query_execution", "timestamp_ms": 4.0, "threads": [
                        {"traces": [
                            {"timestamp_ms": 2.0, "event": "Start query setup"},
                            {"timestamp_ms": 3.0, "event": "Complete query setup"}
                        ]}
                    ]},
                    {"tag": "custom_phase", "timestamp_ms": 6.0, "traces": [
                        {"timestamp_ms": 5.0, "tag": "init"}
                    ]}
                ]
            }]}
        ]}
    ]));

    let document = convert_trace(&raw).unwrap();
    assert!(document.integrity_errors().is_empty());

    let dispatch_start: i64 = 1_710_756_000_000_000;

    // trace start anchored by the dispatch wall clock minus the leaf offset
    let root = &document.spans[0];
    assert_eq!(root.start_time, dispatch_start - 200);

    let wrapper = find_span(&document, "Search Dispatch");
    assert_eq!(wrapper.start_time, dispatch_start);
    assert_eq!(wrapper.duration, 5000);
    assert_eq!(wrapper.references[0].span_id, root.span_id);
    assert!(document.processes[&wrapper.process_id]
        .service_name
        .starts_with("Proton:"));

    // plan has no events: bounded by the next sibling's first nested event
    let plan = find_span(&document, "query_execution_plan");
    assert_eq!(plan.start_time, dispatch_start + 1000);
    assert_eq!(plan.duration, 1000);
    assert_eq!(plan.references[0].span_id, wrapper.span_id);

    // execution is logged at the end of its window: backward duration
    let execution = find_span(&document, "query_execution");
    assert_eq!(execution.start_time, dispatch_start + 2000);
    assert_eq!(execution.duration, 2000);

    // dispatch processes are minted per occurrence, never shared
    assert_ne!(plan.process_id, execution.process_id);
    assert_eq!(
        document.processes[&plan.process_id].service_name,
        "query_execution_plan"
    );

    // forward event, then a terminal label measured back to the sub-trace
    let setup_start = find_span(&document, "Start query setup");
    assert_eq!(setup_start.duration, 1000);
    assert_eq!(setup_start.references[0].span_id, execution.span_id);
    let setup_done = find_span(&document, "Complete query setup");
    assert_eq!(setup_done.duration, 1000);
    assert_eq!(setup_done.process_id, execution.process_id);

    // generic tag: backward sub-trace duration, tag-named event
    let custom = find_span(&document, "custom_phase");
    assert_eq!(custom.duration, 1000);
    let init = find_span(&document, "init");
    assert_eq!(init.duration, 1);
    assert_eq!(init.references[0].span_id, custom.span_id);
}

#[test]
fn test_all_durations_are_positive() {
    // decreasing and duplicate timestamps force non-positive raw gaps
    let raw = raw_trace(json!([
        preamble(),
        {"children": [
            {"message": "a", "timestamp": 0.5},
            {"message": "b", "timestamp": 0.5},
            {"message": "c", "timestamp": 0.2}
        ]}
    ]));

    let document = convert_trace(&raw).unwrap();
    for span in &document.spans {
        assert!(span.duration >= 1, "span {} duration 0", span.operation_name);
    }
}

#[test]
fn test_unrecognized_leaves_are_skipped() {
    let raw = raw_trace(json!([
        preamble(),
        {"children": [
            {"message": "kept", "timestamp": 0.1},
            {"message": 42},
            {"timestamp": 0.3}
        ]}
    ]));

    let document = convert_trace(&raw).unwrap();
    // root + the one recognizable leaf
    assert_eq!(document.spans.len(), 2);
}

#[test]
fn test_no_timed_children_is_an_error() {
    let raw = raw_trace(json!([preamble()]));
    assert!(matches!(
        convert_trace(&raw),
        Err(ConvertError::NoTimedWork)
    ));
}

#[test]
fn test_missing_preamble_is_an_error() {
    let raw = raw_trace(json!([
        {"children": [{"message": "work", "timestamp": 0.1}]}
    ]));
    assert!(matches!(
        convert_trace(&raw),
        Err(ConvertError::MissingPreamble)
    ));
}

/// Structural fingerprint of a document, independent of generated IDs
fn structure(document: &TraceDocument) -> Vec<(String, i64, u64, Option<usize>, String)> {
    document
        .spans
        .iter()
        .map(|span| {
            let parent = span.references.first().map(|r| {
                document
                    .spans
                    .iter()
                    .position(|s| s.span_id == r.span_id)
                    .expect("dangling reference")
            });
            (
                span.operation_name.clone(),
                span.start_time,
                span.duration,
                parent,
                document.processes[&span.process_id].service_name.clone(),
            )
        })
        .collect()
}

#[test]
fn test_repeated_conversions_are_structurally_identical() {
    let raw = raw_trace(json!([
        preamble(),
        {"children": [
            {"message": "Invoke my.pkg.First", "timestamp": 0.1},
            {"timestamp": 0.2, "children": [
                {"message": "inner", "timestamp": 0.25}
            ]},
            {"message": "Invoke my.pkg.First again", "timestamp": 0.4}
        ]}
    ]));

    let first = convert_trace(&raw).unwrap();
    let second = convert_trace(&raw).unwrap();

    assert_ne!(first.trace_id, second.trace_id);
    assert_eq!(structure(&first), structure(&second));
}
