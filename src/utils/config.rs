//! Configuration and constants for the converter.

/// Multiplier from source time units (milliseconds) to output time units
/// (microseconds). Applied to every timestamp and duration.
pub const TIME_SCALE: f64 = 1000.0;

/// Floor for every emitted duration. Durations are never zero, negative,
/// or NaN in the output.
pub const MIN_DURATION_US: u64 = 1;

/// Process ID of the root process; spans without a recognizable service
/// name are attributed here.
pub const ROOT_PROCESS_ID: &str = "p0";

/// The only reference type emitted between spans.
pub const REF_CHILD_OF: &str = "CHILD_OF";

/// Operation name of the wrapper span created for each dispatch payload.
pub const DISPATCH_OPERATION_NAME: &str = "Search Dispatch";

/// Service-name prefix for the wrapper span's freshly minted process.
pub const DISPATCH_SERVICE_PREFIX: &str = "Proton:";

// Token positions inside the whitespace-split preamble message.
// The query engine's trace emitter is unversioned; these indices track
// its current message layout.
pub const PREAMBLE_SERVICE_TOKEN: usize = 3;
pub const PREAMBLE_OPERATION_TOKEN: usize = 6;

/// Fallback operation name when the preamble message is too short.
pub const DEFAULT_OPERATION_NAME: &str = "query";

/// Event labels that mark the tail of their sub-trace window. The engine
/// logs completion time, not start time, for these, so their duration is
/// measured backward to the sub-trace's own timestamp.
pub const TERMINAL_EVENT_LABELS: &[&str] = &["Complete query setup", "MatchThread::run Done"];

// Sub-trace tags with special duration rules
pub const TAG_QUERY_EXECUTION: &str = "query_execution";
pub const TAG_QUERY_EXECUTION_PLAN: &str = "query_execution_plan";
