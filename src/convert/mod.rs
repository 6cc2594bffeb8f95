//! The conversion core: raw trace tree in, flat Jaeger document out.
//!
//! Composition order is fixed: the Locator finds the timed sub-tree, the
//! time-base resolver anchors relative offsets, the tree walker flattens
//! the tree into spans, and the dispatch expander handles embedded
//! protocol payloads. All per-conversion state lives in [`Converter`].

pub mod context;
pub mod dispatch;
pub mod jaeger;
pub mod names;
pub mod walker;

pub use context::Converter;
pub use jaeger::{JaegerExport, Process, Span, SpanReference, TraceDocument};
pub use names::extract_service_name;

use crate::parser::parse_trace;
use crate::utils::config::MIN_DURATION_US;
use crate::utils::error::ConvertError;

/// Convert one raw trace document into a Jaeger trace document.
///
/// Each call uses a fresh [`Converter`], so repeated or concurrent
/// conversions are fully independent.
///
/// # Errors
/// * `ConvertError::Parse` - the document does not match the raw trace shape
/// * `ConvertError::NoTimedWork` - no top-level node exposes `children`
/// * `ConvertError::MissingPreamble` - the first node has no text message
pub fn convert_trace(raw: &serde_json::Value) -> Result<TraceDocument, ConvertError> {
    let parsed = parse_trace(raw)?;
    let mut converter = Converter::new();
    converter.transform(&parsed)?;
    Ok(converter.into_document())
}

/// Clamp a computed duration to the output floor.
///
/// Non-finite and non-positive values collapse to the floor; everything
/// else rounds to whole microseconds.
pub(crate) fn clamp_duration_us(duration: f64) -> u64 {
    if !duration.is_finite() || duration <= 0.0 {
        MIN_DURATION_US
    } else {
        (duration.round() as u64).max(MIN_DURATION_US)
    }
}

/// Convert an absolute instant in fractional microseconds to the output
/// integer representation. Non-finite values collapse to 0 (unanchored).
pub(crate) fn to_micros(instant: f64) -> i64 {
    if instant.is_finite() {
        instant.round() as i64
    } else {
        0
    }
}
