//! Service-name extraction from operation-name text.
//!
//! Operation names frequently embed a dotted component identifier such as
//! `com.yahoo.prelude.querytransform.PhrasingSearcher`; the final segment
//! is the service the span belongs to. The policy (first dotted match,
//! last segment wins) is isolated here so it can evolve independently of
//! the tree walker.

use once_cell::sync::Lazy;
use regex::Regex;

static DOTTED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[a-z]+\.)+[a-zA-Z]+").expect("dotted-name pattern is valid")
});

/// Extract a service name from free text, if it contains a dotted
/// identifier. `None` attributes the span to the root process.
pub fn extract_service_name(text: &str) -> Option<&str> {
    let matched = DOTTED_NAME.find(text)?.as_str();
    matched.rsplit('.').next()
}
