//! Markup stripping for free text.
//!
//! Not an HTML sanitizer: it removes anything shaped like a tag so query
//! parameters can't carry markup into filter expressions or reflected output.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern compiles"));

/// Strip `<...>` tags and trim surrounding whitespace.
pub fn sanitize(input: &str) -> String {
    TAG_RE.replace_all(input, "").trim().to_string()
}

/// Sanitize string values; everything else passes through unchanged.
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize(&s)),
        other => other,
    }
}

/// Sanitize an optional query parameter, treating an empty result as absent.
pub fn sanitize_param(param: Option<&str>) -> Option<String> {
    param.map(sanitize).filter(|s| !s.is_empty())
}
