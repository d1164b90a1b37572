//! Credential redaction for log records.
//!
//! Two independent passes over a deep copy of the record:
//! 1. key-based — any field whose key matches a sensitive pattern has its
//!    value replaced with the marker, at any depth;
//! 2. content-based — designated free-text fields may embed credentials
//!    inline (e.g. a rendered `liquibase` command line); an ordered
//!    substitution list rewrites them in place.
//!
//! The input record is never mutated, and redaction is idempotent:
//! `redact(redact(x)) == redact(x)`.

use crate::logging::LogRecord;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

pub const REDACTION_MARKER: &str = "[REDACTED]";

static SENSITIVE_KEYS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)cookie",
        r"(?i)passw(or)?d",
        r"^pw$",
        r"(?i)^pass$",
        r"(?i)secret",
        r"(?i)token",
        r"(?i)api[-._]?key",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("sensitive-key pattern"))
    .collect()
});

/// Fields whose string values may embed credentials even though the key
/// itself is not sensitive.
const FREE_TEXT_FIELDS: &[&str] = &["command", "message", "stack_trace"];

/// Ordered substitutions for credential flags inside command strings.
/// Escaped-quote forms come first so the plain-quote patterns never
/// half-match an escaped variant. The value match runs to the last quote
/// in the token, so a password that itself embeds a quote cannot leak a
/// tail past the closing delimiter.
static CONTENT_PATTERNS: LazyLock<Vec<(Regex, String)>> = LazyLock::new(|| {
    ["--password", "--reference-password"]
        .iter()
        .flat_map(|flag| {
            let replacement = format!("{flag}={REDACTION_MARKER}");
            let escaped = Regex::new(&format!(r#"{flag}=\\"\S*\\""#))
                .expect("escaped-quote content pattern");
            let quoted =
                Regex::new(&format!(r#"{flag}="\S*""#)).expect("quoted content pattern");
            [(escaped, replacement.clone()), (quoted, replacement)]
        })
        .collect()
});

/// Return a redacted deep copy of `record`.
pub fn redact(record: &LogRecord) -> LogRecord {
    let mut copy = record.clone();

    for (key, value) in copy.fields.iter_mut() {
        if is_sensitive_key(key) {
            *value = Value::String(REDACTION_MARKER.to_string());
            continue;
        }
        redact_keys(value);
        if FREE_TEXT_FIELDS.contains(&key.as_str()) {
            if let Value::String(text) = value {
                *text = redact_content(text);
            }
        }
    }

    copy.message = redact_content(&copy.message);

    // The splat payload is carried outside the fields tree and must be
    // located and redacted separately.
    if let Some(splat) = copy.splat.as_mut() {
        redact_keys(splat);
        redact_content_strings(splat);
    }

    copy
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|re| re.is_match(key))
}

/// Key pass: recursive visitor over the closed node set (object, array,
/// scalar). Scalars have no keys and are left alone.
fn redact_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if is_sensitive_key(key) {
                    *child = Value::String(REDACTION_MARKER.to_string());
                } else {
                    redact_keys(child);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                redact_keys(item);
            }
        }
        _ => {}
    }
}

fn redact_content(text: &str) -> String {
    let mut out = text.to_string();
    for (pattern, replacement) in CONTENT_PATTERNS.iter() {
        out = pattern.replace_all(&out, replacement.as_str()).into_owned();
    }
    out
}

/// Content pass applied to every string scalar in a tree. Used for the
/// splat payload, whose strings are interpolation arguments that may carry
/// command text.
fn redact_content_strings(value: &mut Value) {
    match value {
        Value::String(text) => *text = redact_content(text),
        Value::Object(map) => {
            for child in map.values_mut() {
                redact_content_strings(child);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                redact_content_strings(item);
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
