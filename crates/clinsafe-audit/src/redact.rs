// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Redaction: irreversible scrubbing of identifiers and free-form detail
// maps before anything reaches the ledger. Redaction is idempotent: running
// it over already-redacted output changes nothing.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

/// Marker written in place of a sensitive value.
pub const REDACTED: &str = "[REDACTED]";

/// Strings longer than this are replaced with a length-only placeholder;
/// free text of that size is assumed to contain PHI.
const MAX_STRING_LEN: usize = 100;

/// Detail-map keys whose values are dropped wholesale (case-insensitive
/// substring match).
const SENSITIVE_KEYS: &[&str] = &[
    "phone",
    "email",
    "ssn",
    "dob",
    "address",
    "signature",
    "password",
    "token",
    "key",
    "secret",
    "credential",
    "firstname",
    "lastname",
    "name",
];

static SSN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("ssn pattern"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("email pattern")
});
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\+?\d{1,2}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b")
        .expect("phone pattern")
});
// Bare digit runs of SSN length or longer (account numbers, MRNs, raw
// phone strings with country codes).
static DIGIT_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{9,}\b").expect("digit-run pattern"));

/// Reduce an identifier to a last-6-characters token.
///
/// Full user and resource ids must never reach the ledger; the suffix is
/// enough to correlate entries during an investigation.
pub fn redact_identifier(id: &str) -> String {
    // Counted in chars, not bytes; identifiers are caller-supplied and may
    // contain multi-byte characters.
    let total = id.chars().count();
    if total <= 6 {
        return "***".to_owned();
    }
    let tail: String = id.chars().skip(total - 6).collect();
    format!("***{tail}")
}

/// True when a detail-map key names a sensitive field.
fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_KEYS.iter().any(|s| lower.contains(s))
}

/// Scrub PII patterns out of a surviving string value.
fn scrub_string(text: &str) -> String {
    let pass = SSN_RE.replace_all(text, "[SSN REDACTED]");
    let pass = EMAIL_RE.replace_all(&pass, "[EMAIL REDACTED]");
    let pass = PHONE_RE.replace_all(&pass, "[PHONE REDACTED]");
    DIGIT_RUN_RE.replace_all(&pass, "[NUMBER REDACTED]").into_owned()
}

fn redact_value(value: &Value) -> Value {
    match value {
        Value::String(s) => {
            if s.len() > MAX_STRING_LEN {
                Value::String(format!("[REDACTED - {} chars]", s.len()))
            } else {
                Value::String(scrub_string(s))
            }
        }
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, inner) in map {
                if is_sensitive_key(key) {
                    out.insert(key.clone(), Value::String(REDACTED.to_owned()));
                } else {
                    out.insert(key.clone(), redact_value(inner));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_value).collect()),
        other => other.clone(),
    }
}

/// Deep-redact a detail map before it is attached to an audit entry.
pub fn redact_details(details: &Map<String, Value>) -> Map<String, Value> {
    match redact_value(&Value::Object(details.clone())) {
        Value::Object(map) => map,
        _ => unreachable!("object in, object out"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn identifier_keeps_last_six_only() {
        assert_eq!(redact_identifier("patient-8842913650"), "***913650");
        assert_eq!(redact_identifier("short"), "***");
        assert_eq!(redact_identifier(""), "***");
    }

    #[test]
    fn identifier_with_multibyte_chars_keeps_last_six() {
        assert_eq!(redact_identifier("abcdefü12345"), "***ü12345");
        assert_eq!(redact_identifier("患者-山田太郎8842"), "***太郎8842");
        assert_eq!(redact_identifier("üüü"), "***");
    }

    #[test]
    fn sensitive_keys_dropped_wholesale() {
        let details = as_map(json!({
            "patientName": "Ada Lovelace",
            "firstName": "Ada",
            "consent_signature": "data:image/png;base64,AAAA",
            "treatment": "Morpheus8",
        }));
        let redacted = redact_details(&details);

        assert_eq!(redacted["patientName"], REDACTED);
        assert_eq!(redacted["firstName"], REDACTED);
        assert_eq!(redacted["consent_signature"], REDACTED);
        assert_eq!(redacted["treatment"], "Morpheus8");
    }

    #[test]
    fn patterns_scrubbed_from_surviving_strings() {
        let details = as_map(json!({
            "note": "call 555-867-5309, ssn 123-45-6789, mail a@b.com, mrn 123456789",
        }));
        let redacted = redact_details(&details);
        let note = redacted["note"].as_str().unwrap();

        assert!(!note.contains("867-5309"));
        assert!(!note.contains("123-45-6789"));
        assert!(!note.contains("a@b.com"));
        assert!(!note.contains("123456789"));
    }

    #[test]
    fn long_strings_become_length_placeholders() {
        let long = "x".repeat(180);
        let details = as_map(json!({ "payload": long }));
        let redacted = redact_details(&details);
        assert_eq!(redacted["payload"], "[REDACTED - 180 chars]");
    }

    #[test]
    fn nested_maps_and_arrays_are_walked() {
        let details = as_map(json!({
            "sync": {
                "phone": "555-867-5309",
                "items": [{ "email": "a@b.com" }, { "note": "dial 555.867.5309" }],
            },
        }));
        let redacted = redact_details(&details);
        let serialized = serde_json::to_string(&redacted).unwrap();

        assert!(!serialized.contains("867"));
        assert!(!serialized.contains("a@b.com"));
    }

    #[test]
    fn twelve_digit_run_is_caught() {
        let details = as_map(json!({ "note": "reached at 918005551234 today" }));
        let redacted = redact_details(&details);
        assert!(!redacted["note"].as_str().unwrap().contains("5551234"));
    }

    #[test]
    fn redaction_is_idempotent() {
        let details = as_map(json!({
            "patientName": "Ada Lovelace",
            "note": "call 555-867-5309",
            "payload": "y".repeat(150),
        }));
        let once = redact_details(&details);
        let twice = redact_details(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn non_string_scalars_pass_through() {
        let details = as_map(json!({ "count": 7, "flag": true, "nothing": null }));
        let redacted = redact_details(&details);
        assert_eq!(redacted["count"], 7);
        assert_eq!(redacted["flag"], true);
        assert_eq!(redacted["nothing"], Value::Null);
    }
}
