use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

const DEFAULT_REDACTION: &str = "[REDACTED]";
const INLINE_REDACTION: &str = "***REDACTED***";

static SENSITIVE_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "access_token",
        "appsecret_proof",
        "api_key",
        "token",
        "secret",
        "client_secret",
        "authorization",
    ]
    .into_iter()
    .collect()
});

static INLINE_REDACTION_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            // Meta user/system/page access tokens.
            Regex::new(r"\bEAA[A-Za-z0-9]{20,}\b").expect("inline redaction regex"),
            "EAA***REDACTED***",
        ),
        (
            Regex::new(r"\bAIza[0-9A-Za-z_-]{20,}\b").expect("inline redaction regex"),
            "AIza***REDACTED***",
        ),
        (
            Regex::new(r"\b(Bearer)\s+([A-Za-z0-9._~-]{10,})\b").expect("inline redaction regex"),
            "$1 ***REDACTED***",
        ),
        (
            Regex::new(r"([?&](?:access_token|key|appsecret_proof)=)[^&\s]+")
                .expect("inline redaction regex"),
            "$1***REDACTED***",
        ),
    ]
});

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = normalize_key(key);
    if normalized.is_empty() {
        return false;
    }
    if SENSITIVE_KEYS.contains(normalized.as_str()) {
        return true;
    }
    normalized.contains("secret") || normalized.ends_with("_token")
}

/// Cuts to at most `max_bytes`, backing off to a char boundary, and marks
/// the cut with `...`.
fn truncate_string(value: &str, max_bytes: usize) -> String {
    if max_bytes == usize::MAX || value.len() <= max_bytes {
        return value.to_string();
    }
    if max_bytes == 0 {
        return String::new();
    }
    let mut end = max_bytes;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &value[..end])
}

fn redact_inline_secrets(value: &str, extra: Option<&[String]>) -> String {
    let mut out = value.to_string();
    for (re, replacement) in INLINE_REDACTION_PATTERNS.iter() {
        if re.is_match(&out) {
            out = re.replace_all(&out, *replacement).to_string();
        }
    }
    if let Some(values) = extra {
        for raw in values {
            let needle = raw.trim();
            if needle.len() < 6 {
                continue;
            }
            out = out.replace(needle, INLINE_REDACTION);
        }
    }
    out
}

/// Masks credentials embedded in free text and truncates to `max_string` bytes.
/// `extra_secrets` are literal values (the configured tokens) masked verbatim.
pub fn redact_text(value: &str, max_string: usize, extra_secrets: Option<&[String]>) -> String {
    let redacted = redact_inline_secrets(value, extra_secrets);
    truncate_string(&redacted, max_string)
}

pub fn redact_object(value: &Value, max_string: usize, extra_secrets: Option<&[String]>) -> Value {
    match value {
        Value::Null => Value::Null,
        // Inline image payloads are returned whole.
        Value::String(text) if text.starts_with("data:") => value.clone(),
        Value::String(text) => Value::String(redact_text(text, max_string, extra_secrets)),
        Value::Bool(_) | Value::Number(_) => value.clone(),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| redact_object(item, max_string, extra_secrets))
                .collect(),
        ),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, entry) in map.iter() {
                if is_sensitive_key(key) {
                    out.insert(key.clone(), Value::String(DEFAULT_REDACTION.to_string()));
                    continue;
                }
                out.insert(key.clone(), redact_object(entry, max_string, extra_secrets));
            }
            Value::Object(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_object_keeps_data_urls_whole() {
        let data_url = format!("data:image/png;base64,{}", "EAAB".repeat(40));
        let value = serde_json::json!({"url": data_url.clone()});
        let out = redact_object(&value, 16, None);
        assert_eq!(out["url"], serde_json::json!(data_url));
    }

    #[test]
    fn redact_text_masks_query_tokens() {
        let url = "https://graph.facebook.com/v21.0/me?fields=id&access_token=abc123def";
        let out = redact_text(url, usize::MAX, None);
        assert!(!out.contains("abc123def"));
        assert!(out.contains("access_token=***REDACTED***"));
        assert!(out.contains("fields=id"));
    }

    #[test]
    fn redact_text_masks_meta_tokens_inline() {
        let out = redact_text(
            "token EAABwzLixnjYBAKZCZA1234567890abcdef leaked",
            usize::MAX,
            None,
        );
        assert!(out.contains("EAA***REDACTED***"));
        assert!(out.ends_with("leaked"));
    }

    #[test]
    fn redact_text_masks_extra_secrets() {
        let secrets = vec!["super-secret-value".to_string()];
        let out = redact_text("x super-secret-value y", usize::MAX, Some(&secrets));
        assert_eq!(out, "x ***REDACTED*** y");
    }

    #[test]
    fn redact_object_masks_sensitive_keys_only() {
        let input = serde_json::json!({"access_token": "abc", "name": "Spring sale"});
        let out = redact_object(&input, usize::MAX, None);
        assert_eq!(out["access_token"], Value::String("[REDACTED]".to_string()));
        assert_eq!(out["name"], Value::String("Spring sale".to_string()));
    }

    #[test]
    fn redact_text_truncates_long_values() {
        let out = redact_text("abcdefgh", 3, None);
        assert_eq!(out, "abc...");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(redact_text("héllo", 2, None), "h...");
    }
}
