//! Audit log helpers
//!
//! Request parameters are logged with anything credential-like masked, since tool
//! arguments are caller-controlled and routinely carry secrets. Long string values
//! are shortened so a single tool payload cannot flood the audit line.

use serde_json::{Map, Value};

pub const REDACTED: &str = "[REDACTED]";

/// Strings longer than this many characters are cut in audit output.
pub const MAX_AUDIT_STRING_CHARS: usize = 256;

pub fn redact_audit_params(params: &Map<String, Value>) -> Value {
    let mut audited = Value::Object(params.clone());
    redact_in_place(&mut audited);
    audited
}

fn redact_in_place(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, item) in map.iter_mut() {
                if is_sensitive_key(key) {
                    *item = Value::String(REDACTED.to_string());
                } else {
                    redact_in_place(item);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_in_place),
        Value::String(text) => {
            let total = text.chars().count();
            if total > MAX_AUDIT_STRING_CHARS {
                let kept: String = text.chars().take(MAX_AUDIT_STRING_CHARS).collect();
                *text = format!("{kept}... ({total} chars)");
            }
        }
        _ => {}
    }
}

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_ascii_lowercase().replace('-', "_");
    matches!(
        normalized.as_str(),
        "authorization" | "bearer" | "api_key" | "apikey" | "private_key" | "cookie"
    ) || ["token", "secret", "password", "credential", "passphrase"]
        .iter()
        .any(|fragment| normalized.contains(fragment))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn redacts_sensitive_fields_in_tool_arguments() {
        let params = json!({
            "name": "fetch_document",
            "arguments": {
                "doctype": "Invoice",
                "access_token": "should-not-appear",
                "Api-Key": "should-not-appear",
                "nested": [{"db_password": "should-not-appear", "page": 2}]
            }
        });

        let redacted = redact_audit_params(params.as_object().expect("object"));

        assert_eq!(redacted["name"], json!("fetch_document"));
        assert_eq!(redacted["arguments"]["doctype"], json!("Invoice"));
        assert_eq!(redacted["arguments"]["access_token"], json!(REDACTED));
        assert_eq!(redacted["arguments"]["Api-Key"], json!(REDACTED));
        assert_eq!(redacted["arguments"]["nested"][0]["db_password"], json!(REDACTED));
        assert_eq!(redacted["arguments"]["nested"][0]["page"], json!(2));
    }

    #[test]
    fn long_strings_are_shortened() {
        let params = json!({"arguments": {"body": "é".repeat(300), "short": "ok"}});

        let redacted = redact_audit_params(params.as_object().expect("object"));

        let body = redacted["arguments"]["body"].as_str().expect("string");
        assert!(body.starts_with(&"é".repeat(MAX_AUDIT_STRING_CHARS)));
        assert!(body.ends_with("... (300 chars)"));
        assert_eq!(redacted["arguments"]["short"], json!("ok"));
    }

    #[test]
    fn ordinary_keys_are_kept() {
        assert!(!is_sensitive_key("name"));
        assert!(!is_sensitive_key("cursor"));
        assert!(is_sensitive_key(" Authorization "));
    }
}
