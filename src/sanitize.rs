// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Submission content scrubbing.
//!
//! Implements field-level cleanup for contact form submissions:
//! - Angle bracket removal (defuses raw markup)
//! - Dangerous URI scheme removal (`javascript:`, `data:`)
//! - Inline event handler removal (`onclick=`, `onerror=`, ...)
//! - Whitespace trimming and length capping
//! - HTML entity escaping for email rendering
//! - Email address shape validation

use regex::Regex;
use std::sync::LazyLock;

/// `javascript:` and `data:` URI schemes, any casing.
static URI_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:javascript|data):").expect("invalid scheme pattern"));

/// Inline event handler attributes such as `onclick=` or `onerror=`.
static EVENT_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)on\w+=").expect("invalid handler pattern"));

/// Email address shape: one `@`, non-empty local part, dotted domain,
/// no whitespace anywhere.
static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email pattern"));

/// Scrub a free-text field for inclusion in an outbound email.
///
/// Removes angle brackets, dangerous URI schemes, and inline event
/// handlers, then trims surrounding whitespace and caps the result at
/// `max_chars` characters. Pattern removal repeats until a pass changes
/// nothing, so stripped fragments cannot reassemble into a new match
/// (`javascrionclick=pt:` ends up empty, not `javascript:`).
pub fn scrub(input: &str, max_chars: usize) -> String {
    let mut cleaned: String = input.chars().filter(|c| *c != '<' && *c != '>').collect();

    loop {
        let pass = URI_SCHEME.replace_all(&cleaned, "");
        let pass = EVENT_HANDLER.replace_all(&pass, "").into_owned();
        if pass == cleaned {
            break;
        }
        cleaned = pass;
    }

    cleaned.trim().chars().take(max_chars).collect()
}

/// Escape HTML metacharacters for embedding text in an HTML email body.
///
/// Escapes `&`, `<`, `>`, `"`, and `'`. Works character by character,
/// so already-present entities are double-escaped rather than parsed.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Check whether a string has the shape of an email address.
///
/// This is a deliverability-agnostic shape check, not an RFC 5321
/// validation: local part, `@`, domain containing at least one dot.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}

/// Normalize an email address for use as a rate limit key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
