// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Rejection reasons for the submission gate.
//!
//! Each variant maps to exactly one HTTP status and one fixed
//! client-facing message. The `Display` text is the internal
//! description for logs; `public_message` is what callers see, and it
//! deliberately stays vague about which defense fired.

use axum::http::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Reason a submission was rejected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RelayError {
    #[error("request method is not POST")]
    MethodNotAllowed,

    #[error("email provider credentials are not configured")]
    Configuration,

    #[error("request origin is not on the allow list")]
    ForbiddenOrigin,

    #[error("request body is not valid JSON")]
    InvalidBody,

    #[error("form was submitted before the minimum fill time")]
    TooFast,

    #[error("captcha verification rejected the token")]
    VerificationFailed,

    #[error("one or more required fields are missing")]
    MissingFields,

    #[error("sender email address is malformed")]
    InvalidEmail,

    #[error("sender exceeded the per-address rate limit")]
    RateLimited { retry_after: Duration },

    #[error("email provider rejected the dispatch")]
    Upstream,
}

impl RelayError {
    /// HTTP status for this rejection.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ForbiddenOrigin => StatusCode::FORBIDDEN,
            Self::InvalidBody
            | Self::TooFast
            | Self::VerificationFailed
            | Self::MissingFields
            | Self::InvalidEmail => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Fixed client-facing message for this rejection.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "Method not allowed",
            Self::Configuration => "Server configuration error",
            Self::ForbiddenOrigin => "Forbidden",
            Self::InvalidBody => "Invalid request body",
            Self::TooFast => "Please take your time filling out the form.",
            Self::VerificationFailed => "Security verification failed. Please try again.",
            Self::MissingFields => "All fields are required.",
            Self::InvalidEmail => "Invalid email address.",
            Self::RateLimited { .. } => "Too many messages. Please try again later.",
            Self::Upstream => "Failed to send message. Please try again later.",
        }
    }

    /// Stable identifier for metrics labels and test assertions.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "method_not_allowed",
            Self::Configuration => "configuration",
            Self::ForbiddenOrigin => "forbidden_origin",
            Self::InvalidBody => "invalid_body",
            Self::TooFast => "too_fast",
            Self::VerificationFailed => "verification_failed",
            Self::MissingFields => "missing_fields",
            Self::InvalidEmail => "invalid_email",
            Self::RateLimited { .. } => "rate_limited",
            Self::Upstream => "upstream",
        }
    }

    /// How long the client should wait before retrying, when bounded.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
