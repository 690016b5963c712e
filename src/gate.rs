// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! The submission gate: an ordered chain of checks between a raw
//! contact form submission and the outbound email dispatch.
//!
//! Check order: method, provider configuration, origin, body parse,
//! honeypot, fill timing, captcha token, required fields, email shape,
//! rate limit, scrub, dispatch. The first failure short-circuits the
//! chain, so later steps can assume what earlier ones established;
//! in particular the rate limiter only ever counts submissions that
//! are otherwise deliverable.
//!
//! Two deliberate asymmetries:
//! - A tripped honeypot reports success without dispatching, to keep
//!   the bot convinced.
//! - An unreachable captcha verifier is skipped rather than fatal, so
//!   a Google outage cannot take the contact form down.

use crate::config::Config;
use crate::error::RelayError;
use crate::mailer::{ResendMailer, SenderMeta};
use crate::ratelimit::{EmailRateLimiter, RateDecision};
use crate::sanitize;
use crate::verify::RecaptchaVerifier;
use axum::http::{Method, StatusCode};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Client-facing message for a delivered submission.
const DELIVERED_MESSAGE: &str = "Message sent successfully! I'll get back to you soon.";

/// Client-facing message for a honeypot catch. Shorter than the real
/// success on purpose; a human never sees it.
const CAMOUFLAGE_MESSAGE: &str = "Message sent successfully!";

/// A contact form submission as posted by the client.
///
/// Every field is optional at the wire level; presence is enforced by
/// the gate, not the parser, so a missing field yields the fixed
/// "all fields required" message instead of a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Honeypot field; humans leave it empty because it is hidden
    #[serde(rename = "_gotcha", default, skip_serializing_if = "Option::is_none")]
    pub gotcha: Option<String>,

    /// Epoch milliseconds at which the form was loaded
    #[serde(rename = "_timestamp", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// reCAPTCHA v3 token, when the client has one
    #[serde(rename = "recaptchaToken", default, skip_serializing_if = "Option::is_none")]
    pub recaptcha_token: Option<String>,
}

impl Submission {
    fn honeypot_tripped(&self) -> bool {
        matches!(self.gotcha.as_deref(), Some(g) if !g.trim().is_empty())
    }

    /// Form load time, falling back to `fallback_ms` when the stamp is
    /// absent or unparseable. The fallback makes the elapsed time zero,
    /// which the timing check rejects.
    fn loaded_at_ms(&self, fallback_ms: i64) -> i64 {
        self.timestamp
            .as_deref()
            .and_then(|t| t.trim().parse().ok())
            .unwrap_or(fallback_ms)
    }

    fn required_fields(&self) -> Result<FieldSet<'_>, RelayError> {
        fn present(field: &Option<String>) -> Option<&str> {
            field.as_deref().filter(|v| !v.is_empty())
        }

        match (
            present(&self.name),
            present(&self.email),
            present(&self.subject),
            present(&self.message),
        ) {
            (Some(name), Some(email), Some(subject), Some(message)) => Ok(FieldSet {
                name,
                email,
                subject,
                message,
            }),
            _ => Err(RelayError::MissingFields),
        }
    }
}

/// Borrowed view of a submission whose required fields are all present.
struct FieldSet<'a> {
    name: &'a str,
    email: &'a str,
    subject: &'a str,
    message: &'a str,
}

/// A scrubbed submission, safe to embed in an outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanSubmission {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Transport-level view of an incoming request.
#[derive(Debug, Clone)]
pub struct RelayRequest {
    pub method: Method,
    pub origin: Option<String>,
    pub referer: Option<String>,
    pub client_ip: Option<String>,
    pub body: String,
}

/// Whether the submission was actually dispatched or only appeared to be.
enum Delivery {
    Sent,
    Camouflaged,
}

/// Terminal result of a gate run.
///
/// Serializes to the `{status, message}` body clients consume; the
/// HTTP status, retry hint, and metrics label ride along unserialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub status: OutcomeStatus,
    pub message: String,
    #[serde(skip)]
    pub http_status: StatusCode,
    #[serde(skip)]
    pub retry_after: Option<Duration>,
    #[serde(skip)]
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Error,
}

impl Outcome {
    fn delivered() -> Self {
        Self {
            status: OutcomeStatus::Success,
            message: DELIVERED_MESSAGE.to_string(),
            http_status: StatusCode::OK,
            retry_after: None,
            label: "delivered",
        }
    }

    fn camouflaged() -> Self {
        Self {
            status: OutcomeStatus::Success,
            message: CAMOUFLAGE_MESSAGE.to_string(),
            http_status: StatusCode::OK,
            retry_after: None,
            label: "honeypot",
        }
    }

    fn rejected(err: &RelayError) -> Self {
        Self {
            status: OutcomeStatus::Error,
            message: err.public_message().to_string(),
            http_status: err.status(),
            retry_after: err.retry_after(),
            label: err.label(),
        }
    }

    /// Build a client-side failure that never reached the relay.
    pub fn local_failure(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Error,
            message: message.into(),
            http_status: StatusCode::BAD_REQUEST,
            retry_after: None,
            label: "client",
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// The submission gate itself. One instance per process; the rate
/// limiter inside it is the only mutable state.
pub struct Gate {
    config: Config,
    limiter: EmailRateLimiter,
    verifier: Option<RecaptchaVerifier>,
    mailer: Option<ResendMailer>,
}

impl Gate {
    /// Assemble a gate from configuration. Verifier and mailer are
    /// present only when their credentials are.
    pub fn new(config: Config) -> Self {
        let limiter = EmailRateLimiter::new(config.rate_limit.clone());
        let verifier = RecaptchaVerifier::from_config(&config.recaptcha);
        let mailer = ResendMailer::from_config(&config.provider);
        Self {
            config,
            limiter,
            verifier,
            mailer,
        }
    }

    /// The rate limiter, for inspection.
    pub fn limiter(&self) -> &EmailRateLimiter {
        &self.limiter
    }

    /// Run a request through the full check chain.
    pub async fn handle(&self, request: RelayRequest) -> Outcome {
        match self.process(&request).await {
            Ok(Delivery::Sent) => Outcome::delivered(),
            Ok(Delivery::Camouflaged) => Outcome::camouflaged(),
            Err(err) => {
                info!(reason = %err, label = err.label(), "submission rejected");
                Outcome::rejected(&err)
            }
        }
    }

    async fn process(&self, request: &RelayRequest) -> Result<Delivery, RelayError> {
        if request.method != Method::POST {
            return Err(RelayError::MethodNotAllowed);
        }

        let mailer = self.mailer.as_ref().ok_or(RelayError::Configuration)?;

        self.check_origin(request)?;

        let submission: Submission = serde_json::from_str(&request.body).map_err(|err| {
            debug!(error = %err, "rejecting unparseable body");
            RelayError::InvalidBody
        })?;

        if submission.honeypot_tripped() {
            warn!(client_ip = ?request.client_ip, "honeypot filled, likely bot submission");
            return Ok(Delivery::Camouflaged);
        }

        self.check_timing(&submission)?;
        self.verify_token(&submission).await?;

        let fields = submission.required_fields()?;

        if !sanitize::is_valid_email(fields.email) {
            debug!("rejecting malformed sender address");
            return Err(RelayError::InvalidEmail);
        }

        if let RateDecision::Limited { retry_after } = self.limiter.check(fields.email) {
            return Err(RelayError::RateLimited { retry_after });
        }

        let clean = self.scrub(&fields);
        let meta = SenderMeta {
            submitted_at: Utc::now(),
            client_ip: request
                .client_ip
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            site_host: self.config.site.site_host(),
        };

        let message = mailer.compose(&clean, &meta);
        mailer.send(&message).await?;

        Ok(Delivery::Sent)
    }

    /// Origin allow-list check. Applies only in production and only
    /// when a site URL is configured; either header matching any
    /// allowed origin prefix is enough.
    fn check_origin(&self, request: &RelayRequest) -> Result<(), RelayError> {
        let site = &self.config.site;
        if !site.production || site.site_url.is_empty() {
            return Ok(());
        }

        let origin = request.origin.as_deref().unwrap_or("");
        let referer = request.referer.as_deref().unwrap_or("");
        let allowed = site.allowed_origins();

        if allowed
            .iter()
            .any(|a| origin.starts_with(a.as_str()) || referer.starts_with(a.as_str()))
        {
            Ok(())
        } else {
            warn!(%origin, %referer, "blocked submission from unauthorized origin");
            Err(RelayError::ForbiddenOrigin)
        }
    }

    /// Reject submissions filled faster than a human plausibly could.
    /// A missing or garbled timestamp counts as instant, which rejects.
    fn check_timing(&self, submission: &Submission) -> Result<(), RelayError> {
        let now_ms = Utc::now().timestamp_millis();
        let elapsed_ms = now_ms.saturating_sub(submission.loaded_at_ms(now_ms));
        let min_fill_ms = self.config.antispam.min_fill_duration().as_millis() as i64;

        if elapsed_ms < min_fill_ms {
            warn!(
                elapsed_ms,
                min_fill_ms, "form submitted faster than the minimum fill time"
            );
            return Err(RelayError::TooFast);
        }
        Ok(())
    }

    /// Captcha verification, fail-open: runs only when both a verifier
    /// and a token exist, and an unreachable or garbled endpoint is
    /// logged and skipped rather than treated as a rejection.
    async fn verify_token(&self, submission: &Submission) -> Result<(), RelayError> {
        let (Some(verifier), Some(token)) =
            (self.verifier.as_ref(), submission.recaptcha_token.as_deref())
        else {
            return Ok(());
        };

        match verifier.verify(token).await {
            Ok(verdict) if verdict.passes(verifier.min_score()) => {
                debug!(score = ?verdict.score, "captcha verification passed");
                Ok(())
            }
            Ok(verdict) => {
                warn!(
                    success = verdict.success,
                    score = ?verdict.score,
                    "captcha verification failed"
                );
                Err(RelayError::VerificationFailed)
            }
            Err(err) => {
                warn!(error = %err, "captcha verification unavailable, skipping");
                Ok(())
            }
        }
    }

    fn scrub(&self, fields: &FieldSet<'_>) -> CleanSubmission {
        let antispam = &self.config.antispam;
        CleanSubmission {
            name: sanitize::scrub(fields.name, antispam.max_field_chars),
            email: fields.email.to_string(),
            subject: sanitize::scrub(fields.subject, antispam.max_field_chars),
            message: sanitize::scrub(fields.message, antispam.max_message_chars),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_honeypot_detection() {
        let tripped = Submission {
            gotcha: Some("http://spam.example".to_string()),
            ..Default::default()
        };
        assert!(tripped.honeypot_tripped());

        let empty = Submission {
            gotcha: Some(String::new()),
            ..Default::default()
        };
        assert!(!empty.honeypot_tripped());

        assert!(!Submission::default().honeypot_tripped());
    }

    #[test]
    fn test_loaded_at_falls_back_to_now() {
        let submission = Submission::default();
        assert_eq!(submission.loaded_at_ms(42), 42);

        let garbled = Submission {
            timestamp: Some("not-a-number".to_string()),
            ..Default::default()
        };
        assert_eq!(garbled.loaded_at_ms(42), 42);

        let stamped = Submission {
            timestamp: Some(" 1700000000000 ".to_string()),
            ..Default::default()
        };
        assert_eq!(stamped.loaded_at_ms(42), 1_700_000_000_000);
    }

    #[test]
    fn test_required_fields_reject_missing_or_empty() {
        let complete = Submission {
            name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
            subject: Some("Hi".to_string()),
            message: Some("Hello there".to_string()),
            ..Default::default()
        };
        assert!(complete.required_fields().is_ok());

        let empty_subject = Submission {
            subject: Some(String::new()),
            ..complete.clone()
        };
        assert!(matches!(
            empty_subject.required_fields(),
            Err(RelayError::MissingFields)
        ));

        let missing_message = Submission {
            message: None,
            ..complete
        };
        assert!(matches!(
            missing_message.required_fields(),
            Err(RelayError::MissingFields)
        ));
    }

    #[test]
    fn test_submission_parses_wire_names() {
        let submission: Submission = serde_json::from_str(
            r#"{
                "name": "Ada",
                "email": "ada@example.com",
                "subject": "Hi",
                "message": "Hello",
                "_gotcha": "",
                "_timestamp": "1700000000000",
                "recaptchaToken": "tok"
            }"#,
        )
        .expect("parse");

        assert_eq!(submission.name.as_deref(), Some("Ada"));
        assert_eq!(submission.gotcha.as_deref(), Some(""));
        assert_eq!(submission.timestamp.as_deref(), Some("1700000000000"));
        assert_eq!(submission.recaptcha_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_outcome_serializes_status_and_message_only() {
        let outcome = Outcome::delivered();
        let wire = serde_json::to_value(&outcome).expect("serialize");

        assert_eq!(wire["status"], "success");
        assert_eq!(wire["message"], DELIVERED_MESSAGE);
        assert!(wire.get("http_status").is_none());
        assert!(wire.get("label").is_none());
    }

    #[test]
    fn test_success_messages_differ_between_real_and_camouflage() {
        assert_ne!(Outcome::delivered().message, Outcome::camouflaged().message);
        assert!(Outcome::camouflaged().is_success());
        assert_eq!(Outcome::camouflaged().label, "honeypot");
    }

    #[test]
    fn test_rejected_outcome_carries_error_mapping() {
        let err = RelayError::RateLimited {
            retry_after: Duration::from_secs(90),
        };
        let outcome = Outcome::rejected(&err);

        assert!(!outcome.is_success());
        assert_eq!(outcome.http_status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(outcome.message, "Too many messages. Please try again later.");
        assert_eq!(outcome.retry_after, Some(Duration::from_secs(90)));
        assert_eq!(outcome.label, "rate_limited");
    }
}
