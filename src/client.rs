// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Submission client for the relay endpoint.
//!
//! Mirrors what the site's form script does: validate locally first so
//! obvious mistakes never generate a request, fetch a captcha token
//! when one is obtainable, and post the payload exactly once. Every
//! path ends in an [`Outcome`] whose message is fit to render, so the
//! caller never has to interpret transport errors itself.

use crate::gate::{Outcome, Submission};
use crate::sanitize;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};

/// Unchanged template value meaning no real site key was configured.
pub const PLACEHOLDER_SITE_KEY: &str = "6LcXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXX";

/// Shown for any failure that has no server-supplied message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again later.";

/// Action name bound into requested captcha tokens.
const RECAPTCHA_ACTION: &str = "contact";

/// Produces a captcha token for an action name.
pub type TokenProvider = Box<dyn Fn(&str) -> anyhow::Result<String> + Send + Sync>;

/// Local validation failure; the submission never left the client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Please fill in all fields.")]
    MissingFields,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
}

/// An in-progress contact form, stamped with its load time.
#[derive(Debug, Clone)]
pub struct SubmissionForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    /// Hidden honeypot field; stays empty unless something fills it
    pub honeypot: String,
    loaded_at_ms: i64,
}

impl SubmissionForm {
    /// Start a form, stamping the load time now.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            subject: subject.into(),
            message: message.into(),
            honeypot: String::new(),
            loaded_at_ms: Utc::now().timestamp_millis(),
        }
    }

    /// Restamp the load time, as the site does after a successful send
    /// resets the form for another message.
    pub fn rearm(&mut self) {
        self.loaded_at_ms = Utc::now().timestamp_millis();
    }

    pub fn loaded_at_ms(&self) -> i64 {
        self.loaded_at_ms
    }

    /// Local validation: every field non-empty after trimming, email
    /// shaped like an address.
    pub fn validate(&self) -> Result<(), FormError> {
        let complete = [&self.name, &self.email, &self.subject, &self.message]
            .iter()
            .all(|field| !field.trim().is_empty());
        if !complete {
            return Err(FormError::MissingFields);
        }
        if !sanitize::is_valid_email(self.email.trim()) {
            return Err(FormError::InvalidEmail);
        }
        Ok(())
    }

    /// Wire payload for this form: trimmed fields, the honeypot as-is,
    /// the load stamp, and the token when one was acquired.
    pub fn payload(&self, recaptcha_token: Option<String>) -> Submission {
        Submission {
            name: Some(self.name.trim().to_string()),
            email: Some(self.email.trim().to_string()),
            subject: Some(self.subject.trim().to_string()),
            message: Some(self.message.trim().to_string()),
            gotcha: Some(self.honeypot.clone()),
            timestamp: Some(self.loaded_at_ms.to_string()),
            recaptcha_token,
        }
    }
}

/// HTTP client for the submission endpoint.
pub struct ContactClient {
    endpoint: String,
    site_key: Option<String>,
    token_provider: Option<TokenProvider>,
    http: reqwest::Client,
}

impl ContactClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            site_key: None,
            token_provider: None,
            http: reqwest::Client::new(),
        }
    }

    /// Enable captcha token acquisition for submissions.
    pub fn with_recaptcha(mut self, site_key: impl Into<String>, provider: TokenProvider) -> Self {
        self.site_key = Some(site_key.into());
        self.token_provider = Some(provider);
        self
    }

    /// Submit a form. Exactly one request leaves per call, and only
    /// after local validation passes.
    pub async fn submit(&self, form: &SubmissionForm) -> Outcome {
        if let Err(err) = form.validate() {
            return Outcome::local_failure(err.to_string());
        }

        let payload = form.payload(self.obtain_token());

        let response = match self.http.post(&self.endpoint).json(&payload).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "submission request failed");
                return Outcome::local_failure(GENERIC_FAILURE_MESSAGE);
            }
        };

        let status = response.status();
        match response.json::<Outcome>().await {
            Ok(mut outcome) => {
                outcome.http_status = status;
                outcome
            }
            Err(err) => {
                warn!(error = %err, "unparseable relay response");
                Outcome::local_failure(GENERIC_FAILURE_MESSAGE)
            }
        }
    }

    /// Acquire a captcha token when the deployment has a real site key
    /// and a provider. Acquisition failure is soft: the submission
    /// proceeds without a token and the relay decides what that means.
    fn obtain_token(&self) -> Option<String> {
        let (Some(site_key), Some(provider)) =
            (self.site_key.as_deref(), self.token_provider.as_ref())
        else {
            return None;
        };

        if site_key.is_empty() || site_key == PLACEHOLDER_SITE_KEY {
            debug!("recaptcha site key not configured, skipping token");
            return None;
        }

        match provider(RECAPTCHA_ACTION) {
            Ok(token) => Some(token),
            Err(err) => {
                warn!(error = %err, "token acquisition failed, submitting without one");
                None
            }
        }
    }
}
