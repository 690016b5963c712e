// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! reCAPTCHA v3 token verification client.
//!
//! Posts tokens to the siteverify endpoint and interprets the verdict.
//! Whether an unreachable verifier blocks the submission is the gate's
//! call, not this module's; errors are returned as-is.

use crate::config::RecaptchaConfig;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Verdict returned by the verification endpoint.
///
/// A token passes when the endpoint confirms it and, for scored
/// deployments, the score clears the configured minimum. Verdicts
/// without a score (v2 deployments) pass on `success` alone.
#[derive(Debug, Clone, Deserialize)]
pub struct Verdict {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub score: Option<f64>,
}

impl Verdict {
    pub fn passes(&self, min_score: f64) -> bool {
        self.success && self.score.map_or(true, |s| s >= min_score)
    }
}

/// Client for the reCAPTCHA siteverify endpoint.
pub struct RecaptchaVerifier {
    verify_url: String,
    secret: String,
    min_score: f64,
    timeout: Duration,
    client: reqwest::Client,
}

impl RecaptchaVerifier {
    /// Build a verifier from configuration; `None` when no secret is set.
    pub fn from_config(config: &RecaptchaConfig) -> Option<Self> {
        let secret = config.secret.clone()?;
        Some(Self {
            verify_url: config.verify_url.clone(),
            secret,
            min_score: config.min_score,
            timeout: config.timeout(),
            client: reqwest::Client::new(),
        })
    }

    /// Verify a token against the siteverify endpoint.
    pub async fn verify(&self, token: &str) -> Result<Verdict, reqwest::Error> {
        let response = self
            .client
            .post(&self.verify_url)
            .timeout(self.timeout)
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await?;

        let verdict: Verdict = response.json().await?;
        debug!(
            success = verdict.success,
            score = ?verdict.score,
            "siteverify responded"
        );
        Ok(verdict)
    }

    /// Minimum passing score for scored tokens.
    pub fn min_score(&self) -> f64 {
        self.min_score
    }
}
