// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outbound email composition and dispatch.
//!
//! Builds the relayed message in both plain text and HTML, then posts
//! it to a Resend-compatible HTTP API. All submission-derived values
//! land in the HTML body entity-escaped; the reply-to carries the
//! sender's address so replies go straight back to them.

use crate::config::ProviderConfig;
use crate::error::RelayError;
use crate::gate::CleanSubmission;
use crate::sanitize;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info};

/// Request-independent context recorded in the message footer.
#[derive(Debug, Clone)]
pub struct SenderMeta {
    /// When the relay accepted the submission
    pub submitted_at: DateTime<Utc>,
    /// Client address as reported by the ingress
    pub client_ip: String,
    /// Host of the site the form lives on, when configured
    pub site_host: Option<String>,
}

/// Wire form of a dispatch request.
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub reply_to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Client for a Resend-compatible dispatch API.
pub struct ResendMailer {
    api_url: String,
    api_key: String,
    to_email: String,
    from_address: String,
    subject_prefix: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl ResendMailer {
    /// Build a mailer from configuration; `None` while credentials are
    /// missing, which the gate reports as a configuration error.
    pub fn from_config(config: &ProviderConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        let to_email = config.to_email.clone()?;
        Some(Self {
            api_url: config.api_url.clone(),
            api_key,
            to_email,
            from_address: config.from_address.clone(),
            subject_prefix: config.subject_prefix.clone(),
            timeout: config.timeout(),
            client: reqwest::Client::new(),
        })
    }

    /// Compose the relayed message from a scrubbed submission.
    pub fn compose(&self, submission: &CleanSubmission, meta: &SenderMeta) -> EmailMessage {
        let timestamp = meta.submitted_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let source = meta.site_host.as_deref().unwrap_or("portfolio site");

        let text = format!(
            "New message from the {source} contact form.\n\
             \n\
             From: {name}\n\
             Email: {email}\n\
             Subject: {subject}\n\
             \n\
             Message:\n\
             {message}\n\
             \n\
             ---\n\
             Submitted: {timestamp}\n\
             Client IP: {ip}\n",
            source = source,
            name = submission.name,
            email = submission.email,
            subject = submission.subject,
            message = submission.message,
            timestamp = timestamp,
            ip = meta.client_ip,
        );

        let html = format!(
            "<!DOCTYPE html>\n\
             <html>\n\
             <body style=\"font-family: sans-serif; max-width: 600px;\">\n\
             <h2>New contact form message</h2>\n\
             <p><strong>From:</strong> {name} &lt;<a href=\"mailto:{email}\">{email}</a>&gt;</p>\n\
             <p><strong>Subject:</strong> {subject}</p>\n\
             <blockquote style=\"white-space: pre-wrap; border-left: 3px solid #ccc; padding-left: 1em;\">{message}</blockquote>\n\
             <hr>\n\
             <p><small>Submitted {timestamp} from {ip} via {source}</small></p>\n\
             </body>\n\
             </html>\n",
            name = sanitize::escape_html(&submission.name),
            email = sanitize::escape_html(&submission.email),
            subject = sanitize::escape_html(&submission.subject),
            message = sanitize::escape_html(&submission.message),
            timestamp = timestamp,
            ip = sanitize::escape_html(&meta.client_ip),
            source = sanitize::escape_html(source),
        );

        EmailMessage {
            from: self.from_address.clone(),
            to: vec![self.to_email.clone()],
            reply_to: submission.email.clone(),
            subject: format!("{}{}", self.subject_prefix, submission.subject),
            text,
            html,
        }
    }

    /// Post a composed message to the dispatch API.
    pub async fn send(&self, message: &EmailMessage) -> Result<(), RelayError> {
        let response = self
            .client
            .post(&self.api_url)
            .timeout(self.timeout)
            .bearer_auth(&self.api_key)
            .json(message)
            .send()
            .await
            .map_err(|err| {
                error!(error = %err, "email dispatch request failed");
                RelayError::Upstream
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "email provider rejected dispatch");
            return Err(RelayError::Upstream);
        }

        info!(reply_to = %message.reply_to, "email dispatched");
        Ok(())
    }
}
