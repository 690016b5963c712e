// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for the relay.
//!
//! Counters only. Submission outcomes are labeled with the gate's
//! stable outcome labels, so the honeypot catch rate and each
//! rejection reason can be graphed separately.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::error;

/// Metrics registry scoped to one relay instance.
pub struct RelayMetrics {
    registry: Registry,
    submissions: IntCounterVec,
    emails_sent: IntCounter,
    emails_failed: IntCounter,
}

impl RelayMetrics {
    /// Build and register all counters. Registration of fresh counters
    /// in a fresh registry cannot collide, so failures here are
    /// programming errors and panic at startup.
    pub fn new() -> Self {
        let registry = Registry::new();

        let submissions = IntCounterVec::new(
            Opts::new(
                "contact_submissions_total",
                "Submissions processed, labeled by gate outcome",
            ),
            &["outcome"],
        )
        .expect("submissions counter definition");
        registry
            .register(Box::new(submissions.clone()))
            .expect("submissions counter registration");

        let emails_sent = IntCounter::new(
            "contact_emails_sent_total",
            "Emails accepted by the provider",
        )
        .expect("sent counter definition");
        registry
            .register(Box::new(emails_sent.clone()))
            .expect("sent counter registration");

        let emails_failed = IntCounter::new(
            "contact_emails_failed_total",
            "Dispatch attempts the provider rejected or that never arrived",
        )
        .expect("failed counter definition");
        registry
            .register(Box::new(emails_failed.clone()))
            .expect("failed counter registration");

        Self {
            registry,
            submissions,
            emails_sent,
            emails_failed,
        }
    }

    /// Count one processed submission under its outcome label.
    pub fn record_outcome(&self, label: &str) {
        self.submissions.with_label_values(&[label]).inc();
        match label {
            "delivered" => self.emails_sent.inc(),
            "upstream" => self.emails_failed.inc(),
            _ => {}
        }
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn gather(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(err) = encoder.encode(&self.registry.gather(), &mut buffer) {
            error!(error = %err, "metrics encoding failed");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for RelayMetrics {
    fn default() -> Self {
        Self::new()
    }
}
