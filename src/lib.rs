// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Form Relay
//!
//! This crate accepts contact form submissions for the portfolio site,
//! filters out abuse, and relays what survives to an inbox through a
//! Resend-compatible email API:
//!
//! - Origin allow-listing (production only)
//! - Honeypot field with camouflage success
//! - Minimum fill-time check against instant bot submissions
//! - reCAPTCHA v3 verification (fail-open on verifier outage)
//! - Per-sender fixed-window rate limiting (3 per hour default)
//! - Field scrubbing and HTML escaping before composition

pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod mailer;
pub mod metrics;
pub mod ratelimit;
pub mod sanitize;
pub mod verify;

pub use config::Config;
pub use error::RelayError;
pub use gate::{Gate, Outcome, OutcomeStatus, RelayRequest, Submission};
pub use ratelimit::{EmailRateLimiter, RateDecision};
