// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter keyed by sender email address.
//!
//! Each address gets `max_per_window` sends per window. The window is
//! anchored at the first send: once `window_secs` have elapsed since
//! that first send, the next check resets the whole record and starts
//! a fresh window.
//!
//! Storage sits behind [`RateStore`] so the in-memory map can be
//! swapped for a shared backend without touching the gate. Stale
//! records are reset lazily on the next check for their key; there is
//! no background sweeper.

use crate::config::RateLimitConfig;
use crate::sanitize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateDecision {
    /// Send is allowed
    Allowed {
        /// Sends consumed in the current window, this one included
        count: u32,
    },
    /// Send is rate limited
    Limited {
        /// Time until the current window expires
        retry_after: Duration,
    },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Per-key send record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateRecord {
    /// Sends counted in the current window
    pub count: u32,
    /// When the current window opened, in epoch milliseconds
    pub window_start_ms: i64,
}

/// Storage backend for rate records.
///
/// `try_acquire` must check and update the record in one atomic step;
/// two concurrent calls for the same key must never both observe the
/// pre-update count.
pub trait RateStore: Send + Sync {
    /// Count one send attempt against `key`, resetting the record
    /// first if its window has expired.
    fn try_acquire(&self, key: &str, now_ms: i64, window: Duration, max: u32) -> RateDecision;

    /// Read the current record for `key` without modifying it.
    fn peek(&self, key: &str) -> Option<RateRecord>;
}

/// In-memory store backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<String, RateRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateStore for InMemoryStore {
    fn try_acquire(&self, key: &str, now_ms: i64, window: Duration, max: u32) -> RateDecision {
        let window_ms = window.as_millis() as i64;
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);

        let record = records.entry(key.to_string()).or_insert(RateRecord {
            count: 0,
            window_start_ms: now_ms,
        });

        // A window that has fully elapsed resets wholesale: count and
        // anchor both start over.
        if now_ms - record.window_start_ms > window_ms {
            record.count = 0;
            record.window_start_ms = now_ms;
        }

        if record.count >= max {
            let elapsed_ms = now_ms - record.window_start_ms;
            let remaining_ms = (window_ms - elapsed_ms).max(0);
            return RateDecision::Limited {
                retry_after: Duration::from_millis(remaining_ms as u64),
            };
        }

        record.count += 1;
        RateDecision::Allowed { count: record.count }
    }

    fn peek(&self, key: &str) -> Option<RateRecord> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.get(key).copied()
    }
}

/// Rate limiter keyed by normalized sender address.
pub struct EmailRateLimiter {
    config: RateLimitConfig,
    store: Arc<dyn RateStore>,
}

impl EmailRateLimiter {
    /// Create a limiter over a fresh in-memory store.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_store(config, Arc::new(InMemoryStore::new()))
    }

    /// Create a limiter over an injected store.
    pub fn with_store(config: RateLimitConfig, store: Arc<dyn RateStore>) -> Self {
        Self { config, store }
    }

    /// Count a send attempt for `email` at the current wall clock.
    pub fn check(&self, email: &str) -> RateDecision {
        self.check_at(email, chrono::Utc::now().timestamp_millis())
    }

    /// Count a send attempt for `email` at an explicit time.
    pub fn check_at(&self, email: &str, now_ms: i64) -> RateDecision {
        let key = sanitize::normalize_email(email);
        let decision = self.store.try_acquire(
            &key,
            now_ms,
            self.config.window_duration(),
            self.config.max_per_window,
        );

        match &decision {
            RateDecision::Allowed { count } => {
                debug!(email = %key, count, max = self.config.max_per_window, "send counted");
            }
            RateDecision::Limited { retry_after } => {
                warn!(
                    email = %key,
                    retry_after_secs = retry_after.as_secs(),
                    "rate limit exceeded"
                );
            }
        }

        decision
    }

    /// Read the record for `email` without counting a send.
    pub fn snapshot(&self, email: &str) -> Option<RateRecord> {
        self.store.peek(&sanitize::normalize_email(email))
    }
}
