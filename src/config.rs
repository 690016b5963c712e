// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact form relay.
//!
//! Defaults match the portfolio site's deployed settings; everything
//! can be overridden through environment variables at startup.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Configuration for the contact form relay service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Site identity and origin allow list
    #[serde(default)]
    pub site: SiteConfig,

    /// Outbound email provider
    #[serde(default)]
    pub provider: ProviderConfig,

    /// reCAPTCHA token verification
    #[serde(default)]
    pub recaptcha: RecaptchaConfig,

    /// Per-sender rate limiting
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Bot and content defenses
    #[serde(default)]
    pub antispam: AntispamConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Site identity used for origin checks and email metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Public site URL; first entry of the origin allow list.
    /// Empty disables the origin check entirely.
    #[serde(default)]
    pub site_url: String,

    /// Whether the relay runs in production mode. The origin check
    /// only applies in production so local testing stays friction-free.
    #[serde(default)]
    pub production: bool,

    /// Development origins always allowed alongside `site_url`
    #[serde(default = "default_dev_origins")]
    pub dev_origins: Vec<String>,
}

/// Outbound email provider (Resend-compatible HTTP API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider dispatch endpoint (default: Resend's /emails)
    #[serde(default = "default_provider_api_url")]
    pub api_url: String,

    /// Bearer token for the provider API; unset means dispatch is
    /// unconfigured and every submission fails closed
    #[serde(default)]
    pub api_key: Option<String>,

    /// Destination inbox; unset means dispatch is unconfigured
    #[serde(default)]
    pub to_email: Option<String>,

    /// From header for relayed messages (default: Resend onboarding sender)
    #[serde(default = "default_from_address")]
    pub from_address: String,

    /// Prefix applied to relayed subject lines
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,

    /// Dispatch request timeout in seconds (default: 10)
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

/// reCAPTCHA v3 token verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecaptchaConfig {
    /// Server-side secret; unset disables verification
    #[serde(default)]
    pub secret: Option<String>,

    /// Verification endpoint (default: Google siteverify)
    #[serde(default = "default_verify_url")]
    pub verify_url: String,

    /// Minimum passing score for scored tokens (default: 0.5)
    #[serde(default = "default_min_score")]
    pub min_score: f64,

    /// Verification request timeout in seconds (default: 5)
    #[serde(default = "default_verify_timeout_secs")]
    pub timeout_secs: u64,
}

/// Per-sender rate limiting over a fixed window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum messages per window per sender address (default: 3)
    #[serde(default = "default_max_per_window")]
    pub max_per_window: u32,

    /// Rate window length in seconds (default: 3600)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

/// Bot and content defenses applied before dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntispamConfig {
    /// Minimum seconds between form load and submission (default: 3)
    #[serde(default = "default_min_fill_secs")]
    pub min_fill_secs: u64,

    /// Character cap for name and subject fields (default: 1000)
    #[serde(default = "default_max_field_chars")]
    pub max_field_chars: usize,

    /// Character cap for the message body (default: 5000)
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_dev_origins() -> Vec<String> {
    vec![
        "http://localhost:8888".to_string(),
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:8888".to_string(),
    ]
}

fn default_provider_api_url() -> String {
    "https://api.resend.com/emails".to_string()
}

fn default_from_address() -> String {
    "Portfolio Contact <onboarding@resend.dev>".to_string()
}

fn default_subject_prefix() -> String {
    "Portfolio Contact: ".to_string()
}

fn default_provider_timeout_secs() -> u64 {
    10
}

fn default_verify_url() -> String {
    "https://www.google.com/recaptcha/api/siteverify".to_string()
}

fn default_min_score() -> f64 {
    0.5
}

fn default_verify_timeout_secs() -> u64 {
    5
}

fn default_max_per_window() -> u32 {
    3
}

fn default_window_secs() -> u64 {
    3600 // one hour
}

fn default_min_fill_secs() -> u64 {
    3
}

fn default_max_field_chars() -> usize {
    1000
}

fn default_max_message_chars() -> usize {
    5000
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            site: SiteConfig::default(),
            provider: ProviderConfig::default(),
            recaptcha: RecaptchaConfig::default(),
            rate_limit: RateLimitConfig::default(),
            antispam: AntispamConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_url: String::new(),
            production: false,
            dev_origins: default_dev_origins(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: default_provider_api_url(),
            api_key: None,
            to_email: None,
            from_address: default_from_address(),
            subject_prefix: default_subject_prefix(),
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

impl Default for RecaptchaConfig {
    fn default() -> Self {
        Self {
            secret: None,
            verify_url: default_verify_url(),
            min_score: default_min_score(),
            timeout_secs: default_verify_timeout_secs(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_per_window: default_max_per_window(),
            window_secs: default_window_secs(),
        }
    }
}

impl Default for AntispamConfig {
    fn default() -> Self {
        Self {
            min_fill_secs: default_min_fill_secs(),
            max_field_chars: default_max_field_chars(),
            max_message_chars: default_max_message_chars(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl SiteConfig {
    /// Origins permitted to post submissions: the public site URL
    /// followed by the fixed development origins. An empty `site_url`
    /// contributes nothing.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = Vec::with_capacity(1 + self.dev_origins.len());
        if !self.site_url.is_empty() {
            origins.push(self.site_url.clone());
        }
        origins.extend(self.dev_origins.iter().cloned());
        origins
    }

    /// Host portion of the site URL, for email metadata.
    pub fn site_host(&self) -> Option<String> {
        Url::parse(&self.site_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

impl ProviderConfig {
    /// Whether dispatch credentials are present.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.to_email.is_some()
    }

    /// Get the dispatch timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RecaptchaConfig {
    /// Get the verification timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl AntispamConfig {
    /// Get the minimum fill duration
    pub fn min_fill_duration(&self) -> Duration {
        Duration::from_secs(self.min_fill_secs)
    }
}
