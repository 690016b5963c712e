// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Form Relay Service
//!
//! Accepts submissions from the portfolio site's contact form, runs
//! them through a chain of abuse checks, and relays survivors to an
//! inbox via a Resend-compatible email API:
//!
//! - Origin allow-listing in production
//! - Honeypot and minimum fill-time bot traps
//! - reCAPTCHA v3 verification, fail-open on verifier outage
//! - 3 messages per hour per sender address (default)
//! - Field scrubbing before anything reaches the email body
//!
//! ## Configuration
//!
//! Configuration is loaded from the environment (a `.env` file is
//! honored when present):
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `SITE_URL`: Public site origin, first allow-list entry
//! - `RELAY_ENV` / `NODE_ENV`: `production` enables the origin check
//! - `RESEND_API_URL`: Dispatch endpoint (default: Resend's /emails)
//! - `RESEND_API_KEY`: Dispatch bearer token
//! - `TO_EMAIL`: Destination inbox
//! - `FROM_ADDRESS`: From header for relayed messages
//! - `RECAPTCHA_SECRET_KEY`: siteverify secret; unset disables verification
//! - `RECAPTCHA_VERIFY_URL`: siteverify endpoint override
//! - `MAX_EMAILS_PER_WINDOW`: Sends per window per address (default: 3)
//! - `RATE_LIMIT_WINDOW_SECS`: Window length (default: 3600)
//! - `MIN_FILL_SECS`: Minimum form fill time (default: 3)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contact_form_relay::{
    config::{AntispamConfig, Config, ProviderConfig, RateLimitConfig, RecaptchaConfig, SiteConfig},
    gate::Gate,
    handlers::{router, AppState},
    metrics::RelayMetrics,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = load_config();
    info!(
        bind_addr = %config.bind_addr,
        production = config.site.production,
        max_per_window = config.rate_limit.max_per_window,
        window_secs = config.rate_limit.window_secs,
        "Starting contact form relay"
    );

    if !config.provider.is_configured() {
        warn!("email provider credentials missing; every submission will fail closed");
    }
    if config.recaptcha.secret.is_none() {
        info!("no recaptcha secret configured; token verification disabled");
    }

    // Create application state
    let state = Arc::new(AppState {
        gate: Gate::new(config.clone()),
        metrics: RelayMetrics::new(),
        config: config.clone(),
    });

    // Build router
    let app = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Load configuration from environment variables.
fn load_config() -> Config {
    Config {
        bind_addr: env_string("BIND_ADDR", "0.0.0.0:8080"),
        site: SiteConfig {
            site_url: env_string("SITE_URL", ""),
            production: env_is_production(),
            ..Default::default()
        },
        provider: ProviderConfig {
            api_url: env_string("RESEND_API_URL", "https://api.resend.com/emails"),
            api_key: env_opt("RESEND_API_KEY"),
            to_email: env_opt("TO_EMAIL"),
            from_address: env_string("FROM_ADDRESS", "Portfolio Contact <onboarding@resend.dev>"),
            ..Default::default()
        },
        recaptcha: RecaptchaConfig {
            secret: env_opt("RECAPTCHA_SECRET_KEY"),
            verify_url: env_string(
                "RECAPTCHA_VERIFY_URL",
                "https://www.google.com/recaptcha/api/siteverify",
            ),
            ..Default::default()
        },
        rate_limit: RateLimitConfig {
            max_per_window: env_parse("MAX_EMAILS_PER_WINDOW", 3),
            window_secs: env_parse("RATE_LIMIT_WINDOW_SECS", 3600),
        },
        antispam: AntispamConfig {
            min_fill_secs: env_parse("MIN_FILL_SECS", 3),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// `RELAY_ENV` wins over `NODE_ENV`; either set to `production`
/// enables the production-only checks.
fn env_is_production() -> bool {
    env_opt("RELAY_ENV")
        .or_else(|| env_opt("NODE_ENV"))
        .is_some_and(|v| v == "production")
}
