// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP surface of the contact form relay.
//!
//! The relay endpoint accepts every method on purpose; the gate owns
//! the method check so non-POST traffic gets the same JSON envelope as
//! every other rejection instead of a bare 405 from the router.

use crate::config::Config;
use crate::gate::{Gate, RelayRequest};
use crate::metrics::RelayMetrics;
use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Shared application state.
pub struct AppState {
    pub gate: Gate,
    pub metrics: RelayMetrics,
    pub config: Config,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "contact-form-relay",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Contact form submission endpoint.
///
/// Collapses the transport into a [`RelayRequest`], runs the gate, and
/// maps the outcome back onto the wire: JSON envelope, HTTP status,
/// and a Retry-After hint when the sender is rate limited.
pub async fn relay(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    method: Method,
    headers: HeaderMap,
    body: String,
) -> Response {
    let request = RelayRequest {
        method,
        origin: header_value(&headers, header::ORIGIN.as_str()),
        referer: header_value(&headers, header::REFERER.as_str()),
        client_ip: Some(client_ip(&headers, addr)),
        body,
    };

    debug!(
        client_ip = ?request.client_ip,
        origin = ?request.origin,
        "processing submission request"
    );

    let outcome = state.gate.handle(request).await;
    state.metrics.record_outcome(outcome.label);

    let status = outcome.http_status;
    match outcome.retry_after {
        Some(retry) => (
            status,
            [("Retry-After", retry.as_secs().to_string())],
            Json(outcome),
        )
            .into_response(),
        None => (status, Json(outcome)).into_response(),
    }
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.gather(),
    )
}

/// Assemble the service router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    let mut app: Router<Arc<AppState>> = Router::new()
        .route("/api/send-email", any(relay))
        .route("/health", get(health))
        .route("/healthz", get(health));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS layer restricted to the configured origins, POST only.
fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .site
        .allowed_origins()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Client address: first entry of X-Forwarded-For, then Client-IP,
/// then the socket peer address.
fn client_ip(headers: &HeaderMap, addr: SocketAddr) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next().map(str::trim) {
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(client) = headers.get("client-ip").and_then(|v| v.to_str().ok()) {
        let client = client.trim();
        if !client.is_empty() {
            return client.to_string();
        }
    }

    addr.ip().to_string()
}
