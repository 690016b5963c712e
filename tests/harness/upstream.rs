// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! In-process stand-ins for the upstream services the relay talks to.
//!
//! Each fake binds an ephemeral port and serves from a spawned task
//! for the rest of the test, so tests can point the relay at real HTTP
//! endpoints without leaving the process.

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// One dispatch request captured by the fake provider.
#[derive(Debug, Clone)]
pub struct CapturedEmail {
    pub bearer: Option<String>,
    pub body: Value,
}

/// Stand-in for the Resend dispatch API.
pub struct FakeResend {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<CapturedEmail>>>,
}

impl FakeResend {
    /// Spawn a fake provider that answers every dispatch with `status`.
    pub async fn spawn(status: StatusCode) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let captured = received.clone();

        let app = Router::new().route(
            "/emails",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    let bearer = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    captured.lock().await.push(CapturedEmail { bearer, body });
                    (status, Json(json!({ "id": "email_test" })))
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake provider");
        let addr = listener.local_addr().expect("fake provider addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve fake provider");
        });

        Self { addr, received }
    }

    pub fn api_url(&self) -> String {
        format!("http://{}/emails", self.addr)
    }

    pub async fn captured(&self) -> Vec<CapturedEmail> {
        self.received.lock().await.clone()
    }

    pub async fn dispatch_count(&self) -> usize {
        self.received.lock().await.len()
    }
}

/// Stand-in for the reCAPTCHA siteverify endpoint.
pub struct FakeSiteverify {
    addr: SocketAddr,
}

impl FakeSiteverify {
    /// Spawn a verifier that renders every token the given verdict.
    pub async fn spawn(success: bool, score: Option<f64>) -> Self {
        let app = Router::new().route(
            "/siteverify",
            post(move || async move { Json(json!({ "success": success, "score": score })) }),
        );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake siteverify");
        let addr = listener.local_addr().expect("fake siteverify addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve fake siteverify");
        });

        Self { addr }
    }

    pub fn verify_url(&self) -> String {
        format!("http://{}/siteverify", self.addr)
    }
}

/// A local URL that refuses connections, for outage simulation.
pub async fn unreachable_url(path: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind probe");
    let addr = listener.local_addr().expect("probe addr");
    drop(listener);
    format!("http://{addr}{path}")
}
