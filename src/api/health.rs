//! Health check endpoints

use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;

use super::ApiState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Detailed readiness response
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub script: String,
    pub checks: ReadinessChecks,
}

/// Individual readiness checks
#[derive(Serialize)]
pub struct ReadinessChecks {
    pub store: CheckResult,
    pub voice: CheckResult,
}

/// Result of a single readiness check
#[derive(Serialize)]
pub struct CheckResult {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    const fn ok() -> Self {
        Self {
            status: "ok",
            message: None,
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            status: "fail",
            message: Some(message.into()),
        }
    }

    fn unavailable() -> Self {
        Self {
            status: "unavailable",
            message: Some("not configured".to_string()),
        }
    }
}

/// Build the health router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .with_state(state)
}

/// Liveness probe - is the service running?
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness probe - can the gateway take a conversation?
async fn ready(State(state): State<Arc<ApiState>>) -> (StatusCode, Json<ReadinessResponse>) {
    let store = check_store(&state);
    let voice = if state.stt.is_some() && state.tts.is_some() {
        CheckResult::ok()
    } else {
        CheckResult::unavailable()
    };

    // voice is optional (text sessions still work); the store is not
    let all_ok = store.status == "ok";
    let status_code = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(ReadinessResponse {
            status: if all_ok { "ready" } else { "not_ready" },
            script: state.script.id.clone(),
            checks: ReadinessChecks { store, voice },
        }),
    )
}

/// The store must be able to create its parent directory
fn check_store(state: &ApiState) -> CheckResult {
    match state.store.path().parent() {
        Some(parent) => match std::fs::create_dir_all(parent) {
            Ok(()) => CheckResult::ok(),
            Err(e) => CheckResult::fail(e.to_string()),
        },
        None => CheckResult::fail("log path has no parent directory"),
    }
}
