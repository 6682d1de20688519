//! Represents the `/status` and `/health` endpoint handlers.
//! Provides application status and metrics.

use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use serde_json::json;

use super::ApiState;
use crate::{context::SentCounts, persistence::traits::DocumentStore};

/// Represents the response from the `/status` endpoint.
#[derive(Debug, Serialize, Clone)]
pub struct StatusResponse {
    /// The version of the application.
    pub version: String,
    /// The namespace notification documents are kept in.
    pub namespace: String,
    /// The uptime of the application in seconds.
    pub uptime_secs: u64,
    /// Consecutive failed requests per receiver path.
    pub request_failures: BTreeMap<String, u64>,
    /// Consecutive failed calls per external API.
    pub response_failures: BTreeMap<String, u64>,
    /// Service logs sent per template.
    pub service_logs_sent: BTreeMap<String, SentCounts>,
}

/// Retrieves application status and metrics.
pub async fn status<S: DocumentStore>(State(state): State<ApiState<S>>) -> impl IntoResponse {
    let metrics = state.app_metrics.snapshot().await;
    let response = StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        namespace: state.config.namespace.clone(),
        uptime_secs: metrics.start_time.elapsed().as_secs(),
        request_failures: metrics.request_failures,
        response_failures: metrics.response_failures,
        service_logs_sent: metrics.service_logs_sent,
    };
    (StatusCode::OK, Json(response))
}

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
