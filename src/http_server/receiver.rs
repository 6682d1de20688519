//! Handlers for the Alertmanager webhook receivers.

use axum::{
    body::Bytes,
    extract::State,
    http::Method,
    response::Json,
};

use super::{ApiError, ApiState};
use crate::{
    models::{AmReceiverData, AmReceiverResponse},
    persistence::traits::DocumentStore,
};

/// Path of the single-cluster receiver.
pub const CLUSTER_RECEIVER_PATH: &str = "/alertmanager-receiver";

/// Path of the fleet receiver.
pub const FLEET_RECEIVER_PATH: &str = "/alertmanager-receiver-fleet";

/// Accepts POST requests carrying an Alertmanager webhook payload. A body
/// that cannot be decoded counts as a failed request of `path`.
async fn decode_payload<S: DocumentStore>(
    state: &ApiState<S>,
    method: &Method,
    body: &[u8],
    path: &str,
) -> Result<AmReceiverData, ApiError> {
    if method != Method::POST {
        return Err(ApiError::MethodNotAllowed);
    }

    match serde_json::from_slice(body) {
        Ok(data) => Ok(data),
        Err(e) => {
            tracing::warn!(path, error = %e, "Failed to decode webhook payload.");
            state.app_metrics.record_request_failure(path).await;
            Err(ApiError::BadRequest)
        }
    }
}

/// Receives alerts about the local cluster.
pub async fn alertmanager_receiver<S: DocumentStore + 'static>(
    State(state): State<ApiState<S>>,
    method: Method,
    body: Bytes,
) -> Result<Json<AmReceiverResponse>, ApiError> {
    let data = decode_payload(&state, &method, &body, CLUSTER_RECEIVER_PATH).await?;

    let cancel = state.shutdown.child_token();
    state.dispatcher.process_cluster_batch(&data, &cancel).await?;

    state.app_metrics.reset_request_failures(CLUSTER_RECEIVER_PATH).await;
    Ok(Json(AmReceiverResponse::ok()))
}

/// Receives alerts about hosted clusters of a fleet.
pub async fn alertmanager_receiver_fleet<S: DocumentStore + 'static>(
    State(state): State<ApiState<S>>,
    method: Method,
    body: Bytes,
) -> Result<Json<AmReceiverResponse>, ApiError> {
    let data = decode_payload(&state, &method, &body, FLEET_RECEIVER_PATH).await?;

    let cancel = state.shutdown.child_token();
    state.dispatcher.process_fleet_batch(&data, &cancel).await;

    state.app_metrics.reset_request_failures(FLEET_RECEIVER_PATH).await;
    Ok(Json(AmReceiverResponse::ok()))
}
