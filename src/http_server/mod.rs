//! HTTP server module
//!
//! Serves the Alertmanager webhook receivers next to the status and health
//! endpoints. Each request is handled on its own task; alerts of one webhook
//! are processed in order and a shutdown stops a request between two alerts.

mod error;
mod receiver;
mod status;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{any, get},
};
pub use error::{ApiError, ServerError};
pub use receiver::{CLUSTER_RECEIVER_PATH, FLEET_RECEIVER_PATH};
pub use status::StatusResponse;
use tokio_util::sync::CancellationToken;

use crate::{
    config::AppConfig, context::AppMetrics, engine::Dispatcher,
    persistence::traits::DocumentStore,
};

/// State shared by all handlers.
pub struct ApiState<S: DocumentStore> {
    /// Shared application configuration.
    pub config: Arc<AppConfig>,
    /// Dispatches the alerts of a webhook.
    pub dispatcher: Arc<Dispatcher<S>>,
    /// Shared metrics.
    pub app_metrics: AppMetrics,
    /// Cancelled when the application shuts down.
    pub shutdown: CancellationToken,
}

impl<S: DocumentStore> Clone for ApiState<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            dispatcher: Arc::clone(&self.dispatcher),
            app_metrics: self.app_metrics.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

/// Builds the router with all endpoints.
pub fn app<S: DocumentStore + 'static>(state: ApiState<S>) -> Router {
    Router::new()
        .route(CLUSTER_RECEIVER_PATH, any(receiver::alertmanager_receiver::<S>))
        .route(FLEET_RECEIVER_PATH, any(receiver::alertmanager_receiver_fleet::<S>))
        .route("/status", get(status::status::<S>))
        .route("/health", get(status::health))
        .with_state(state)
}

/// Runs the HTTP server until the state's shutdown token is cancelled.
///
/// Requests in flight at shutdown finish the alert they are processing and
/// answer with what they did so far.
pub async fn run_server_from_config<S: DocumentStore + 'static>(
    state: ApiState<S>,
) -> Result<(), ServerError> {
    let listen_address = &state.config.server.listen_address;
    let addr: SocketAddr =
        listen_address.parse().map_err(|_| ServerError::InvalidAddress(listen_address.clone()))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "HTTP server listening.");

    let shutdown = state.shutdown.clone();
    axum::serve(listener, app(state).into_make_service())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("HTTP server stopped.");
    Ok(())
}
