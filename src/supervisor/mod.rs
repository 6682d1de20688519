//! The Supervisor module manages the lifecycle of the relay.
//!
//! It owns the long-running parts of the application, the webhook server and
//! the signal handler, and orchestrates a graceful shutdown:
//!
//! - **Initialization**: The `SupervisorBuilder` wires the dispatcher from the
//!   store, the service log client and the shared metrics.
//! - **Lifecycle Management**: `run` starts the supervised tasks and watches
//!   them. A task that fails brings the whole application down.
//! - **Graceful Shutdown**: On `SIGINT` or `SIGTERM` the shared cancellation
//!   token is cancelled. In-flight webhooks stop between two alerts, the server
//!   drains and the document store is flushed within `shutdown_timeout`.

mod builder;

use std::sync::Arc;

pub use builder::SupervisorBuilder;
use thiserror::Error;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::{
    config::AppConfig,
    context::AppMetrics,
    engine::Dispatcher,
    http_server::{self, ApiState, ServerError},
    persistence::traits::DocumentStore,
};

/// Represents the set of errors that can occur during the supervisor's
/// operation.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A required configuration was not provided to the `SupervisorBuilder`.
    #[error("Missing configuration for Supervisor")]
    MissingConfig,

    /// A document store was not provided to the `SupervisorBuilder`.
    #[error("Missing document store for Supervisor")]
    MissingDocumentStore,

    /// A service log sender was not provided to the `SupervisorBuilder`.
    #[error("Missing service log sender for Supervisor")]
    MissingServiceLogSender,

    /// The HTTP server could not be started or stopped with an error.
    #[error("HTTP server error: {0}")]
    Server(#[from] ServerError),
}

/// The primary runtime manager for the application.
pub struct Supervisor<S: DocumentStore + 'static> {
    /// Shared application configuration.
    config: Arc<AppConfig>,

    /// The document store holding definitions and delivery records.
    store: Arc<S>,

    /// The shared application metrics.
    app_metrics: AppMetrics,

    /// Decides and sends service logs for incoming alerts.
    dispatcher: Arc<Dispatcher<S>>,

    /// A token used to signal a graceful shutdown to all supervised tasks.
    cancellation_token: CancellationToken,

    /// The supervised tasks.
    join_set: tokio::task::JoinSet<Result<(), SupervisorError>>,
}

impl<S: DocumentStore + 'static> Supervisor<S> {
    /// Creates a new Supervisor instance with all its required components.
    pub fn new(
        config: AppConfig,
        store: Arc<S>,
        app_metrics: AppMetrics,
        dispatcher: Arc<Dispatcher<S>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            app_metrics,
            dispatcher,
            cancellation_token: CancellationToken::new(),
            join_set: tokio::task::JoinSet::new(),
        }
    }

    /// Returns a new `SupervisorBuilder` instance.
    pub fn builder() -> SupervisorBuilder<S> {
        SupervisorBuilder::new()
    }

    /// Returns a handle to the shutdown token. Cancelling it has the same
    /// effect as a termination signal.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Starts the supervised tasks and blocks until shutdown.
    ///
    /// Returns the first error a supervised task failed with, after the
    /// cleanup ran.
    pub async fn run(mut self) -> Result<(), SupervisorError> {
        let cancellation_token = self.cancellation_token.clone();
        self.join_set.spawn(async move {
            wait_for_signal(cancellation_token).await;
            Ok(())
        });

        let state = ApiState {
            config: Arc::clone(&self.config),
            dispatcher: Arc::clone(&self.dispatcher),
            app_metrics: self.app_metrics.clone(),
            shutdown: self.cancellation_token.clone(),
        };
        self.join_set.spawn(async move {
            http_server::run_server_from_config(state).await?;
            Ok(())
        });

        let mut failure = None;
        loop {
            tokio::select! {
                maybe_result = self.join_set.join_next() => {
                    match maybe_result {
                        Some(Ok(Ok(()))) => {
                            // A task finished without error, keep watching the others.
                        }
                        Some(Ok(Err(e))) => {
                            tracing::error!(error = %e, "A supervised task failed. Initiating shutdown.");
                            failure.get_or_insert(e);
                            self.cancellation_token.cancel();
                        }
                        Some(Err(e)) => {
                            tracing::error!("A critical task failed: {:?}. Initiating shutdown.", e);
                            self.cancellation_token.cancel();
                        }
                        None => break,
                    }
                }
                _ = self.cancellation_token.cancelled() => break,
            }
        }

        // The server drains in-flight webhooks before its task completes.
        let shutdown_timeout = self.config.shutdown_timeout;
        let drain = async {
            while let Some(result) = self.join_set.join_next().await {
                if let Ok(Err(e)) = result {
                    tracing::error!(error = %e, "A supervised task failed during shutdown.");
                    failure.get_or_insert(e);
                }
            }
        };
        if tokio::time::timeout(shutdown_timeout, drain).await.is_err() {
            tracing::warn!("Supervised tasks did not stop within {:?}. Aborting them.", shutdown_timeout);
        }
        self.join_set.shutdown().await;
        tracing::info!("All supervised tasks have completed.");

        tracing::info!("Starting graceful resource cleanup...");
        let cleanup_logic = async {
            if let Err(e) = self.store.flush().await {
                tracing::error!(error = %e, "Failed to flush pending writes, but continuing cleanup.");
            }
            if let Err(e) = self.store.cleanup().await {
                tracing::error!(error = %e, "Failed to perform document store cleanup, but continuing.");
            }
        };

        if tokio::time::timeout(shutdown_timeout, cleanup_logic).await.is_err() {
            tracing::warn!(
                "Cleanup did not complete within the timeout of {:?}. Continuing shutdown.",
                shutdown_timeout
            );
        } else {
            tracing::info!("Cleanup completed successfully.");
        }

        tracing::info!("Supervisor shutdown complete.");
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Cancels `token` on `SIGINT` or `SIGTERM`, or returns once it is cancelled
/// elsewhere.
async fn wait_for_signal(token: CancellationToken) {
    let ctrl_c = signal::ctrl_c();
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to register SIGTERM handler.");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT (Ctrl+C) received, initiating graceful shutdown."),
        _ = terminate => tracing::info!("SIGTERM received, initiating graceful shutdown."),
        _ = token.cancelled() => return,
    }

    token.cancel();
}
