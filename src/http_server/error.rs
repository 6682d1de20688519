//! Defines the custom `ApiError` type for the HTTP server.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::{engine::DispatchError, models::AmReceiverResponse};

/// A custom error type for the API that can be converted into an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    /// The receiver was called with a method other than POST.
    MethodNotAllowed,

    /// The request body is not a webhook payload.
    BadRequest,

    /// The notification definitions could not be read.
    DefinitionsUnavailable(String),
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        ApiError::DefinitionsUnavailable(err.to_string())
    }
}

/// A plain text error response.
fn plain_text(status: StatusCode, message: &'static str) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        message,
    )
        .into_response()
}

/// Implements the conversion from `ApiError` into an `axum` response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MethodNotAllowed =>
                plain_text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed\n"),
            ApiError::BadRequest => plain_text(StatusCode::BAD_REQUEST, "Bad request body\n"),
            ApiError::DefinitionsUnavailable(err) => {
                tracing::error!("Unable to list managed notifications: {}", err);
                let body = AmReceiverResponse::failed(
                    StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                    "unable to list managed notifications",
                    err,
                );
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

/// Errors that prevent the HTTP server from running.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured listen address is not a socket address.
    #[error("Invalid server.listen_address '{0}'")]
    InvalidAddress(String),

    /// Binding or serving failed.
    #[error("HTTP server error: {0}")]
    Io(#[from] std::io::Error),
}
