//! Axum-specific error type and its JSON/status-code mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use offliner_core::domain::QuotaReason;
use offliner_core::error::CoreError;

/// Axum-layer error type. `CoreError` variants map onto these; the HTTP
/// edge never leaks a raw `CoreError` into a response body.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("quota exceeded")]
    QuotaExceeded {
        reason: QuotaReason,
        limit: f64,
        observed: f64,
    },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message, reason) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            Self::QuotaExceeded { reason, .. } => {
                (StatusCode::TOO_MANY_REQUESTS, reason.user_message().to_string(), Some(reason.as_str()))
            }
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone(), None),
            Self::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone(), None),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), None),
        };

        (status, axum::Json(ErrorBody { error: message, reason })).into_response()
    }
}

impl From<CoreError> for HttpError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InputInvalid { message } => Self::BadRequest(message),
            CoreError::QuotaExceeded { reason, limit, observed } => {
                Self::QuotaExceeded { reason, limit, observed }
            }
            CoreError::BrokerUnavailable { message } | CoreError::StoreUnavailable { message } => {
                Self::ServiceUnavailable(message)
            }
            CoreError::ResolutionFailed { message }
            | CoreError::DownloadItemFailed { message }
            | CoreError::ExternalToolFailed { message } => Self::Internal(message),
            CoreError::DownloadAllFailed => Self::Internal("all items failed to download".to_string()),
            CoreError::Cancelled => Self::Conflict("request was cancelled".to_string()),
        }
    }
}
