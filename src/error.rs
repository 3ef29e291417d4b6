use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

/// ApiError
///
/// The single outcome taxonomy for every manager operation. Each operation
/// resolves to either a success value or exactly one of these kinds; nothing
/// escapes a manager boundary as a panic or a raw store error.
///
/// Status-code mapping lives at the transport edge (handlers). Most kinds have
/// one natural code, but `NotFound` is deliberately mapped per operation: the
/// public surface splits it between 400 and 404. See handlers.rs.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// Duplicate key on create.
    #[error("{0}")]
    Conflict(String),

    /// The referenced record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Missing, invalid, or expired token for an owner-scoped operation.
    #[error("Missing required token in header, or token is invalid")]
    Forbidden,

    /// Credential check failed on token issuance.
    #[error("Password did not match the specified account's stored password")]
    InvalidCredentials,

    /// The token has already expired and cannot be extended.
    #[error("The token has already expired, and cannot be extended")]
    Expired,

    /// Semantic rejection, e.g. a URL whose host has no DNS records.
    #[error("{0}")]
    Invalid(String),

    /// A listing over a collection that holds no records at all.
    #[error("No media available")]
    Empty,

    /// A relation invariant was already broken before this operation ran.
    #[error("{0}")]
    Inconsistent(String),

    /// Some but not all items in a fan-out succeeded.
    #[error("{failed} of {} media deletions failed; the account itself was removed", .succeeded + .failed)]
    PartialFailure { succeeded: usize, failed: usize },

    /// The persistence collaborator failed for reasons opaque to this layer.
    #[error("{0}")]
    Persistence(String),
}

impl ApiError {
    /// Default status for each kind. Handlers override `NotFound` (and the
    /// media-create owner lookup) where the preserved surface disagrees.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiError::Expired => StatusCode::BAD_REQUEST,
            ApiError::Invalid(_) => StatusCode::BAD_REQUEST,
            ApiError::Empty => StatusCode::BAD_REQUEST,
            ApiError::Inconsistent(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::PartialFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// ErrorBody
///
/// The wire shape for every error response: a short human-readable message,
/// never the underlying storage error's raw detail.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
