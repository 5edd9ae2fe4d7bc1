use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// ApiError
///
/// The single error taxonomy for the whole application. Every failure is
/// terminal for its request: handlers return `Result<_, ApiError>`, the error
/// converts into the final HTTP response, and nothing is retried or partially
/// recovered.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Login failed: unknown identifier or password mismatch. Deliberately
    /// indistinguishable from the outside.
    #[error("incorrect username or password")]
    InvalidCredentials,

    /// Bearer token failed to decode: malformed, expired, or bad signature.
    #[error("could not validate credentials")]
    InvalidToken,

    /// Token decoded but its subject no longer resolves to a user.
    #[error("user not found")]
    UserNotFound,

    /// The addressed club/event/membership/attendance row does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Duplicate membership or attendance pair.
    #[error("{0}")]
    AlreadyExists(&'static str),

    /// Role or ownership check failed.
    #[error("not authorized to access this resource")]
    Forbidden,

    /// Illegal lifecycle transition.
    #[error("{0}")]
    InvalidState(String),

    /// Schema constraint violation (bad hex color, short password, field not
    /// permitted for the caller's role).
    #[error("{0}")]
    Validation(String),

    /// Database or other infrastructure failure. Details are logged, never
    /// sent to the client.
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::UserNotFound => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AlreadyExists(_) => StatusCode::CONFLICT,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::InvalidState(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    /// Serializes the error as `{"detail": "..."}` with the mapped status,
    /// the shape the frontend already consumes.
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}
