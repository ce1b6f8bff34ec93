use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("External dependency error: {0}")]
    External(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::External(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<bomsync_core::Error> for AppError {
    fn from(error: bomsync_core::Error) -> Self {
        use bomsync_core::Error;

        match error {
            Error::InvalidInput(message) => Self::BadRequest(message),
            Error::NotFound(message) => Self::NotFound(message),
            error @ (Error::Http(_)
            | Error::Source(_)
            | Error::DanglingParent { .. }
            | Error::AssemblyCycle(_)) => Self::External(error.to_string()),
            error => Self::Internal(error.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("API: {self}");
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_status_codes() {
        let cases = [
            (
                bomsync_core::Error::InvalidInput("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                bomsync_core::Error::NotFound("gone".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                bomsync_core::Error::Source("down".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                bomsync_core::Error::AssemblyCycle(vec!["ASM-1".into()]),
                StatusCode::BAD_GATEWAY,
            ),
            (
                bomsync_core::Error::Database("locked".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(AppError::from(error).status(), expected);
        }
    }

    #[test]
    fn response_carries_status() {
        let response = AppError::conflict("busy").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
