use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures surfaced to HTTP clients.
///
/// Clients only see the status and a fixed phrase; the cause is logged where
/// the error is raised.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    #[error("User identification failed")]
    Identity,
    #[error("Failed to read request body")]
    ReadBody,
    #[error("Failed to parse request body")]
    ParseBody,
    #[error("Completion request failed")]
    Completion,
    #[error("Failed to load history")]
    History,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ReadBody | ApiError::ParseBody => StatusCode::BAD_REQUEST,
            ApiError::Identity | ApiError::Completion | ApiError::History => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_errors_are_bad_requests() {
        assert_eq!(ApiError::ReadBody.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::ParseBody.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn everything_else_is_internal() {
        for e in [ApiError::Identity, ApiError::Completion, ApiError::History] {
            assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
