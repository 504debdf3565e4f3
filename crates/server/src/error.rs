//! Error type for the HTTP handlers.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quiz_core::api::ErrorResponse;
use services::{CatalogError, ProgressError};
use thiserror::Error;

/// Everything a handler can fail with.
///
/// Bodies are always `{"error": "..."}` with a fixed message per kind; store
/// failure details stay in the logs.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Progress(#[from] ProgressError),

    /// The body was not valid JSON for the route.
    #[error("invalid request body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    /// - unknown question: 404
    /// - store unreachable: 503
    /// - anything wrong with the request: 400
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Catalog(CatalogError::QuestionNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Progress(err) if err.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            Self::Catalog(_) | Self::Progress(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            Self::Catalog(CatalogError::QuestionNotFound(_)) => "Question not found",
            Self::Catalog(_) => "Invalid question request",
            Self::Progress(ProgressError::MissingIdentity | ProgressError::InvalidIdentity(_)) => {
                "Email is required"
            }
            Self::Progress(ProgressError::MissingSnapshot) => "Progress snapshot is required",
            Self::Progress(ProgressError::InvalidSnapshot(_)) => "Progress snapshot is inconsistent",
            Self::Progress(ProgressError::Unavailable { .. }) => "Progress store unavailable",
            Self::Progress(_) => "Invalid progress request",
            Self::InvalidBody(_) => "Invalid request body",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.public_message().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuestionId, SnapshotError};

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::from(CatalogError::QuestionNotFound(QuestionId::new("Q9"))).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ProgressError::MissingIdentity).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ProgressError::InvalidSnapshot(
                SnapshotError::ScoreExceedsAnswered {
                    score: 2,
                    answered: 1
                }
            ))
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ProgressError::Unavailable {
                operation: "save_progress",
                reason: "disk full".into(),
            })
            .status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn store_details_are_not_exposed() {
        let err = ApiError::from(ProgressError::Unavailable {
            operation: "save_progress",
            reason: "/var/lib/quiz.sqlite3: disk full".into(),
        });
        assert_eq!(err.public_message(), "Progress store unavailable");
    }
}
