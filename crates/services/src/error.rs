//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{IdentityError, QuestionId, SnapshotError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("question not found: {0}")]
    QuestionNotFound(QuestionId),
}

/// Errors emitted while saving, loading or resetting progress.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("identity is required")]
    MissingIdentity,
    #[error("snapshot is required")]
    MissingSnapshot,
    #[error(transparent)]
    InvalidIdentity(#[from] IdentityError),
    #[error(transparent)]
    InvalidSnapshot(#[from] SnapshotError),
    #[error("progress rejected: {0}")]
    Rejected(String),
    #[error("progress store unavailable during {operation}: {reason}")]
    Unavailable {
        operation: &'static str,
        reason: String,
    },
}

impl ProgressError {
    pub(crate) fn unavailable(operation: &'static str, err: &StorageError) -> Self {
        Self::Unavailable {
            operation,
            reason: err.to_string(),
        }
    }

    /// True for failures of the store itself rather than of the request.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Errors emitted by `QuizBackend` implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("invalid server url: {0}")]
    InvalidUrl(String),
    #[error("quiz server returned status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by the quiz session and its loop service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz already completed")]
    Completed,
    #[error("question already answered")]
    AlreadyAnswered,
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Errors emitted while bootstrapping client services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}
