//! Seams between the client-side quiz loop and whatever serves it.
//!
//! The desktop client talks HTTP (`HttpQuizBackend`); tests and embedded
//! setups plug the server-side services in directly.

use async_trait::async_trait;
use quiz_core::model::{AnswerCheck, Identity, OptionKey, Question, QuestionId, SessionSnapshot};

use crate::error::{BackendError, ProgressError};

/// Question listing and answer checking.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    /// # Errors
    ///
    /// Returns `BackendError` if the catalog cannot be fetched.
    async fn list_questions(&self) -> Result<Vec<Question>, BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError::Catalog` for an unknown question id, or a
    /// transport error.
    async fn check_answer(
        &self,
        question_id: &QuestionId,
        answer: OptionKey,
    ) -> Result<AnswerCheck, BackendError>;
}

/// Remote progress store addressed by identity.
#[async_trait]
pub trait ProgressRemote: Send + Sync {
    /// `Ok(None)` means the identity has no saved progress.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` when the store cannot be reached.
    async fn load(&self, identity: &Identity) -> Result<Option<SessionSnapshot>, ProgressError>;

    /// Idempotent upsert.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` when the snapshot is rejected or the store is unavailable.
    async fn save(
        &self,
        identity: &Identity,
        source_tag: Option<&str>,
        snapshot: &SessionSnapshot,
    ) -> Result<(), ProgressError>;

    /// Succeeds whether or not a record existed.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` when the store is unavailable.
    async fn reset(&self, identity: &Identity) -> Result<(), ProgressError>;
}
