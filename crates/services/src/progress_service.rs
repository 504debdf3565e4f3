use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::api::SaveProgressRequest;
use quiz_core::model::{Identity, SessionSnapshot};
use storage::repository::{ProgressRecord, ProgressRepository};
use tracing::{debug, error};

use crate::Clock;
use crate::error::ProgressError;
use crate::remote::ProgressRemote;

/// Server-side progress persistence: validation in front of the store.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    repo: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn ProgressRepository>) -> Self {
        Self { clock, repo }
    }

    /// Parse an optional raw identity from a request body or path.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::MissingIdentity` when absent or blank.
    pub fn require_identity(raw: Option<&str>) -> Result<Identity, ProgressError> {
        let raw = raw
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ProgressError::MissingIdentity)?;
        Ok(Identity::parse(raw)?)
    }

    /// Validate and upsert a save request. Nothing is written when validation fails.
    ///
    /// # Errors
    ///
    /// Returns a validation variant of `ProgressError` for bad input, or
    /// `ProgressError::Unavailable` if the store write fails.
    pub async fn save_request(&self, request: SaveProgressRequest) -> Result<(), ProgressError> {
        let identity = Self::require_identity(request.identity.as_deref())?;
        let snapshot = request.snapshot.ok_or(ProgressError::MissingSnapshot)?;
        self.save(&identity, request.source_tag.as_deref(), snapshot)
            .await
    }

    /// # Errors
    ///
    /// Returns `ProgressError::InvalidSnapshot` if the counters are
    /// inconsistent, or `ProgressError::Unavailable` on store failure.
    pub async fn save(
        &self,
        identity: &Identity,
        source_tag: Option<&str>,
        snapshot: SessionSnapshot,
    ) -> Result<(), ProgressError> {
        snapshot.check_consistency()?;
        let source_tag = source_tag
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string);
        let answered = snapshot.answered;
        let record = ProgressRecord {
            identity: identity.clone(),
            source_tag,
            snapshot,
            saved_at: self.clock.now(),
        };
        self.repo.put_progress(&record).await.map_err(|err| {
            error!(operation = "save_progress", error = %err, "progress store call failed");
            ProgressError::unavailable("save_progress", &err)
        })?;
        debug!(answered, "progress saved");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Unavailable` on store failure.
    pub async fn load(&self, identity: &Identity) -> Result<Option<SessionSnapshot>, ProgressError> {
        let record = self.repo.get_progress(identity).await.map_err(|err| {
            error!(operation = "load_progress", error = %err, "progress store call failed");
            ProgressError::unavailable("load_progress", &err)
        })?;
        Ok(record.map(|record| record.snapshot))
    }

    /// Delete saved progress; succeeds even when nothing was stored.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Unavailable` on store failure.
    pub async fn reset(&self, identity: &Identity) -> Result<(), ProgressError> {
        let existed = self.repo.delete_progress(identity).await.map_err(|err| {
            error!(operation = "reset_progress", error = %err, "progress store call failed");
            ProgressError::unavailable("reset_progress", &err)
        })?;
        debug!(existed, "progress reset");
        Ok(())
    }
}

#[async_trait]
impl ProgressRemote for ProgressService {
    async fn load(&self, identity: &Identity) -> Result<Option<SessionSnapshot>, ProgressError> {
        ProgressService::load(self, identity).await
    }

    async fn save(
        &self,
        identity: &Identity,
        source_tag: Option<&str>,
        snapshot: &SessionSnapshot,
    ) -> Result<(), ProgressError> {
        ProgressService::save(self, identity, source_tag, snapshot.clone()).await
    }

    async fn reset(&self, identity: &Identity) -> Result<(), ProgressError> {
        ProgressService::reset(self, identity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionId;
    use quiz_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, StorageError};

    fn service(repo: InMemoryRepository) -> ProgressService {
        ProgressService::new(Clock::fixed(fixed_now()), Arc::new(repo))
    }

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            question_order: vec![QuestionId::new("Q1"), QuestionId::new("Q2")],
            ..SessionSnapshot::default()
        }
    }

    #[tokio::test]
    async fn save_request_requires_identity_and_snapshot() {
        let repo = InMemoryRepository::new();
        let svc = service(repo.clone());

        let err = svc
            .save_request(SaveProgressRequest {
                identity: Some("   ".into()),
                source_tag: None,
                snapshot: Some(snapshot()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::MissingIdentity));

        let err = svc
            .save_request(SaveProgressRequest {
                identity: Some("a@b.io".into()),
                source_tag: None,
                snapshot: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressError::MissingSnapshot));

        let identity = Identity::parse("a@b.io").unwrap();
        assert!(repo.get_progress(&identity).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_rejects_inconsistent_snapshot_before_writing() {
        let repo = InMemoryRepository::new();
        let svc = service(repo.clone());
        let identity = Identity::parse("a@b.io").unwrap();
        let bad = SessionSnapshot {
            score: 2,
            answered: 1,
            ..snapshot()
        };

        let err = svc.save(&identity, None, bad).await.unwrap_err();
        assert!(matches!(err, ProgressError::InvalidSnapshot(_)));
        assert!(repo.get_progress(&identity).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_normalizes_identity_and_stamps_time() {
        let repo = InMemoryRepository::new();
        let svc = service(repo.clone());

        svc.save_request(SaveProgressRequest {
            identity: Some("  Mixed@Case.IO ".into()),
            source_tag: Some(" podcast ".into()),
            snapshot: Some(snapshot()),
        })
        .await
        .unwrap();

        let record = repo
            .get_progress(&Identity::parse("mixed@case.io").unwrap())
            .await
            .unwrap()
            .expect("saved");
        assert_eq!(record.saved_at, fixed_now());
        assert_eq!(record.source_tag.as_deref(), Some("podcast"));
    }

    #[tokio::test]
    async fn reset_succeeds_when_nothing_saved() {
        let svc = service(InMemoryRepository::new());
        let identity = Identity::parse("nobody@x.io").unwrap();
        svc.reset(&identity).await.unwrap();
        assert!(svc.load(&identity).await.unwrap().is_none());
    }

    struct DownRepo;

    #[async_trait]
    impl ProgressRepository for DownRepo {
        async fn get_progress(
            &self,
            _identity: &Identity,
        ) -> Result<Option<ProgressRecord>, StorageError> {
            Err(StorageError::Connection("down".into()))
        }

        async fn put_progress(&self, _record: &ProgressRecord) -> Result<(), StorageError> {
            Err(StorageError::Connection("down".into()))
        }

        async fn delete_progress(&self, _identity: &Identity) -> Result<bool, StorageError> {
            Err(StorageError::Connection("down".into()))
        }
    }

    #[tokio::test]
    async fn store_failures_name_the_operation() {
        let svc = ProgressService::new(Clock::fixed(fixed_now()), Arc::new(DownRepo));
        let identity = Identity::parse("a@b.io").unwrap();

        let err = svc.load(&identity).await.unwrap_err();
        assert!(matches!(
            err,
            ProgressError::Unavailable { operation: "load_progress", .. }
        ));
        let err = svc.reset(&identity).await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
