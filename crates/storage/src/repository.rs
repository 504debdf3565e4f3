use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{Identity, SessionSnapshot};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── PROGRESS STORE ─────────────────────────────────────────────────────────────
//

/// Persisted shape of one user's saved progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub identity: Identity,
    pub source_tag: Option<String>,
    pub snapshot: SessionSnapshot,
    pub saved_at: DateTime<Utc>,
}

/// Record store keyed by normalized identity, one snapshot per user.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the saved progress for an identity.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures. A missing record is `Ok(None)`.
    async fn get_progress(&self, identity: &Identity)
    -> Result<Option<ProgressRecord>, StorageError>;

    /// Insert or replace the record for `record.identity`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn put_progress(&self, record: &ProgressRecord) -> Result<(), StorageError>;

    /// Delete the record; returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_progress(&self, identity: &Identity) -> Result<bool, StorageError>;
}

//
// ─── LOCAL CACHE ────────────────────────────────────────────────────────────────
//

/// The fixed entries a client keeps between visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Snapshot,
    Identity,
    SourceTag,
}

impl CacheKey {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            CacheKey::Snapshot => "quiz_progress",
            CacheKey::Identity => "quiz_user_email",
            CacheKey::SourceTag => "quiz_source_tag",
        }
    }
}

/// Device-local string store.
#[async_trait]
pub trait LocalCacheRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_entry(&self, key: CacheKey) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn put_entry(&self, key: CacheKey, value: &str) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures. Removing a missing entry is not an error.
    async fn remove_entry(&self, key: CacheKey) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY ──────────────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<HashMap<Identity, ProgressRecord>>>,
    cache: Arc<Mutex<HashMap<CacheKey, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        identity: &Identity,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(identity).cloned())
    }

    async fn put_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(record.identity.clone(), record.clone());
        Ok(())
    }

    async fn delete_progress(&self, identity: &Identity) -> Result<bool, StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.remove(identity).is_some())
    }
}

#[async_trait]
impl LocalCacheRepository for InMemoryRepository {
    async fn get_entry(&self, key: CacheKey) -> Result<Option<String>, StorageError> {
        let guard = self
            .cache
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&key).cloned())
    }

    async fn put_entry(&self, key: CacheKey, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .cache
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key, value.to_string());
        Ok(())
    }

    async fn remove_entry(&self, key: CacheKey) -> Result<(), StorageError> {
        let mut guard = self
            .cache
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&key);
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub local_cache: Arc<dyn LocalCacheRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let local_cache: Arc<dyn LocalCacheRepository> = Arc::new(repo);
        Self {
            progress,
            local_cache,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionId;
    use quiz_core::time::fixed_now;

    fn record(email: &str, answered: u32) -> ProgressRecord {
        ProgressRecord {
            identity: Identity::parse(email).unwrap(),
            source_tag: None,
            snapshot: SessionSnapshot {
                question_order: vec![QuestionId::new("Q1"), QuestionId::new("Q2")],
                answered,
                ..SessionSnapshot::default()
            },
            saved_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn put_replaces_previous_record() {
        let repo = InMemoryRepository::new();
        repo.put_progress(&record("a@x.io", 0)).await.unwrap();
        repo.put_progress(&record("A@X.io", 1)).await.unwrap();

        let fetched = repo
            .get_progress(&Identity::parse("a@x.io").unwrap())
            .await
            .unwrap()
            .expect("record");
        assert_eq!(fetched.snapshot.answered, 1);
    }

    #[tokio::test]
    async fn delete_reports_whether_record_existed() {
        let repo = InMemoryRepository::new();
        let identity = Identity::parse("a@x.io").unwrap();
        assert!(!repo.delete_progress(&identity).await.unwrap());
        repo.put_progress(&record("a@x.io", 0)).await.unwrap();
        assert!(repo.delete_progress(&identity).await.unwrap());
        assert!(repo.get_progress(&identity).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cache_entries_are_independent() {
        let repo = InMemoryRepository::new();
        repo.put_entry(CacheKey::Identity, "a@x.io").await.unwrap();
        repo.put_entry(CacheKey::SourceTag, "newsletter").await.unwrap();
        repo.remove_entry(CacheKey::Identity).await.unwrap();

        assert_eq!(repo.get_entry(CacheKey::Identity).await.unwrap(), None);
        assert_eq!(
            repo.get_entry(CacheKey::SourceTag).await.unwrap().as_deref(),
            Some("newsletter")
        );
    }
}
