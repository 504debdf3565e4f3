use std::sync::Arc;

use quiz_core::model::{Identity, SessionSnapshot};
use storage::repository::{CacheKey, LocalCacheRepository, StorageError};
use tracing::{debug, warn};

use crate::error::ProgressError;
use crate::remote::ProgressRemote;

/// Outcome of the remote half of a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSave {
    /// No identity bound; nothing sent.
    Skipped,
    Saved,
    Failed(String),
}

/// What a save managed to write. A failed half is a soft warning only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub local_saved: bool,
    pub remote: RemoteSave,
}

impl SaveReport {
    #[must_use]
    pub fn has_warning(&self) -> bool {
        !self.local_saved || matches!(self.remote, RemoteSave::Failed(_))
    }
}

/// Writes snapshots to the device cache and, for a bound identity, to the
/// remote store. Also remembers the last identity and the attribution tag.
#[derive(Clone)]
pub struct ProgressBridge {
    local: Arc<dyn LocalCacheRepository>,
    remote: Arc<dyn ProgressRemote>,
}

impl ProgressBridge {
    #[must_use]
    pub fn new(local: Arc<dyn LocalCacheRepository>, remote: Arc<dyn ProgressRemote>) -> Self {
        Self { local, remote }
    }

    /// Always writes locally; writes remotely only when `identity` is set.
    pub async fn save(&self, identity: Option<&Identity>, snapshot: &SessionSnapshot) -> SaveReport {
        let local_saved = self.save_local(snapshot).await;
        let remote = match identity {
            None => RemoteSave::Skipped,
            Some(identity) => {
                let source_tag = self.source_tag().await;
                match self
                    .remote
                    .save(identity, source_tag.as_deref(), snapshot)
                    .await
                {
                    Ok(()) => RemoteSave::Saved,
                    Err(err) => {
                        warn!(operation = "save_progress", error = %err, "remote save failed");
                        RemoteSave::Failed(err.to_string())
                    }
                }
            }
        };
        SaveReport {
            local_saved,
            remote,
        }
    }

    pub async fn save_local(&self, snapshot: &SessionSnapshot) -> bool {
        let json = match serde_json::to_string(snapshot) {
            Ok(json) => json,
            Err(err) => {
                warn!(operation = "save_local", error = %err, "snapshot encode failed");
                return false;
            }
        };
        self.put(CacheKey::Snapshot, &json).await
    }

    /// Cached snapshot, if any. An entry that no longer decodes is ignored.
    pub async fn load_local(&self) -> Option<SessionSnapshot> {
        let raw = self.get(CacheKey::Snapshot).await?;
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(operation = "load_local", error = %err, "ignoring undecodable cached snapshot");
                None
            }
        }
    }

    pub async fn clear_local(&self) -> bool {
        self.remove(CacheKey::Snapshot).await
    }

    /// # Errors
    ///
    /// Returns `ProgressError` when the remote store cannot be reached.
    pub async fn load_remote(
        &self,
        identity: &Identity,
    ) -> Result<Option<SessionSnapshot>, ProgressError> {
        self.remote.load(identity).await
    }

    /// # Errors
    ///
    /// Returns `ProgressError` when the remote store cannot be reached.
    pub async fn delete_remote(&self, identity: &Identity) -> Result<(), ProgressError> {
        self.remote.reset(identity).await
    }

    /// Delete remote progress, then the local cache. A remote failure leaves
    /// the local cache untouched.
    ///
    /// # Errors
    ///
    /// Returns the remote `ProgressError`.
    pub async fn reset(&self, identity: Option<&Identity>) -> Result<(), ProgressError> {
        if let Some(identity) = identity {
            self.remote.reset(identity).await.map_err(|err| {
                warn!(operation = "reset_progress", error = %err, "remote reset failed");
                err
            })?;
        }
        self.clear_local().await;
        Ok(())
    }

    pub async fn remember_identity(&self, identity: &Identity) -> bool {
        self.put(CacheKey::Identity, identity.as_str()).await
    }

    pub async fn stored_identity(&self) -> Option<Identity> {
        let raw = self.get(CacheKey::Identity).await?;
        Identity::parse(&raw)
            .map_err(|err| debug!(error = %err, "ignoring stored identity"))
            .ok()
    }

    pub async fn forget_identity(&self) -> bool {
        self.remove(CacheKey::Identity).await
    }

    /// Persist a non-empty inbound tag; otherwise keep the stored one.
    /// Returns the tag now in effect.
    pub async fn capture_source_tag(&self, inbound: Option<&str>) -> Option<String> {
        match inbound.map(str::trim).filter(|tag| !tag.is_empty()) {
            Some(tag) => {
                self.put(CacheKey::SourceTag, tag).await;
                Some(tag.to_string())
            }
            None => self.source_tag().await,
        }
    }

    pub async fn source_tag(&self) -> Option<String> {
        self.get(CacheKey::SourceTag).await
    }

    async fn get(&self, key: CacheKey) -> Option<String> {
        self.local
            .get_entry(key)
            .await
            .unwrap_or_else(|err| {
                log_cache_failure("get", key, &err);
                None
            })
    }

    async fn put(&self, key: CacheKey, value: &str) -> bool {
        self.local
            .put_entry(key, value)
            .await
            .map_err(|err| log_cache_failure("put", key, &err))
            .is_ok()
    }

    async fn remove(&self, key: CacheKey) -> bool {
        self.local
            .remove_entry(key)
            .await
            .map_err(|err| log_cache_failure("remove", key, &err))
            .is_ok()
    }
}

fn log_cache_failure(operation: &'static str, key: CacheKey, err: &StorageError) {
    warn!(operation, key = key.name(), error = %err, "local cache call failed");
}
