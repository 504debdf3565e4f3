use std::sync::Arc;

use storage::repository::{LocalCacheRepository, Storage};

use crate::bridge::ProgressBridge;
use crate::error::AppServicesError;
use crate::http_backend::{HttpBackendConfig, HttpQuizBackend};
use crate::sessions::QuizLoopService;

/// Assembles the client-side services: device cache, server client and the
/// quiz loop that ties them together.
#[derive(Clone)]
pub struct ClientServices {
    backend: Arc<HttpQuizBackend>,
    quiz_loop: Arc<QuizLoopService>,
}

impl ClientServices {
    /// Build services with a `SQLite` local cache and an HTTP backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the cache database cannot be opened or
    /// the server URL is invalid.
    pub async fn new_sqlite(
        cache_db_url: &str,
        backend: &HttpBackendConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(cache_db_url).await?;
        let backend = Arc::new(HttpQuizBackend::new(backend)?);
        Ok(Self::with_local_cache(storage.local_cache, backend))
    }

    #[must_use]
    pub fn with_local_cache(
        local_cache: Arc<dyn LocalCacheRepository>,
        backend: Arc<HttpQuizBackend>,
    ) -> Self {
        let bridge = ProgressBridge::new(local_cache, backend.clone());
        let quiz_loop = Arc::new(QuizLoopService::new(backend.clone(), bridge));
        Self { backend, quiz_loop }
    }

    #[must_use]
    pub fn backend(&self) -> Arc<HttpQuizBackend> {
        Arc::clone(&self.backend)
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }
}
