use async_trait::async_trait;
use sqlx::Row;

use crate::repository::{CacheKey, LocalCacheRepository, StorageError};

use super::SqliteRepository;

#[async_trait]
impl LocalCacheRepository for SqliteRepository {
    async fn get_entry(&self, key: CacheKey) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM local_cache WHERE key = ?1")
            .bind(key.name())
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        row.try_get("value")
            .map(Some)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    async fn put_entry(&self, key: CacheKey, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO local_cache (key, value)
            VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            ",
        )
        .bind(key.name())
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }

    async fn remove_entry(&self, key: CacheKey) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM local_cache WHERE key = ?1")
            .bind(key.name())
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}
