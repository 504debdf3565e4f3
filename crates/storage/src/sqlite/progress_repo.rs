use async_trait::async_trait;
use quiz_core::model::Identity;

use crate::repository::{ProgressRecord, ProgressRepository, StorageError};

use super::SqliteRepository;
use super::mapping::{map_progress_row, snapshot_to_json};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(
        &self,
        identity: &Identity,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT identity, source_tag, snapshot, saved_at
            FROM progress
            WHERE identity = ?1
            ",
        )
        .bind(identity.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn put_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let snapshot = snapshot_to_json(&record.snapshot)?;
        sqlx::query(
            r"
            INSERT INTO progress (identity, source_tag, snapshot, saved_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(identity) DO UPDATE SET
                source_tag = excluded.source_tag,
                snapshot = excluded.snapshot,
                saved_at = excluded.saved_at
            ",
        )
        .bind(record.identity.as_str())
        .bind(record.source_tag.as_deref())
        .bind(snapshot)
        .bind(record.saved_at)
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn delete_progress(&self, identity: &Identity) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM progress WHERE identity = ?1")
            .bind(identity.as_str())
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(result.rows_affected() > 0)
    }
}
