use quiz_core::model::{Identity, SessionSnapshot};
use sqlx::Row;

use crate::repository::{ProgressRecord, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn snapshot_to_json(snapshot: &SessionSnapshot) -> Result<String, StorageError> {
    serde_json::to_string(snapshot).map_err(ser)
}

pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ProgressRecord, StorageError> {
    let identity_raw: String = row.try_get("identity").map_err(ser)?;
    let identity = Identity::parse(&identity_raw).map_err(ser)?;

    let snapshot_raw: String = row.try_get("snapshot").map_err(ser)?;
    let snapshot: SessionSnapshot = serde_json::from_str(&snapshot_raw).map_err(ser)?;

    Ok(ProgressRecord {
        identity,
        source_tag: row.try_get("source_tag").map_err(ser)?,
        snapshot,
        saved_at: row.try_get("saved_at").map_err(ser)?,
    })
}
