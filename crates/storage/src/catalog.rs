//! Question bank loading. The bank is read once at startup and never mutated.

use std::collections::HashSet;
use std::path::Path;

use quiz_core::model::{CatalogEntry, OptionKey, QuestionId};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogLoadError {
    #[error("failed to read question bank: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse question bank: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate question id: {0}")]
    DuplicateId(QuestionId),

    #[error("question {id} is missing option {key}")]
    MissingOption { id: QuestionId, key: OptionKey },
}

/// Read a JSON array of catalog entries from disk.
///
/// # Errors
///
/// Returns `CatalogLoadError` if the file cannot be read or fails validation.
pub fn load_catalog_file(path: &Path) -> Result<Vec<CatalogEntry>, CatalogLoadError> {
    let raw = std::fs::read_to_string(path)?;
    parse_catalog(&raw)
}

/// Parse and validate a question bank, preserving file order.
///
/// # Errors
///
/// Returns `CatalogLoadError::DuplicateId` or `CatalogLoadError::MissingOption`
/// for malformed banks.
pub fn parse_catalog(raw: &str) -> Result<Vec<CatalogEntry>, CatalogLoadError> {
    let entries: Vec<CatalogEntry> = serde_json::from_str(raw)?;
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in &entries {
        if !seen.insert(&entry.id) {
            return Err(CatalogLoadError::DuplicateId(entry.id.clone()));
        }
        if let Some(key) = OptionKey::ALL
            .into_iter()
            .find(|key| !entry.options.contains_key(key))
        {
            return Err(CatalogLoadError::MissingOption {
                id: entry.id.clone(),
                key,
            });
        }
    }
    Ok(entries)
}
