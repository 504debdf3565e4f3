use std::path::{Path, PathBuf};

use super::SqliteInitError;

/// Turn `sqlite:foo.db`, `foo.db` or a relative path into an absolute
/// `sqlite://` URL. In-memory URLs and absolute `sqlite://` URLs pass through.
#[must_use]
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Make sure the database file and its parent directory exist so that
/// `sqlx` can open it.
///
/// # Errors
///
/// Returns `SqliteInitError::InvalidUrl` for URLs without a file path and
/// `SqliteInitError::Io` when the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), SqliteInitError> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| SqliteInitError::InvalidUrl(db_url.to_string()))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(SqliteInitError::InvalidUrl(db_url.to_string()));
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_and_absolute_urls_pass_through() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/quiz.db"),
            "sqlite:///tmp/quiz.db"
        );
    }

    #[test]
    fn absolute_paths_gain_scheme() {
        assert_eq!(normalize_sqlite_url("/var/quiz.db"), "sqlite:///var/quiz.db");
        assert_eq!(
            normalize_sqlite_url("sqlite:/var/quiz.db"),
            "sqlite:///var/quiz.db"
        );
    }

    #[test]
    fn prepare_rejects_urls_without_path() {
        assert!(matches!(
            prepare_sqlite_file("postgres://db"),
            Err(SqliteInitError::InvalidUrl(_))
        ));
        assert!(prepare_sqlite_file("sqlite::memory:").is_ok());
    }
}
