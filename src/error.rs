//! Error types for catalog access

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Store unreachable, query failed, timed out or the worker died.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// Configured table name is not a plain SQL identifier
    #[error("invalid table name '{0}'")]
    InvalidTableName(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl CatalogError {
    /// Collapse any failure into the user-facing `DataUnavailable` form.
    pub fn into_unavailable(self) -> Self {
        match self {
            CatalogError::DataUnavailable(_) => self,
            other => CatalogError::DataUnavailable(other.to_string()),
        }
    }

    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, CatalogError::DataUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_error_becomes_unavailable() {
        let sqlite_err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(1),
            Some("no such table: tmdb_shows_clean".to_string()),
        );
        let err = CatalogError::from(sqlite_err).into_unavailable();

        assert!(err.is_data_unavailable());
        assert!(err.to_string().contains("no such table"));
    }

    #[test]
    fn test_unavailable_is_kept_verbatim() {
        let err = CatalogError::DataUnavailable("timed out after 15s".to_string()).into_unavailable();
        assert_eq!(err.to_string(), "data unavailable: timed out after 15s");
    }
}
