use std::collections::HashMap;
use std::path::Path;

use crate::error::SqlRowMapError;

use super::{parse_json_entries, read_json_entries};

/// Resolves reusable SQL statements by key.
pub trait SqlMapRegistry: Send + Sync {
    /// Look up the SQL text registered under `key`.
    ///
    /// # Errors
    /// Returns [`SqlRowMapError::ConfigError`] when the key is unknown.
    fn resolve(&self, key: &str) -> Result<String, SqlRowMapError>;
}

/// In-memory SQL map, usually loaded once at startup.
///
/// ```rust
/// use sql_rowmap::prelude::*;
///
/// let map = SqlMap::from_json_str(r#"{"selectAllArticle": "select * from article"}"#)?;
/// assert_eq!(map.resolve("selectAllArticle")?, "select * from article");
/// assert!(map.resolve("doesNotExist").is_err());
/// # Ok::<(), SqlRowMapError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct SqlMap {
    entries: HashMap<String, String>,
}

impl SqlMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `sql` under `key`, replacing any previous entry.
    pub fn insert(&mut self, key: impl Into<String>, sql: impl Into<String>) -> &mut Self {
        self.entries.insert(key.into(), sql.into());
        self
    }

    /// Build a map from a JSON object of `key -> sql text`.
    ///
    /// # Errors
    /// Returns [`SqlRowMapError::ConfigError`] if the document is not such an object.
    pub fn from_json_str(text: &str) -> Result<Self, SqlRowMapError> {
        Ok(Self {
            entries: parse_json_entries(text)?,
        })
    }

    /// Build a map from a JSON file.
    ///
    /// # Errors
    /// Returns [`SqlRowMapError::ConfigError`] if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SqlRowMapError> {
        Ok(Self {
            entries: read_json_entries(path.as_ref())?,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SqlMapRegistry for SqlMap {
    fn resolve(&self, key: &str) -> Result<String, SqlRowMapError> {
        self.entries.get(key).cloned().ok_or_else(|| {
            tracing::debug!(key, "sql map miss");
            SqlRowMapError::ConfigError(format!("no SQL registered under key {key:?}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_registered_key() {
        let mut map = SqlMap::new();
        map.insert("selectAllArticle", "select * from article where id in (?1, ?2)");
        assert_eq!(map.len(), 1);
        assert!(map.resolve("selectAllArticle").unwrap().starts_with("select"));
    }

    #[test]
    fn unknown_key_is_config_error() {
        let map = SqlMap::new();
        assert!(matches!(
            map.resolve("doesNotExist"),
            Err(SqlRowMapError::ConfigError(_))
        ));
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(matches!(
            SqlMap::from_json_str("[1, 2]"),
            Err(SqlRowMapError::ConfigError(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sqlmap.json");
        std::fs::write(&path, r#"{"countArticles": "select count(*) as n from article"}"#).unwrap();
        let map = SqlMap::from_json_file(&path).unwrap();
        assert_eq!(map.resolve("countArticles").unwrap(), "select count(*) as n from article");
        assert!(SqlMap::from_json_file(dir.path().join("missing.json")).is_err());
    }
}
