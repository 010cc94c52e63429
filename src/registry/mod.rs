//! Lookup services for SQL that lives outside the calling code: keyed SQL maps and
//! conditional SQL templates.

mod sqlmap;
mod template;

pub use sqlmap::{SqlMap, SqlMapRegistry};
pub use template::{SqlTemplateRegistry, SqlTemplates};

use std::collections::HashMap;
use std::path::Path;

use crate::error::SqlRowMapError;

/// Read a JSON object of `key -> sql text` from disk.
fn read_json_entries(path: &Path) -> Result<HashMap<String, String>, SqlRowMapError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        SqlRowMapError::ConfigError(format!("failed to read {}: {e}", path.display()))
    })?;
    parse_json_entries(&text)
}

fn parse_json_entries(text: &str) -> Result<HashMap<String, String>, SqlRowMapError> {
    serde_json::from_str(text)
        .map_err(|e| SqlRowMapError::ConfigError(format!("invalid SQL registry document: {e}")))
}
