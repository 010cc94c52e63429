use rusqlite::types::Value;
use rusqlite::{Statement, ToSql};

use crate::error::SqlRowMapError;
use crate::results::ResultSet;
use crate::types::{RowValues, parse_timestamp};

/// Runtime type hint taken from a column's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Native,
    Bool,
    Timestamp,
}

impl ColumnKind {
    fn from_decl(decl: Option<&str>) -> Self {
        let Some(decl) = decl.map(str::to_ascii_uppercase) else {
            return ColumnKind::Native;
        };
        if decl.contains("BOOL") {
            ColumnKind::Bool
        } else if decl.contains("DATE") || decl.contains("TIME") {
            ColumnKind::Timestamp
        } else {
            ColumnKind::Native
        }
    }
}

/// Extract a `RowValues` from a `SQLite` row.
fn extract_value(
    row: &rusqlite::Row,
    idx: usize,
    kind: ColumnKind,
) -> Result<RowValues, SqlRowMapError> {
    let value: Value = row.get(idx)?;
    Ok(match (value, kind) {
        (Value::Null, _) => RowValues::Null,
        (Value::Integer(i), ColumnKind::Bool) => RowValues::Bool(i != 0),
        (Value::Integer(i), _) => RowValues::Int(i),
        (Value::Real(f), _) => RowValues::Float(f),
        (Value::Text(s), ColumnKind::Timestamp) => match parse_timestamp(&s) {
            Some(ts) => RowValues::Timestamp(ts),
            None => RowValues::Text(s),
        },
        (Value::Text(s), _) => RowValues::Text(s),
        (Value::Blob(b), _) => RowValues::Text(String::from_utf8_lossy(&b).into_owned()),
    })
}

/// Build a result set from a prepared `SQLite` statement.
///
/// # Errors
/// Returns `SqlRowMapError::ExecutionError` if query execution or row extraction fails.
pub fn build_result_set(
    stmt: &mut Statement,
    params: &[Value],
) -> Result<ResultSet, SqlRowMapError> {
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|v| v as &dyn ToSql).collect();
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let kinds: Vec<ColumnKind> = stmt
        .columns()
        .iter()
        .map(|c| ColumnKind::from_decl(c.decl_type()))
        .collect();

    let mut result_set = ResultSet::with_capacity(column_names, 10);
    let mut rows_iter = stmt.query(&param_refs[..])?;
    while let Some(row) = rows_iter.next()? {
        let mut row_values = Vec::with_capacity(kinds.len());
        for (idx, kind) in kinds.iter().enumerate() {
            row_values.push(extract_value(row, idx, *kind)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}
