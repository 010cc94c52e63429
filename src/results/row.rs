use std::collections::HashMap;
use std::sync::Arc;

use crate::types::RowValues;

/// A single row of a [`ResultSet`](super::ResultSet).
///
/// Column names and the name → index lookup are shared by every row of one result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub(crate) columns: Arc<Vec<String>>,
    pub(crate) values: Vec<RowValues>,
    pub(crate) index: Arc<HashMap<String, usize>>,
}

impl Row {
    /// Column names in result order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in column order.
    #[must_use]
    pub fn values(&self) -> &[RowValues] {
        &self.values
    }

    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.index.get(column_name).copied()
    }

    /// Get a value from the row by exact column name.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value by column name, ignoring ASCII case.
    #[must_use]
    pub fn get_ignore_case(&self, column_name: &str) -> Option<&RowValues> {
        self.get(column_name).or_else(|| {
            self.columns
                .iter()
                .position(|col| col.eq_ignore_ascii_case(column_name))
                .and_then(|idx| self.values.get(idx))
        })
    }

    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.values.get(index)
    }

    /// Iterate `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::ops::Index<&str> for Row {
    type Output = RowValues;

    /// # Panics
    /// Panics if the column does not exist.
    fn index(&self, column_name: &str) -> &RowValues {
        match self.get(column_name) {
            Some(value) => value,
            None => panic!("no column named {column_name:?}"),
        }
    }
}
