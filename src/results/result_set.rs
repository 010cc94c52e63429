use std::collections::HashMap;
use std::sync::Arc;

use crate::types::RowValues;

use super::row::Row;

/// Rows returned by a query, with a shared ordered column list.
///
/// Column order is the order reported by the data source and is preserved through
/// materialization and encoding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Arc<Vec<String>>,
    index: Arc<HashMap<String, usize>>,
    rows: Vec<Row>,
}

impl ResultSet {
    /// Create an empty result set for the given columns.
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self::with_capacity(columns, 0)
    }

    /// Create an empty result set with room for `capacity` rows.
    #[must_use]
    pub fn with_capacity(columns: Vec<String>, capacity: usize) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            columns: Arc::new(columns),
            index: Arc::new(index),
            rows: Vec::with_capacity(capacity),
        }
    }

    /// Append a row. Missing trailing values are filled with NULL and extras are dropped,
    /// so every row matches the column list.
    pub fn add_row_values(&mut self, mut values: Vec<RowValues>) {
        values.resize(self.columns.len(), RowValues::Null);
        self.rows.push(Row {
            columns: Arc::clone(&self.columns),
            values,
            index: Arc::clone(&self.index),
        });
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Rewrite every value in place, keeping column order.
    pub(crate) fn map_values(mut self, mut f: impl FnMut(RowValues) -> RowValues) -> Self {
        for row in &mut self.rows {
            for value in &mut row.values {
                let taken = std::mem::replace(value, RowValues::Null);
                *value = f(taken);
            }
        }
        self
    }
}

impl std::ops::Index<usize> for ResultSet {
    type Output = Row;

    fn index(&self, index: usize) -> &Row {
        &self.rows[index]
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
