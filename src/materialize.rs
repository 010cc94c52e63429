//! Mapping a [`ResultSet`] into structs or schema-less rows.
//!
//! Field coercion follows a quiet-skip policy: a value that cannot be assigned to its
//! field leaves the field at its default and is logged at `trace` level.

use crate::datefmt::DateLayout;
use crate::results::ResultSet;
use crate::schema::{Entity, Schema};
use crate::types::RowValues;

/// A single struct plus whether a row was found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SingleResult<T> {
    pub value: T,
    pub found: bool,
}

impl<T> SingleResult<T> {
    #[must_use]
    pub fn into_parts(self) -> (bool, T) {
        (self.found, self.value)
    }
}

/// Every row mapped onto `T`, in row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManyResult<T> {
    pub items: Vec<T>,
}

impl<T> ManyResult<T> {
    #[must_use]
    pub fn into_inner(self) -> Vec<T> {
        self.items
    }
}

/// Schema-less rows that keep the value types reported by the data source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub result: ResultSet,
}

impl QueryResult {
    #[must_use]
    pub fn rows(&self) -> &ResultSet {
        &self.result
    }

    #[must_use]
    pub fn into_inner(self) -> ResultSet {
        self.result
    }
}

impl std::ops::Index<usize> for QueryResult {
    type Output = crate::results::Row;

    fn index(&self, index: usize) -> &Self::Output {
        &self.result[index]
    }
}

/// Column index → field index for one result set.
fn column_plan<T>(schema: &Schema<T>, rs: &ResultSet) -> Vec<Option<usize>> {
    rs.columns()
        .iter()
        .map(|column| schema.field_index(column))
        .collect()
}

fn fill<T: Entity>(schema: &Schema<T>, plan: &[Option<usize>], values: &[RowValues]) -> T {
    let mut target = T::default();
    for (value, slot) in values.iter().zip(plan) {
        let Some(field) = slot.map(|idx| &schema.fields()[idx]) else {
            continue;
        };
        if let Err(e) = field.assign(&mut target, value) {
            tracing::trace!(field = field.name(), table = schema.table(), "skipping field: {e}");
        }
    }
    target
}

/// Map the first row onto `T`. Zero rows yields the default value with `found = false`;
/// rows after the first are ignored.
#[must_use]
pub fn materialize_single<T: Entity>(rs: &ResultSet) -> SingleResult<T> {
    let Some(first) = rs.rows().first() else {
        return SingleResult {
            value: T::default(),
            found: false,
        };
    };
    if rs.len() > 1 {
        tracing::debug!(rows = rs.len(), "single-struct result uses only the first row");
    }
    let schema = T::schema();
    let plan = column_plan(schema, rs);
    SingleResult {
        value: fill(schema, &plan, first.values()),
        found: true,
    }
}

/// Map every row onto `T`.
#[must_use]
pub fn materialize_many<T: Entity>(rs: &ResultSet) -> ManyResult<T> {
    let schema = T::schema();
    let plan = column_plan(schema, rs);
    ManyResult {
        items: rs
            .iter()
            .map(|row| fill(schema, &plan, row.values()))
            .collect(),
    }
}

/// Keep rows schema-less. With a layout, every timestamp value becomes text in that layout.
#[must_use]
pub fn materialize_generic(rs: ResultSet, date_layout: Option<&DateLayout>) -> QueryResult {
    let Some(layout) = date_layout else {
        return QueryResult { result: rs };
    };
    let result = rs.map_values(|value| match value {
        RowValues::Timestamp(ts) => RowValues::Text(layout.format(&ts)),
        other => other,
    });
    QueryResult { result }
}
