//! Registration-time descriptors that map columns onto struct fields.
//!
//! A [`Schema`] is built once per type (see [`entity!`](crate::entity)) and cached, so
//! materializing rows never inspects types at runtime.

mod convert;
mod macros;

pub use convert::{CoercionError, FromRowValue, ToRowValue};

use std::collections::HashMap;

use crate::datefmt::DateLayout;
use crate::error::SqlRowMapError;
use crate::types::RowValues;

/// A struct that rows can be materialized into.
pub trait Entity: Default + Send + 'static {
    fn schema() -> &'static Schema<Self>;
}

type Setter<T> = fn(&mut T, &RowValues) -> Result<(), CoercionError>;
type Getter<T> = fn(&T) -> RowValues;

/// One mapped field.
pub struct Field<T> {
    name: &'static str,
    set: Setter<T>,
    get: Getter<T>,
    date_layout: Option<DateLayout>,
}

impl<T> Field<T> {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn assign(&self, target: &mut T, value: &RowValues) -> Result<(), CoercionError> {
        (self.set)(target, value)
    }

    /// The field's value as it should be encoded: timestamps are rendered with the
    /// field's own layout when it has one.
    pub(crate) fn encoded_value(&self, source: &T) -> RowValues {
        match ((self.get)(source), &self.date_layout) {
            (RowValues::Timestamp(ts), Some(layout)) => RowValues::Text(layout.format(&ts)),
            (value, _) => value,
        }
    }
}

impl<T> std::fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("date_layout", &self.date_layout)
            .finish_non_exhaustive()
    }
}

/// Table, element, and field metadata for an [`Entity`].
#[derive(Debug)]
pub struct Schema<T> {
    table: String,
    element: String,
    primary_key: Option<&'static str>,
    fields: Vec<Field<T>>,
    by_lower_name: HashMap<String, usize>,
}

impl<T> Schema<T> {
    /// Start describing a type stored in `table`.
    #[must_use]
    pub fn builder(table: impl Into<String>) -> SchemaBuilder<T> {
        let table = table.into();
        SchemaBuilder {
            element: table.clone(),
            table,
            primary_key: None,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Element name used when encoding instances as XML.
    #[must_use]
    pub fn element(&self) -> &str {
        &self.element
    }

    #[must_use]
    pub fn primary_key(&self) -> Option<&'static str> {
        self.primary_key
    }

    #[must_use]
    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    /// Find a field by column name, ignoring ASCII case.
    #[must_use]
    pub fn field_index(&self, column: &str) -> Option<usize> {
        self.by_lower_name.get(&column.to_ascii_lowercase()).copied()
    }

    /// Field names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }
}

/// Builder for [`Schema`].
pub struct SchemaBuilder<T> {
    table: String,
    element: String,
    primary_key: Option<&'static str>,
    fields: Vec<Field<T>>,
}

impl<T> SchemaBuilder<T> {
    #[must_use]
    pub fn element(mut self, element: impl Into<String>) -> Self {
        self.element = element.into();
        self
    }

    #[must_use]
    pub fn primary_key(mut self, column: &'static str) -> Self {
        self.primary_key = Some(column);
        self
    }

    /// Map column `name` with the given accessors.
    #[must_use]
    pub fn field(mut self, name: &'static str, set: Setter<T>, get: Getter<T>) -> Self {
        self.fields.push(Field {
            name,
            set,
            get,
            date_layout: None,
        });
        self
    }

    /// Attach an encoding layout to the most recently added field.
    ///
    /// # Errors
    /// Returns [`SqlRowMapError::ConfigError`] if the layout is invalid or no field was added.
    pub fn date_layout(mut self, layout: &str) -> Result<Self, SqlRowMapError> {
        let layout = DateLayout::parse(layout)?;
        let field = self.fields.last_mut().ok_or_else(|| {
            SqlRowMapError::ConfigError("date layout given before any field".into())
        })?;
        field.date_layout = Some(layout);
        Ok(self)
    }

    /// Finish the schema.
    ///
    /// # Errors
    /// Returns [`SqlRowMapError::ConfigError`] for duplicate column names (ignoring case) or
    /// a primary key that is not one of the fields.
    pub fn build(self) -> Result<Schema<T>, SqlRowMapError> {
        let mut by_lower_name = HashMap::with_capacity(self.fields.len());
        for (idx, field) in self.fields.iter().enumerate() {
            if by_lower_name
                .insert(field.name.to_ascii_lowercase(), idx)
                .is_some()
            {
                return Err(SqlRowMapError::ConfigError(format!(
                    "duplicate column {:?} in schema for {}",
                    field.name, self.table
                )));
            }
        }
        if let Some(pk) = self.primary_key
            && !by_lower_name.contains_key(&pk.to_ascii_lowercase())
        {
            return Err(SqlRowMapError::ConfigError(format!(
                "primary key {pk:?} is not a field of {}",
                self.table
            )));
        }
        Ok(Schema {
            table: self.table,
            element: self.element,
            primary_key: self.primary_key,
            fields: self.fields,
            by_lower_name,
        })
    }
}
