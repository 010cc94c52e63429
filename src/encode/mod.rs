//! Rendering materialized results as JSON or XML text.
//!
//! Output is always a freshly owned `String`; encoding the same result twice with the same
//! [`Format`] yields identical text.

mod json;
mod xml;

use crate::error::SqlRowMapError;
use crate::materialize::{ManyResult, QueryResult, SingleResult};
use crate::schema::Entity;
use crate::types::RowValues;

/// One row as ordered `(name, value)` pairs.
pub type Record<'a> = Vec<(&'a str, RowValues)>;

/// Element name used for schema-less rows in compact XML.
pub const GENERIC_ELEMENT: &str = "row";

/// Whether a result encodes as one item or a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Single,
    Set,
}

/// Output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    /// Compact JSON; sets are arrays of objects.
    Json,
    /// Compact XML; sets are wrapped in `<rows>`.
    Xml,
    /// Pretty-printed XML. Every line starts with `prefix` followed by `indent` once per
    /// nesting level, and each row is an element named `root`.
    XmlIndent {
        prefix: String,
        indent: String,
        root: String,
    },
}

impl Format {
    #[must_use]
    pub fn xml_indent(
        prefix: impl Into<String>,
        indent: impl Into<String>,
        root: impl Into<String>,
    ) -> Self {
        Format::XmlIndent {
            prefix: prefix.into(),
            indent: indent.into(),
            root: root.into(),
        }
    }
}

/// Encoded text of a single-row result, plus whether the row existed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub text: String,
    pub found: bool,
}

/// A materialized result that can be encoded.
pub trait Encodable {
    fn shape(&self) -> Shape;

    /// Default element name for each row in XML output.
    fn element_name(&self) -> &str;

    /// Rows as ordered `(name, value)` pairs, with per-field date layouts applied.
    fn records(&self) -> Vec<Record<'_>>;
}

/// Encode `value` in the requested format.
///
/// # Errors
/// Returns [`SqlRowMapError::EncodingError`] for values that cannot be represented, such as
/// non-finite floats or column names that are not valid XML element names.
pub fn encode(value: &impl Encodable, format: &Format) -> Result<String, SqlRowMapError> {
    let records = value.records();
    match format {
        Format::Json => json::write(&records, value.shape()),
        Format::Xml => xml::write(&records, value.shape(), value.element_name(), None),
        Format::XmlIndent {
            prefix,
            indent,
            root,
        } => xml::write(
            &records,
            value.shape(),
            root,
            Some((prefix.as_str(), indent.as_str())),
        ),
    }
}

fn entity_record<T: Entity>(item: &T) -> Record<'static> {
    T::schema()
        .fields()
        .iter()
        .map(|field| (field.name(), field.encoded_value(item)))
        .collect()
}

impl<T: Entity> Encodable for SingleResult<T> {
    fn shape(&self) -> Shape {
        Shape::Single
    }

    fn element_name(&self) -> &str {
        T::schema().element()
    }

    fn records(&self) -> Vec<Record<'_>> {
        vec![entity_record(&self.value)]
    }
}

impl<T: Entity> Encodable for ManyResult<T> {
    fn shape(&self) -> Shape {
        Shape::Set
    }

    fn element_name(&self) -> &str {
        T::schema().element()
    }

    fn records(&self) -> Vec<Record<'_>> {
        self.items.iter().map(entity_record).collect()
    }
}

impl Encodable for QueryResult {
    fn shape(&self) -> Shape {
        Shape::Set
    }

    fn element_name(&self) -> &str {
        GENERIC_ELEMENT
    }

    fn records(&self) -> Vec<Record<'_>> {
        self.rows()
            .iter()
            .map(|row| row.iter().map(|(name, value)| (name, value.clone())).collect())
            .collect()
    }
}

impl<T: Entity> SingleResult<T> {
    /// # Errors
    /// See [`encode`].
    pub fn encode(&self, format: &Format) -> Result<Encoded, SqlRowMapError> {
        Ok(Encoded {
            text: encode(self, format)?,
            found: self.found,
        })
    }

    /// # Errors
    /// See [`encode`].
    pub fn json(&self) -> Result<Encoded, SqlRowMapError> {
        self.encode(&Format::Json)
    }

    /// # Errors
    /// See [`encode`].
    pub fn xml(&self) -> Result<Encoded, SqlRowMapError> {
        self.encode(&Format::Xml)
    }

    /// # Errors
    /// See [`encode`].
    pub fn xml_indent(&self, prefix: &str, indent: &str, root: &str) -> Result<Encoded, SqlRowMapError> {
        self.encode(&Format::xml_indent(prefix, indent, root))
    }
}

macro_rules! set_encoders {
    ($ty:ty $(, $bound:ident)?) => {
        impl$(<T: $bound>)? $ty {
            /// # Errors
            /// See [`encode`].
            pub fn json(&self) -> Result<String, SqlRowMapError> {
                encode(self, &Format::Json)
            }

            /// # Errors
            /// See [`encode`].
            pub fn xml(&self) -> Result<String, SqlRowMapError> {
                encode(self, &Format::Xml)
            }

            /// # Errors
            /// See [`encode`].
            pub fn xml_indent(
                &self,
                prefix: &str,
                indent: &str,
                root: &str,
            ) -> Result<String, SqlRowMapError> {
                encode(self, &Format::xml_indent(prefix, indent, root))
            }
        }
    };
}

set_encoders!(ManyResult<T>, Entity);
set_encoders!(QueryResult);
