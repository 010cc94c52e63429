use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::ser::{Error as SerError, Serialize, Serializer};

/// Format used for timestamps that have no explicit layout attached.
pub(crate) const ISO_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Values supported by this library, used for parameters, row data, and encoding alike.
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Date and time without an offset
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
}

impl RowValues {
    /// Returns true if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let RowValues::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let RowValues::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            return parse_timestamp(s);
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            RowValues::Float(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            RowValues::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// Name of the runtime type carried by this value.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            RowValues::Int(_) => "int",
            RowValues::Float(_) => "float",
            RowValues::Text(_) => "text",
            RowValues::Bool(_) => "bool",
            RowValues::Timestamp(_) => "timestamp",
            RowValues::Null => "null",
        }
    }
}

/// Parse the textual timestamp forms databases commonly hand back.
pub(crate) fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

impl Serialize for RowValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RowValues::Int(i) => serializer.serialize_i64(*i),
            RowValues::Float(f) => {
                if f.is_finite() {
                    serializer.serialize_f64(*f)
                } else {
                    Err(S::Error::custom(format!("non-finite float {f} is not encodable")))
                }
            }
            RowValues::Text(s) => serializer.serialize_str(s),
            RowValues::Bool(b) => serializer.serialize_bool(*b),
            RowValues::Timestamp(dt) => serializer.collect_str(&dt.format(ISO_TIMESTAMP)),
            RowValues::Null => serializer.serialize_none(),
        }
    }
}

macro_rules! impl_from_scalar {
    ($variant:ident, $conv:expr, $($ty:ty),+) => {
        $(
            impl From<$ty> for RowValues {
                fn from(value: $ty) -> Self {
                    RowValues::$variant($conv(value))
                }
            }
        )+
    };
}

impl_from_scalar!(Int, i64::from, i8, i16, i32, i64, u8, u16, u32);
impl_from_scalar!(Float, f64::from, f32, f64);
impl_from_scalar!(Text, String::from, &str, String);
impl_from_scalar!(Bool, bool::from, bool);
impl_from_scalar!(Timestamp, std::convert::identity, NaiveDateTime);

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}

/// Named parameters keyed by placeholder name (without the leading `?`).
pub type ParamMap = HashMap<String, RowValues>;

/// Parameters supplied with a SQL statement: either positional or named, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    Positional(Vec<RowValues>),
    Named(ParamMap),
}

impl Default for Params {
    fn default() -> Self {
        Params::Positional(Vec::new())
    }
}

impl From<Vec<RowValues>> for Params {
    fn from(values: Vec<RowValues>) -> Self {
        Params::Positional(values)
    }
}

impl From<&[RowValues]> for Params {
    fn from(values: &[RowValues]) -> Self {
        Params::Positional(values.to_vec())
    }
}

impl<const N: usize> From<[RowValues; N]> for Params {
    fn from(values: [RowValues; N]) -> Self {
        Params::Positional(values.into())
    }
}

impl From<ParamMap> for Params {
    fn from(map: ParamMap) -> Self {
        Params::Named(map)
    }
}

impl From<()> for Params {
    fn from((): ()) -> Self {
        Params::default()
    }
}

/// Build a [`ParamMap`] from `name => value` pairs.
///
/// ```rust
/// use sql_rowmap::params;
///
/// let map = params! { "id" => 4, "userid" => 1 };
/// assert_eq!(map.len(), 2);
/// ```
#[macro_export]
macro_rules! params {
    () => { $crate::ParamMap::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::ParamMap::new();
        $( map.insert(::std::string::String::from($key), $crate::RowValues::from($value)); )+
        map
    }};
}
