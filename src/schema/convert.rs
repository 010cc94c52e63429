use chrono::NaiveDateTime;

use crate::types::{ISO_TIMESTAMP, RowValues};

/// A column value that cannot be assigned to a field of the requested type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionError {
    pub from: &'static str,
    pub to: &'static str,
}

impl std::fmt::Display for CoercionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot assign {} value to {}", self.from, self.to)
    }
}

impl std::error::Error for CoercionError {}

fn mismatch<T>(value: &RowValues, to: &'static str) -> Result<T, CoercionError> {
    Err(CoercionError {
        from: value.type_name(),
        to,
    })
}

/// Lenient conversion from a column value into a field type.
pub trait FromRowValue: Sized {
    /// # Errors
    /// Returns [`CoercionError`] when the value has no sensible representation as `Self`.
    fn from_row_value(value: &RowValues) -> Result<Self, CoercionError>;
}

/// Conversion from a field back into a value for encoding.
pub trait ToRowValue {
    fn to_row_value(&self) -> RowValues;
}

impl FromRowValue for i64 {
    fn from_row_value(value: &RowValues) -> Result<Self, CoercionError> {
        match value {
            RowValues::Int(i) => Ok(*i),
            RowValues::Bool(b) => Ok(i64::from(*b)),
            RowValues::Text(s) => s.trim().parse().or_else(|_| mismatch(value, "i64")),
            #[allow(clippy::cast_possible_truncation)]
            RowValues::Float(f) if f.fract() == 0.0 && f.is_finite() => Ok(*f as i64),
            _ => mismatch(value, "i64"),
        }
    }
}

macro_rules! narrow_int {
    ($($ty:ty),+) => {
        $(
            impl FromRowValue for $ty {
                fn from_row_value(value: &RowValues) -> Result<Self, CoercionError> {
                    let wide = i64::from_row_value(value)?;
                    <$ty>::try_from(wide).or_else(|_| mismatch(value, stringify!($ty)))
                }
            }

            impl ToRowValue for $ty {
                fn to_row_value(&self) -> RowValues {
                    RowValues::Int(i64::from(*self))
                }
            }
        )+
    };
}

narrow_int!(i8, i16, i32, u8, u16, u32);

impl FromRowValue for f64 {
    fn from_row_value(value: &RowValues) -> Result<Self, CoercionError> {
        match value {
            RowValues::Float(_) | RowValues::Int(_) => value.as_float().ok_or(CoercionError {
                from: value.type_name(),
                to: "f64",
            }),
            RowValues::Text(s) => s.trim().parse().or_else(|_| mismatch(value, "f64")),
            _ => mismatch(value, "f64"),
        }
    }
}

impl FromRowValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_row_value(value: &RowValues) -> Result<Self, CoercionError> {
        f64::from_row_value(value).map(|f| f as f32)
    }
}

impl FromRowValue for String {
    fn from_row_value(value: &RowValues) -> Result<Self, CoercionError> {
        match value {
            RowValues::Text(s) => Ok(s.clone()),
            RowValues::Int(i) => Ok(i.to_string()),
            RowValues::Float(f) => Ok(f.to_string()),
            RowValues::Bool(b) => Ok(b.to_string()),
            RowValues::Timestamp(ts) => Ok(ts.format(ISO_TIMESTAMP).to_string()),
            RowValues::Null => mismatch(value, "String"),
        }
    }
}

impl FromRowValue for bool {
    fn from_row_value(value: &RowValues) -> Result<Self, CoercionError> {
        if let Some(b) = value.as_bool() {
            return Ok(*b);
        }
        match value.as_text().map(str::trim) {
            Some("true" | "t" | "TRUE" | "1") => Ok(true),
            Some("false" | "f" | "FALSE" | "0") => Ok(false),
            _ => mismatch(value, "bool"),
        }
    }
}

impl FromRowValue for NaiveDateTime {
    fn from_row_value(value: &RowValues) -> Result<Self, CoercionError> {
        value
            .as_timestamp()
            .ok_or_else(|| CoercionError {
                from: value.type_name(),
                to: "NaiveDateTime",
            })
    }
}

impl<T: FromRowValue> FromRowValue for Option<T> {
    fn from_row_value(value: &RowValues) -> Result<Self, CoercionError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_row_value(value).map(Some)
        }
    }
}

impl ToRowValue for i64 {
    fn to_row_value(&self) -> RowValues {
        RowValues::Int(*self)
    }
}

impl ToRowValue for f64 {
    fn to_row_value(&self) -> RowValues {
        RowValues::Float(*self)
    }
}

impl ToRowValue for f32 {
    fn to_row_value(&self) -> RowValues {
        RowValues::Float(f64::from(*self))
    }
}

impl ToRowValue for String {
    fn to_row_value(&self) -> RowValues {
        RowValues::Text(self.clone())
    }
}

impl ToRowValue for bool {
    fn to_row_value(&self) -> RowValues {
        RowValues::Bool(*self)
    }
}

impl ToRowValue for NaiveDateTime {
    fn to_row_value(&self) -> RowValues {
        RowValues::Timestamp(*self)
    }
}

impl<T: ToRowValue> ToRowValue for Option<T> {
    fn to_row_value(&self) -> RowValues {
        self.as_ref().map_or(RowValues::Null, ToRowValue::to_row_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_lenient() {
        assert_eq!(i64::from_row_value(&RowValues::Text(" 42 ".into())), Ok(42));
        assert_eq!(i32::from_row_value(&RowValues::Bool(true)), Ok(1));
        assert_eq!(i64::from_row_value(&RowValues::Float(3.0)), Ok(3));
        assert!(i64::from_row_value(&RowValues::Float(3.5)).is_err());
        assert!(u8::from_row_value(&RowValues::Int(300)).is_err());
        assert!(i64::from_row_value(&RowValues::Null).is_err());
    }

    #[test]
    fn strings_accept_scalars() {
        assert_eq!(String::from_row_value(&RowValues::Int(7)).unwrap(), "7");
        assert!(String::from_row_value(&RowValues::Null).is_err());
    }

    #[test]
    fn options_absorb_null() {
        assert_eq!(Option::<i64>::from_row_value(&RowValues::Null), Ok(None));
        assert_eq!(Option::<i64>::from_row_value(&RowValues::Int(3)), Ok(Some(3)));
        assert_eq!(Some(3_i64).to_row_value(), RowValues::Int(3));
        assert_eq!(None::<String>.to_row_value(), RowValues::Null);
    }

    #[test]
    fn timestamps_parse_from_text() {
        let ts = NaiveDateTime::from_row_value(&RowValues::Text("2024-03-05 00:00:00".into()))
            .unwrap();
        assert_eq!(ts.format("%Y%m%d").to_string(), "20240305");
        let err = NaiveDateTime::from_row_value(&RowValues::Int(1)).unwrap_err();
        assert_eq!(err.to_string(), "cannot assign int value to NaiveDateTime");
    }
}
