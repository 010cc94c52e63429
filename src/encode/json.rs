use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::SqlRowMapError;

use super::{Record, Shape};

/// Serializes one record as an object whose keys follow column order.
struct JsonRecord<'r, 'a>(&'r Record<'a>);

impl Serialize for JsonRecord<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

pub(super) fn write(records: &[Record<'_>], shape: Shape) -> Result<String, SqlRowMapError> {
    let text = match shape {
        Shape::Single => match records.first() {
            Some(record) => serde_json::to_string(&JsonRecord(record))?,
            None => "null".to_string(),
        },
        Shape::Set => {
            let rows: Vec<JsonRecord<'_, '_>> = records.iter().map(JsonRecord).collect();
            serde_json::to_string(&rows)?
        }
    };
    Ok(text)
}
