//! Adaptation of typed in-memory records into [`DataView`]s.
//!
//! Records travel through `serde_json` values, so any `Serialize` struct works
//! as an input row. Field names are recovered from the `Deserialize` impl so an
//! empty collection still produces the full schema.

use indexmap::IndexMap;
use serde::de::{self, DeserializeOwned, Deserializer, Visitor};
use serde::Serialize;
use serde_json::Value;

use crate::common::error::{HyperError, HyperResult};

use super::domain::{Cell, ColumnData, DataView};

/// Deserializer that records the field list handed to `deserialize_struct`.
struct FieldNames<'a>(&'a mut Option<&'static [&'static str]>);

impl<'de> Deserializer<'de> for FieldNames<'_> {
    type Error = de::value::Error;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(de::Error::custom("record type is not a struct"))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        *self.0 = Some(fields);
        Err(de::Error::custom("field names captured"))
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}

/// Serde field names of a record struct, in declaration order.
///
/// Returns an empty slice for types that do not deserialize as a plain struct.
pub fn field_names<T: DeserializeOwned>() -> &'static [&'static str] {
    let mut captured = None;
    let _ = T::deserialize(FieldNames(&mut captured));
    captured.unwrap_or(&[])
}

fn to_cell(column: &str, value: Value) -> HyperResult<Cell> {
    match value {
        Value::Null => Ok(Cell::Missing),
        Value::Bool(flag) => Ok(Cell::Bool(flag)),
        Value::Number(number) => number.as_f64().map(Cell::Number).ok_or_else(|| {
            HyperError::InvalidData(format!("column `{column}`: {number} is out of range"))
        }),
        Value::String(text) => Ok(Cell::Text(text)),
        Value::Array(_) | Value::Object(_) => Err(HyperError::InvalidData(format!(
            "column `{column}`: nested values are not supported"
        ))),
    }
}

/// Adapt a collection of records into a view with one raw column per field.
pub fn load_records<T>(records: &[T]) -> HyperResult<DataView>
where
    T: Serialize + DeserializeOwned,
{
    let mut columns: IndexMap<String, Vec<Cell>> = field_names::<T>()
        .iter()
        .map(|name| (name.to_string(), Vec::with_capacity(records.len())))
        .collect();

    for (row, record) in records.iter().enumerate() {
        let value = serde_json::to_value(record)
            .map_err(|err| HyperError::InvalidData(format!("record {row}: {err}")))?;
        let Value::Object(fields) = value else {
            return Err(HyperError::InvalidData(format!("record {row} is not a struct")));
        };
        for (name, value) in fields {
            let cell = to_cell(&name, value)?;
            // Fields first seen late (flattened maps) are back-filled as missing.
            columns
                .entry(name)
                .or_insert_with(|| vec![Cell::Missing; row])
                .push(cell);
        }
        for cells in columns.values_mut() {
            if cells.len() == row {
                cells.push(Cell::Missing);
            }
        }
    }

    let mut view = DataView::new(records.len());
    for (name, cells) in columns {
        view.put(name, ColumnData::Cells(cells))?;
    }
    Ok(view)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::data::ColumnKind;

    #[derive(Serialize, Deserialize)]
    struct Sample {
        size: f32,
        #[serde(rename = "Rooms")]
        rooms: u32,
        sold: bool,
        city: Option<String>,
    }

    #[test]
    fn captures_field_names_in_declaration_order() {
        assert_eq!(field_names::<Sample>(), ["size", "Rooms", "sold", "city"]);
        assert!(field_names::<f32>().is_empty());
    }

    #[test]
    fn records_become_raw_columns() {
        let records = vec![
            Sample {
                size: 1.5,
                rooms: 3,
                sold: true,
                city: Some("Oslo".into()),
            },
            Sample {
                size: 2.0,
                rooms: 4,
                sold: false,
                city: None,
            },
        ];

        let view = load_records(&records).unwrap();
        assert_eq!(view.num_rows(), 2);
        assert_eq!(
            view.cells("Rooms").unwrap(),
            vec![Cell::Number(3.0), Cell::Number(4.0)]
        );
        assert_eq!(view.cells("city").unwrap()[1], Cell::Missing);
        assert_eq!(view.schema().get("sold").unwrap().kind, ColumnKind::Bool);
    }

    #[test]
    fn empty_collection_keeps_the_schema() {
        let view = load_records::<Sample>(&[]).unwrap();
        assert_eq!(view.num_rows(), 0);
        assert_eq!(view.schema().len(), 4);
    }

    #[test]
    fn nested_values_are_rejected() {
        #[derive(Serialize, Deserialize)]
        struct Nested {
            values: Vec<f32>,
        }

        let err = load_records(&[Nested { values: vec![1.0] }]).unwrap_err();
        assert!(matches!(err, HyperError::InvalidData(_)));
    }
}
