//! Core tabular definitions: cells, typed columns, schemas and data views.
//!
//! A [`DataView`] is the unit every pipeline stage reads and writes. Raw loaded
//! columns hold [`Cell`]s; stages add float, vector and key-encoded columns.

use std::fmt;
use std::sync::Arc;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::common::error::{HyperError, HyperResult};

/// One loaded value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Missing,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    /// Parse a raw delimited-text field.
    pub fn parse(raw: &str) -> Self {
        let field = raw.trim();
        let field = field
            .strip_prefix('"')
            .and_then(|f| f.strip_suffix('"'))
            .unwrap_or(field);
        if field.is_empty() {
            return Cell::Missing;
        }
        if field.eq_ignore_ascii_case("true") {
            return Cell::Bool(true);
        }
        if field.eq_ignore_ascii_case("false") {
            return Cell::Bool(false);
        }
        match field.parse::<f64>() {
            Ok(value) => Cell::Number(value),
            Err(_) => Cell::Text(field.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Numeric reading used for features and regression labels.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            Cell::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            Cell::Text(text) => text.trim().parse().ok(),
            Cell::Missing => None,
        }
    }

    /// Strict boolean reading: `Bool`, numbers 0/1, or text true/false.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Cell::Bool(flag) => Some(*flag),
            Cell::Number(value) if *value == 0.0 => Some(false),
            Cell::Number(value) if *value == 1.0 => Some(true),
            Cell::Text(text) if text.eq_ignore_ascii_case("true") => Some(true),
            Cell::Text(text) if text.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    /// Kind this cell contributes to a raw column.
    pub fn kind(&self) -> Option<ColumnKind> {
        match self {
            Cell::Missing => None,
            Cell::Bool(_) => Some(ColumnKind::Bool),
            Cell::Number(_) => Some(ColumnKind::Number),
            Cell::Text(_) => Some(ColumnKind::Text),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Bool(flag) => write!(f, "{flag}"),
            Cell::Number(value) => write!(f, "{value}"),
            Cell::Text(text) => f.write_str(text),
        }
    }
}

/// Logical type of a column as recorded in a [`Schema`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ColumnKind {
    Bool,
    Number,
    Text,
    Float,
    Vector { width: usize },
    Key { cardinality: usize },
}

impl ColumnKind {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnKind::Bool => "bool",
            ColumnKind::Number => "number",
            ColumnKind::Text => "text",
            ColumnKind::Float => "float",
            ColumnKind::Vector { .. } => "vector",
            ColumnKind::Key { .. } => "key",
        }
    }
}

/// Physical storage of a column.
#[derive(Clone, Debug)]
pub enum ColumnData {
    /// Raw values as loaded.
    Cells(Vec<Cell>),
    /// One float per row.
    Float(Vec<f32>),
    /// Fixed-width float vector per row, row-major.
    Vector(Array2<f32>),
    /// Key index per row into a shared vocabulary, plus the source values.
    /// Values outside the vocabulary have no key but keep their source cell.
    Key {
        keys: Vec<Option<u32>>,
        vocabulary: Arc<[Cell]>,
        values: Vec<Cell>,
    },
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Cells(cells) => cells.len(),
            ColumnData::Float(values) => values.len(),
            ColumnData::Vector(matrix) => matrix.nrows(),
            ColumnData::Key { keys, .. } => keys.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Cells(cells) => cells
                .iter()
                .find_map(Cell::kind)
                .unwrap_or(ColumnKind::Number),
            ColumnData::Float(_) => ColumnKind::Float,
            ColumnData::Vector(matrix) => ColumnKind::Vector {
                width: matrix.ncols(),
            },
            ColumnData::Key { vocabulary, .. } => ColumnKind::Key {
                cardinality: vocabulary.len(),
            },
        }
    }
}

/// Named column.
#[derive(Clone, Debug)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

/// Schema entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered column names and kinds of a [`DataView`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<ColumnDef>,
}

impl Schema {
    pub fn get(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|def| def.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|def| def.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// In-memory columnar dataset.
#[derive(Clone, Debug, Default)]
pub struct DataView {
    rows: usize,
    columns: Vec<Column>,
}

impl DataView {
    /// Empty view with a fixed row count; columns are added with [`DataView::put`].
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            columns: Vec::new(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column.name == name)
    }

    /// Add a column, replacing an existing one of the same name in place.
    pub fn put(&mut self, name: impl Into<String>, data: ColumnData) -> HyperResult<()> {
        let name = name.into();
        if data.len() != self.rows {
            return Err(HyperError::InvalidData(format!(
                "column `{name}` has {} rows, view has {}",
                data.len(),
                self.rows
            )));
        }
        match self.columns.iter_mut().find(|column| column.name == name) {
            Some(column) => column.data = data,
            None => self.columns.push(Column { name, data }),
        }
        Ok(())
    }

    pub fn column(&self, name: &str) -> HyperResult<&ColumnData> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| &column.data)
            .ok_or_else(|| HyperError::ColumnNotFound(name.to_string()))
    }

    pub fn schema(&self) -> Schema {
        Schema {
            columns: self
                .columns
                .iter()
                .map(|column| ColumnDef {
                    name: column.name.clone(),
                    kind: column.data.kind(),
                })
                .collect(),
        }
    }

    /// Scalar float column.
    pub fn floats(&self, name: &str) -> HyperResult<&[f32]> {
        match self.column(name)? {
            ColumnData::Float(values) => Ok(values),
            other => Err(HyperError::column_type(name, "float", other.kind().name())),
        }
    }

    /// Vector column.
    pub fn vectors(&self, name: &str) -> HyperResult<&Array2<f32>> {
        match self.column(name)? {
            ColumnData::Vector(matrix) => Ok(matrix),
            other => Err(HyperError::column_type(name, "vector", other.kind().name())),
        }
    }

    /// Key-encoded column and its vocabulary.
    pub fn keys(&self, name: &str) -> HyperResult<(&[Option<u32>], &[Cell])> {
        match self.column(name)? {
            ColumnData::Key { keys, vocabulary, .. } => Ok((keys, vocabulary)),
            other => Err(HyperError::column_type(name, "key", other.kind().name())),
        }
    }

    /// Per-row values; key columns yield their source cells.
    pub fn cells(&self, name: &str) -> HyperResult<Vec<Cell>> {
        match self.column(name)? {
            ColumnData::Cells(cells) => Ok(cells.clone()),
            ColumnData::Float(values) => Ok(values
                .iter()
                .map(|value| Cell::Number(f64::from(*value)))
                .collect()),
            ColumnData::Key { values, .. } => Ok(values.clone()),
            ColumnData::Vector(_) => Err(HyperError::column_type(name, "scalar", "vector")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fields_into_cells() {
        assert_eq!(Cell::parse(" 3.5 "), Cell::Number(3.5));
        assert_eq!(Cell::parse("TRUE"), Cell::Bool(true));
        assert_eq!(Cell::parse("\"setosa\""), Cell::Text("setosa".into()));
        assert_eq!(Cell::parse(""), Cell::Missing);
    }

    #[test]
    fn strict_bool_rejects_other_numbers() {
        assert_eq!(Cell::Number(1.0).as_bool(), Some(true));
        assert_eq!(Cell::Number(0.0).as_bool(), Some(false));
        assert_eq!(Cell::Number(2.5).as_bool(), None);
        assert_eq!(Cell::Text("setosa".into()).as_bool(), None);
    }

    #[test]
    fn raw_column_kind_comes_from_first_present_cell() {
        let column = ColumnData::Cells(vec![Cell::Missing, Cell::Text("a".into())]);
        assert_eq!(column.kind(), ColumnKind::Text);
        let empty = ColumnData::Cells(vec![Cell::Missing]);
        assert_eq!(empty.kind(), ColumnKind::Number);
    }

    #[test]
    fn put_replaces_in_place_and_checks_length() {
        let mut view = DataView::new(2);
        view.put("a", ColumnData::Float(vec![1.0, 2.0])).unwrap();
        view.put("b", ColumnData::Float(vec![3.0, 4.0])).unwrap();
        view.put("a", ColumnData::Float(vec![5.0, 6.0])).unwrap();

        let names: Vec<_> = view.schema().names().map(str::to_string).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(view.floats("a").unwrap(), &[5.0, 6.0]);
        assert!(view.put("c", ColumnData::Float(vec![1.0])).is_err());
    }

    #[test]
    fn key_columns_keep_source_cells() {
        let mut view = DataView::new(3);
        let vocabulary: Arc<[Cell]> = vec![Cell::Text("x".into()), Cell::Text("y".into())].into();
        let values = vec![
            Cell::Text("y".into()),
            Cell::Text("z".into()),
            Cell::Text("x".into()),
        ];
        view.put(
            "label",
            ColumnData::Key {
                keys: vec![Some(1), None, Some(0)],
                vocabulary,
                values: values.clone(),
            },
        )
        .unwrap();

        assert_eq!(view.cells("label").unwrap(), values);
        let (keys, vocabulary) = view.keys("label").unwrap();
        assert_eq!(keys[1], None);
        assert_eq!(vocabulary.len(), 2);
        assert!(matches!(
            view.floats("label"),
            Err(HyperError::ColumnType { expected: "float", .. })
        ));
    }
}
