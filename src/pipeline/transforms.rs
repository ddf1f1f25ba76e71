//! Column transforms shared by fitting and inference.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ndarray::Array2;

use crate::common::error::{HyperError, HyperResult};
use crate::data::{Cell, ColumnData, DataView};

/// Hashable identity of a non-missing cell.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum CellKey {
    Bool(bool),
    Number(u64),
    Text(String),
}

impl CellKey {
    fn of(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Missing => None,
            Cell::Bool(flag) => Some(CellKey::Bool(*flag)),
            // -0.0 and 0.0 share a key.
            Cell::Number(value) => Some(CellKey::Number((value + 0.0).to_bits())),
            Cell::Text(text) => Some(CellKey::Text(text.clone())),
        }
    }
}

/// Distinct non-missing values of `column` in first-appearance order.
pub fn build_vocabulary(view: &DataView, column: &str) -> HyperResult<Arc<[Cell]>> {
    let mut seen = HashSet::new();
    let mut vocabulary = Vec::new();
    for cell in view.cells(column)? {
        if CellKey::of(&cell).is_some_and(|key| seen.insert(key)) {
            vocabulary.push(cell);
        }
    }
    Ok(vocabulary.into())
}

/// Replace `column` with key indices into `vocabulary`.
///
/// Views without the column pass through untouched.
pub fn map_to_keys(view: &mut DataView, column: &str, vocabulary: &Arc<[Cell]>) -> HyperResult<()> {
    if !view.contains(column) {
        return Ok(());
    }
    let index: HashMap<CellKey, u32> = vocabulary
        .iter()
        .enumerate()
        .filter_map(|(i, cell)| CellKey::of(cell).map(|key| (key, i as u32)))
        .collect();
    let values = view.cells(column)?;
    let keys = values
        .iter()
        .map(|cell| CellKey::of(cell).and_then(|key| index.get(&key).copied()))
        .collect();
    view.put(
        column,
        ColumnData::Key {
            keys,
            vocabulary: Arc::clone(vocabulary),
            values,
        },
    )
}

/// Concatenate `inputs` into one vector column named `output`.
pub fn concatenate(view: &mut DataView, output: &str, inputs: &[String]) -> HyperResult<()> {
    let rows = view.num_rows();
    let mut parts: Vec<Array2<f32>> = Vec::with_capacity(inputs.len());
    for name in inputs {
        let part = match view.column(name)? {
            ColumnData::Cells(cells) => {
                let mut values = Vec::with_capacity(rows);
                for cell in cells {
                    values.push(numeric(name, cell)?);
                }
                Array2::from_shape_vec((rows, 1), values)
            }
            ColumnData::Float(values) => Array2::from_shape_vec((rows, 1), values.clone()),
            ColumnData::Vector(matrix) => Ok(matrix.clone()),
            ColumnData::Key { .. } => return Err(HyperError::column_type(name, "numeric", "key")),
        };
        let part = part.map_err(|e| HyperError::InvalidData(e.to_string()))?;
        parts.push(part);
    }

    let width: usize = parts.iter().map(Array2::ncols).sum();
    let mut features = Array2::<f32>::zeros((rows, width));
    let mut offset = 0;
    for part in &parts {
        let end = offset + part.ncols();
        features
            .slice_mut(ndarray::s![.., offset..end])
            .assign(part);
        offset = end;
    }
    view.put(output, ColumnData::Vector(features))
}

fn numeric(column: &str, cell: &Cell) -> HyperResult<f32> {
    match cell {
        Cell::Missing => Ok(f32::NAN),
        Cell::Text(_) => cell
            .as_f64()
            .map(|value| value as f32)
            .ok_or_else(|| HyperError::column_type(column, "numeric", "text")),
        other => Ok(other.as_f64().map_or(f32::NAN, |value| value as f32)),
    }
}
