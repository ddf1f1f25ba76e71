//! Service layer loading delimited text files into data views.
//!
//! Reading is line oriented and streaming; only the parsed cells are held in
//! memory.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::common::error::{HyperError, HyperResult};

use super::domain::{Cell, ColumnData, DataView};
use super::record::field_names;

/// Header and separator handling for [`load_text_file`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TextLoaderOptions {
    pub has_header: bool,
    pub separator: char,
}

impl Default for TextLoaderOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            separator: ',',
        }
    }
}

/// Load a delimited text file.
///
/// Columns are named by the header row when present, otherwise by the serde
/// field names of `T` (positional names for any extra fields).
pub fn load_text_file<T: DeserializeOwned>(
    path: impl AsRef<Path>,
    options: TextLoaderOptions,
) -> HyperResult<DataView> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    let mut names: Option<Vec<String>> = None;
    let mut columns: Vec<Vec<Cell>> = Vec::new();
    let mut rows = 0usize;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(options.separator).collect();

        if names.is_none() {
            let header: Option<Vec<String>> = if options.has_header {
                Some(fields.iter().map(|f| f.trim().trim_matches('"').to_string()).collect())
            } else {
                None
            };
            let resolved = header
                .unwrap_or_else(|| positional_names::<T>(fields.len()));
            columns = vec![Vec::new(); resolved.len()];
            names = Some(resolved);
            if options.has_header {
                continue;
            }
        }

        if fields.len() != columns.len() {
            return Err(HyperError::Parse {
                line: line_no,
                message: format!("expected {} fields, found {}", columns.len(), fields.len()),
            });
        }
        for (column, field) in columns.iter_mut().zip(&fields) {
            column.push(Cell::parse(field));
        }
        rows += 1;
    }

    let names = names.unwrap_or_else(|| positional_names::<T>(0));
    if columns.len() != names.len() {
        columns = vec![Vec::new(); names.len()];
    }
    let mut view = DataView::new(rows);
    for (name, cells) in names.into_iter().zip(columns) {
        view.put(name, ColumnData::Cells(cells))?;
    }
    let columns = view.columns().len();
    tracing::debug!(rows, columns, "loaded delimited text");
    Ok(view)
}

fn positional_names<T: DeserializeOwned>(count: usize) -> Vec<String> {
    let fields = field_names::<T>();
    (0..count.max(fields.len()))
        .map(|i| fields.get(i).map_or_else(|| i.to_string(), |&n| n.into()))
        .collect()
}
