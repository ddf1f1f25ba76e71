//! Data domain: tabular views, record adaptation and delimited text loading.

pub mod domain;
pub mod record;
pub mod service;

pub use domain::{Cell, Column, ColumnData, ColumnDef, ColumnKind, DataView, Schema};
pub use record::load_records;
pub use service::{load_text_file, TextLoaderOptions};
