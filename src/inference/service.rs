//! Batch prediction and projection of scored views onto labels.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::common::error::HyperResult;
use crate::data::{load_records, DataView};
use crate::pipeline::FittedPipeline;
use crate::training::predictor::{PREDICTED_LABEL_COLUMN, SCORE_COLUMN};

use super::domain::Label;

/// Column a prediction is read from: the predicted label when the final
/// stage writes one, otherwise the raw score.
pub fn output_column(view: &DataView) -> &'static str {
    if view.contains(PREDICTED_LABEL_COLUMN) {
        PREDICTED_LABEL_COLUMN
    } else {
        SCORE_COLUMN
    }
}

/// Per-row predictions of a scored view, in row order.
pub fn project<L: Label>(view: &DataView) -> HyperResult<Vec<L>> {
    view.cells(output_column(view))?
        .iter()
        .map(L::from_cell)
        .collect()
}

/// Predict every item in `items`, preserving input order.
pub fn predict_batch<T, L>(pipeline: &FittedPipeline, items: &[T]) -> HyperResult<Vec<L>>
where
    T: Serialize + DeserializeOwned,
    L: Label,
{
    let scored = pipeline.transform(&load_records(items)?)?;
    project(&scored)
}
