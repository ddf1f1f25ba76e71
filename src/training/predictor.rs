//! Fitted predictors and the trainer fitting that produces them.

use std::sync::Arc;

use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::common::error::{HyperError, HyperResult};
use crate::data::{Cell, ColumnData, DataView};

use super::domain::{TrainerKind, TrainerSpec};
use super::kmeans::{KMeansModel, KMeansTrainer};
use super::linear::{sigmoid, softmax, CoordinateDescent, LinearModel, Objective};

/// Raw model output: margin, distance vector or class scores.
pub const SCORE_COLUMN: &str = "Score";
/// Calibrated positive-class probability (binary only).
pub const PROBABILITY_COLUMN: &str = "Probability";
/// Predicted label value.
pub const PREDICTED_LABEL_COLUMN: &str = "PredictedLabel";

/// Fitted model of one trainer family.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Predictor {
    Binary(LinearModel),
    Multiclass {
        model: LinearModel,
        classes: Arc<[Cell]>,
    },
    Regression(LinearModel),
    Clustering(KMeansModel),
}

impl Predictor {
    fn input_width(&self) -> usize {
        match self {
            Predictor::Binary(model) | Predictor::Regression(model) => model.num_features(),
            Predictor::Multiclass { model, .. } => model.num_features(),
            Predictor::Clustering(model) => model.dims(),
        }
    }

    /// Output columns for every row of `features`.
    pub fn predict(
        &self,
        features: ArrayView2<'_, f32>,
    ) -> HyperResult<Vec<(&'static str, ColumnData)>> {
        if features.ncols() != self.input_width() {
            return Err(HyperError::InvalidData(format!(
                "model expects {} features, got {}",
                self.input_width(),
                features.ncols()
            )));
        }
        let rows = features.nrows();

        let columns = match self {
            Predictor::Binary(model) => {
                let scores: Vec<f32> = linear_margins(model, features).into_iter().collect();
                let probabilities = scores.iter().map(|&s| sigmoid(s.into()) as f32).collect();
                let labels = scores.iter().map(|&s| Cell::Bool(s > 0.0)).collect();
                vec![
                    (SCORE_COLUMN, ColumnData::Float(scores)),
                    (PROBABILITY_COLUMN, ColumnData::Float(probabilities)),
                    (PREDICTED_LABEL_COLUMN, ColumnData::Cells(labels)),
                ]
            }
            Predictor::Multiclass { model, classes } => {
                let mut scores = linear_margins(model, features);
                let mut labels = Vec::with_capacity(rows);
                for mut row in scores.rows_mut() {
                    if let Some(slice) = row.as_slice_mut() {
                        softmax(slice);
                    }
                    let best = argmax(row.view());
                    let label = classes.get(best).cloned().unwrap_or(Cell::Missing);
                    labels.push(label);
                }
                vec![
                    (SCORE_COLUMN, ColumnData::Vector(scores)),
                    (PREDICTED_LABEL_COLUMN, ColumnData::Cells(labels)),
                ]
            }
            Predictor::Regression(model) => {
                let scores = linear_margins(model, features).into_iter().collect();
                vec![(SCORE_COLUMN, ColumnData::Float(scores))]
            }
            Predictor::Clustering(model) => {
                let mut distances = Array2::<f32>::zeros((rows, model.num_clusters()));
                let mut labels = Vec::with_capacity(rows);
                for (row, mut out) in features.rows().into_iter().zip(distances.rows_mut()) {
                    out.assign(&Array1::from(model.distances(row)));
                    labels.push(Cell::Number((model.nearest(row) + 1) as f64));
                }
                vec![
                    (SCORE_COLUMN, ColumnData::Vector(distances)),
                    (PREDICTED_LABEL_COLUMN, ColumnData::Cells(labels)),
                ]
            }
        };
        Ok(columns)
    }
}

fn linear_margins(model: &LinearModel, features: ArrayView2<'_, f32>) -> Array2<f32> {
    let mut margins = Array2::<f32>::zeros((features.nrows(), model.num_groups()));
    for (row, out) in features.rows().into_iter().zip(margins.rows_mut()) {
        model.margins(row, out);
    }
    margins
}

fn argmax(values: ndarray::ArrayView1<'_, f32>) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map_or(0, |(index, _)| index)
}

impl TrainerSpec {
    /// Fit this trainer on the assembled features and encoded label of `view`.
    pub fn fit(&self, view: &DataView) -> HyperResult<Predictor> {
        self.options.validate()?;
        let features = view.vectors(&self.features_column)?;
        let descent = CoordinateDescent {
            max_iterations: self.options.max_iterations,
            lambda: self.options.l2_regularization,
        };

        let predictor = match self.kind {
            TrainerKind::Logistic => {
                let (rows, targets) = self.targets(view, "bool", |cell| {
                    cell.as_bool().map(|flag| if flag { 1.0 } else { 0.0 })
                })?;
                let x = features.select(Axis(0), &rows);
                Predictor::Binary(descent.fit(x.view(), &targets, Objective::Logistic, 1)?)
            }
            TrainerKind::LeastSquares => {
                let numeric = |cell: &Cell| cell.as_f64().map(|v| v as f32);
                let (rows, targets) = self.targets(view, "numeric", numeric)?;
                let x = features.select(Axis(0), &rows);
                Predictor::Regression(descent.fit(x.view(), &targets, Objective::Squared, 1)?)
            }
            TrainerKind::MaximumEntropy => {
                let (keys, vocabulary) = view.keys(&self.label_column)?;
                if vocabulary.is_empty() {
                    return Err(HyperError::InvalidData(format!(
                        "label column `{}` has no classes",
                        self.label_column
                    )));
                }
                let (rows, targets): (Vec<usize>, Vec<f32>) = keys
                    .iter()
                    .enumerate()
                    .filter_map(|(row, key)| key.map(|k| (row, k as f32)))
                    .unzip();
                let x = features.select(Axis(0), &rows);
                let groups = vocabulary.len();
                let model = descent.fit(x.view(), &targets, Objective::Softmax, groups)?;
                Predictor::Multiclass {
                    model,
                    classes: vocabulary.into(),
                }
            }
            TrainerKind::KMeans => {
                let trainer = KMeansTrainer {
                    clusters: self.options.number_of_clusters,
                    max_iterations: self.options.max_iterations,
                    seed: self.options.seed,
                };
                let x = features.mapv(|v| if v.is_nan() { 0.0 } else { v });
                Predictor::Clustering(trainer.fit(x.view())?)
            }
        };
        tracing::debug!(kind = ?self.kind, rows = view.num_rows(), "trainer fitted");
        Ok(predictor)
    }

    /// Rows with a usable label and their targets; missing labels are skipped.
    fn targets(
        &self,
        view: &DataView,
        expected: &'static str,
        read: impl Fn(&Cell) -> Option<f32>,
    ) -> HyperResult<(Vec<usize>, Vec<f32>)> {
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for (row, cell) in view.cells(&self.label_column)?.iter().enumerate() {
            if cell.is_missing() {
                continue;
            }
            let target = read(cell).ok_or_else(|| {
                let found = cell.kind().map_or("missing", |k| k.name());
                HyperError::column_type(&self.label_column, expected, found)
            })?;
            rows.push(row);
            targets.push(target);
        }
        Ok((rows, targets))
    }
}
