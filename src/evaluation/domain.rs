//! Task-oblivious metric extraction.
//!
//! [`ModelMetrics::new`] does not know which task produced the predictions.
//! It tries each evaluator in [`PROBE_ORDER`] and keeps the first that
//! succeeds; when none does the only entry is `Info = -1`.

use std::fmt;

use indexmap::IndexMap;

use crate::common::error::HyperResult;
use crate::data::DataView;

use super::service::{evaluate_binary, evaluate_multiclass, evaluate_regression};

/// One evaluation strategy.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Probe {
    Binary,
    Regression,
    Multiclass,
}

/// Order in which [`ModelMetrics::new`] tries the evaluators.
pub const PROBE_ORDER: [Probe; 3] = [Probe::Binary, Probe::Regression, Probe::Multiclass];

impl Probe {
    /// Run this evaluator, returning its metrics in reporting order.
    pub fn evaluate(
        self,
        predictions: &DataView,
        label: &str,
    ) -> HyperResult<Vec<(&'static str, f64)>> {
        Ok(match self {
            Probe::Binary => {
                let m = evaluate_binary(predictions, label)?;
                vec![
                    ("Accuracy", m.accuracy),
                    ("F1Score", m.f1_score),
                    ("AUC", m.auc),
                ]
            }
            Probe::Regression => {
                let m = evaluate_regression(predictions, label)?;
                vec![("RSquared", m.r_squared), ("RMSE", m.rmse)]
            }
            Probe::Multiclass => {
                let m = evaluate_multiclass(predictions, label)?;
                vec![
                    ("MicroAccuracy", m.micro_accuracy),
                    ("MacroAccuracy", m.macro_accuracy),
                ]
            }
        })
    }
}

/// Named metric values in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelMetrics {
    metrics: IndexMap<String, f64>,
}

impl ModelMetrics {
    /// Score `predictions` against `label`, probing evaluators in order.
    ///
    /// `training_data` is the dataset the model was fit on; it only feeds the
    /// debug log.
    pub fn new(label: &str, predictions: &DataView, training_data: &DataView) -> Self {
        tracing::debug!(
            label,
            rows = predictions.num_rows(),
            training_rows = training_data.num_rows(),
            "probing evaluators"
        );
        for probe in PROBE_ORDER {
            match probe.evaluate(predictions, label) {
                Ok(values) => return Self::from_pairs(values),
                Err(err) => tracing::debug!(?probe, error = %err, "evaluator did not apply"),
            }
        }
        Self::from_pairs(vec![("Info", -1.0)])
    }

    /// Score `predictions` with one evaluator, without probing.
    pub fn for_probe(probe: Probe, label: &str, predictions: &DataView) -> HyperResult<Self> {
        probe.evaluate(predictions, label).map(Self::from_pairs)
    }

    fn from_pairs(values: Vec<(&'static str, f64)>) -> Self {
        Self {
            metrics: values
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }

    pub fn get_all_metrics(&self) -> &IndexMap<String, f64> {
        &self.metrics
    }

    /// Value of `name`, or NaN when absent.
    pub fn get_metric(&self, name: &str) -> f64 {
        self.metrics.get(name).copied().unwrap_or(f64::NAN)
    }

    /// Report text: a `Model Metrics:` line, then one `name: value` line per
    /// metric in insertion order.
    pub fn print_metrics(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ModelMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model Metrics:")?;
        for (name, value) in &self.metrics {
            writeln!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Cell, ColumnData};

    fn regression_view() -> DataView {
        let mut view = DataView::new(3);
        let labels = [1.0, 2.0, 3.0].map(Cell::Number).to_vec();
        view.put("y", ColumnData::Cells(labels)).unwrap();
        view.put("Score", ColumnData::Float(vec![1.0, 2.0, 3.0]))
            .unwrap();
        view
    }

    #[test]
    fn falls_through_to_regression() {
        let view = regression_view();
        let metrics = ModelMetrics::new("y", &view, &view);
        let keys: Vec<_> = metrics.get_all_metrics().keys().cloned().collect();
        assert_eq!(keys, ["RSquared", "RMSE"]);
        assert_eq!(metrics.get_metric("RMSE"), 0.0);
    }

    #[test]
    fn no_evaluator_yields_info_sentinel() {
        let view = DataView::new(0);
        let metrics = ModelMetrics::new("y", &view, &view);
        assert_eq!(metrics.get_metric("Info"), -1.0);
        assert_eq!(metrics.get_all_metrics().len(), 1);
    }

    #[test]
    fn absent_metrics_are_nan() {
        let view = regression_view();
        let metrics = ModelMetrics::new("y", &view, &view);
        assert!(metrics.get_metric("NonexistentKey").is_nan());
    }

    #[test]
    fn report_lists_entries_in_order() {
        let view = regression_view();
        let report = ModelMetrics::new("y", &view, &view).print_metrics();
        assert_eq!(report, "Model Metrics:\nRSquared: 1\nRMSE: 0\n");
    }

    #[test]
    fn explicit_probe_skips_probing() {
        let view = regression_view();
        assert!(ModelMetrics::for_probe(Probe::Binary, "y", &view).is_err());
        let probe = Probe::Regression;
        let metrics = ModelMetrics::for_probe(probe, "y", &view).unwrap();
        assert_eq!(metrics.get_all_metrics().len(), 2);
    }
}
