//! Trained model lifecycle: prediction, evaluation and persistence.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::common::error::HyperResult;
use crate::common::log::log_result;
use crate::common::time;
use crate::data::{load_records, DataView, Schema};
use crate::evaluation::ModelMetrics;
use crate::inference::{predict_batch, Label, PredictionEngine};
use crate::pipeline::FittedPipeline;
use crate::training::repo_fs;
use crate::training::{FeatureSpec, Task};

use super::tuning::TuningConfig;

const MODULE: &str = "model";

/// Fitted pipeline plus everything needed to predict, evaluate and persist.
///
/// The pipeline is never refit. Fine-tuning and loading return new models.
pub struct TrainedModel<T, L> {
    pub(super) pipeline: FittedPipeline,
    pub(super) training_data: Arc<DataView>,
    pub(super) task: Task,
    pub(super) features: FeatureSpec,
    pub(super) tuning: TuningConfig,
    engine: Option<PredictionEngine<T, L>>,
}

impl<T, L> TrainedModel<T, L>
where
    T: Serialize + DeserializeOwned,
    L: Label,
{
    pub(crate) fn new(
        pipeline: FittedPipeline,
        training_data: Arc<DataView>,
        task: Task,
        features: FeatureSpec,
        tuning: TuningConfig,
    ) -> Self {
        Self {
            pipeline,
            training_data,
            task,
            features,
            tuning,
            engine: None,
        }
    }

    pub fn task(&self) -> Task {
        self.task
    }

    pub fn feature_spec(&self) -> &FeatureSpec {
        &self.features
    }

    pub fn pipeline(&self) -> &FittedPipeline {
        &self.pipeline
    }

    /// Schema of the dataset the pipeline was fit on.
    pub fn training_schema(&self) -> Schema {
        self.training_data.schema()
    }

    /// Row count of the dataset the last trainer stage was fit on.
    pub fn training_rows(&self) -> usize {
        self.training_data.num_rows()
    }

    /// Predict one item with the model's single-row engine, binding it on
    /// first use.
    pub fn predict(&mut self, item: &T) -> HyperResult<L> {
        let pipeline = &self.pipeline;
        self.engine
            .get_or_insert_with(|| PredictionEngine::new(pipeline.clone()))
            .predict(item)
    }

    /// Predict every item, preserving input order.
    pub fn predict_batch(&self, items: &[T]) -> HyperResult<Vec<L>> {
        predict_batch(&self.pipeline, items)
    }

    /// Score `test_data` with whichever evaluator fits the predictions.
    pub fn evaluate(&self, test_data: &[T]) -> HyperResult<ModelMetrics> {
        let start = time::now_ms();
        let label = self.features.label();
        let result = load_records(test_data)
            .and_then(|view| self.pipeline.transform(&view))
            .map(|scored| ModelMetrics::new(label, &scored, &self.training_data));
        log_result(MODULE, "evaluate", start, result)
    }

    /// Write the fitted pipeline and training schema to `path`.
    pub fn save_model(&self, path: impl AsRef<Path>) -> HyperResult<()> {
        let start = time::now_ms();
        let result = repo_fs::save_pipeline(path.as_ref(), &self.training_schema(), &self.pipeline);
        log_result(MODULE, "save_model", start, result)
    }

    /// Load a fitted pipeline from `path` into a new model.
    ///
    /// The new model keeps this model's training data, task and features.
    /// The schema stored in the artifact is not consulted.
    pub fn load_model(&self, path: impl AsRef<Path>) -> HyperResult<TrainedModel<T, L>> {
        let start = time::now_ms();
        let result = repo_fs::load_pipeline(path.as_ref()).map(|(schema, pipeline)| {
            tracing::debug!(
                columns = schema.len(),
                stages = pipeline.len(),
                "artifact loaded"
            );
            TrainedModel::new(
                pipeline,
                Arc::clone(&self.training_data),
                self.task,
                self.features.clone(),
                TuningConfig::default(),
            )
        });
        log_result(MODULE, "load_model", start, result)
    }
}

impl<T, L> fmt::Debug for TrainedModel<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainedModel")
            .field("task", &self.task)
            .field("features", &self.features)
            .field("stages", &self.pipeline.len())
            .field("training_rows", &self.training_data.num_rows())
            .field("tuning", &self.tuning)
            .field("engine_bound", &self.engine.is_some())
            .finish()
    }
}
