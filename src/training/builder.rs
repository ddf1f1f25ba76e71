//! Fluent model configuration and initial training.

use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::common::config::EngineCfg;
use crate::common::error::HyperResult;
use crate::common::log::log_result;
use crate::common::time;
use crate::data::{load_records, load_text_file, DataView, TextLoaderOptions};
use crate::inference::Label;
use crate::model::{TrainedModel, TuningConfig};

use super::domain::{FeatureSpec, Task, TrainerOptions};
use super::service::training_chain;

const MODULE: &str = "training";

/// Accumulates task, columns and an optional dataset, then trains.
///
/// Every configuration call consumes the builder and hands it back.
pub struct ModelBuilder<T, L> {
    task: Task,
    features: Vec<String>,
    label: Option<String>,
    data: Option<Arc<DataView>>,
    cfg: EngineCfg,
    _marker: PhantomData<fn(&T) -> L>,
}

impl<T, L> Default for ModelBuilder<T, L>
where
    T: Serialize + DeserializeOwned,
    L: Label,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, L> ModelBuilder<T, L>
where
    T: Serialize + DeserializeOwned,
    L: Label,
{
    /// Builder configured from the process environment.
    pub fn new() -> Self {
        Self {
            task: Task::default(),
            features: Vec::new(),
            label: None,
            data: None,
            cfg: EngineCfg::load(),
            _marker: PhantomData,
        }
    }

    pub fn with_config(mut self, cfg: EngineCfg) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn set_task(mut self, task: Task) -> Self {
        self.task = task;
        self
    }

    /// Replace the feature columns; their order is the feature vector order.
    pub fn with_features<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_label(mut self, name: impl Into<String>) -> Self {
        self.label = Some(name.into());
        self
    }

    /// Load a delimited text file now. It replaces whatever `train` is given.
    pub fn load_data(
        mut self,
        path: impl AsRef<Path>,
        options: TextLoaderOptions,
    ) -> HyperResult<Self> {
        let start = time::now_ms();
        let result = load_text_file::<T>(path, options);
        let loaded = log_result(MODULE, "load_data", start, result)?;
        self.data = Some(Arc::new(loaded));
        Ok(self)
    }

    pub fn task(&self) -> Task {
        self.task
    }

    pub fn config(&self) -> &EngineCfg {
        &self.cfg
    }

    /// Validated feature columns and label.
    pub fn feature_spec(&self) -> HyperResult<FeatureSpec> {
        FeatureSpec::new(self.features.clone(), self.label.clone())
    }

    /// Fit the task's pipeline and wrap it in a [`TrainedModel`].
    ///
    /// Features, label and task are checked before `data` is read. A dataset
    /// from [`ModelBuilder::load_data`] takes precedence over `data`.
    pub fn train(&self, data: &[T]) -> HyperResult<TrainedModel<T, L>> {
        let start = time::now_ms();
        let result = self.fit(data);
        log_result(MODULE, "train", start, result)
    }

    fn fit(&self, data: &[T]) -> HyperResult<TrainedModel<T, L>> {
        let spec = self.feature_spec()?;
        let chain = training_chain(self.task, &spec, TrainerOptions::from(&self.cfg))?;
        let training_data = match &self.data {
            Some(loaded) => Arc::clone(loaded),
            None => Arc::new(load_records(data)?),
        };
        let pipeline = chain.fit(&training_data)?;
        tracing::debug!(
            task = %self.task,
            rows = training_data.num_rows(),
            stages = pipeline.len(),
            "pipeline fitted"
        );
        Ok(TrainedModel::new(
            pipeline,
            training_data,
            self.task,
            spec,
            TuningConfig::default(),
        ))
    }
}
