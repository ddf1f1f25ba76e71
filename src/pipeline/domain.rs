//! Estimator chains and the fitted pipelines they produce.
//!
//! An [`EstimatorChain`] is fit stage by stage: each stage learns from the
//! output of the stages before it. The result is a [`FittedPipeline`], an
//! immutable list of [`Transform`]s held behind `Arc` so that appending a new
//! pipeline shares the existing stages instead of copying or refitting them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::common::error::HyperResult;
use crate::data::{Cell, DataView};
use crate::training::predictor::Predictor;
use crate::training::TrainerSpec;

use super::transforms;

/// Unfit pipeline stage.
#[derive(Clone, Debug, PartialEq)]
pub enum EstimatorStage {
    /// Assemble `inputs` into the vector column `output`.
    Concatenate { output: String, inputs: Vec<String> },
    /// Learn a key vocabulary for `column`.
    MapValueToKey { column: String },
    /// Fit a predictor.
    Trainer(TrainerSpec),
}

impl EstimatorStage {
    pub fn fit(&self, view: &DataView) -> HyperResult<Transform> {
        match self {
            EstimatorStage::Concatenate { output, inputs } => Ok(Transform::Concatenate {
                output: output.clone(),
                inputs: inputs.clone(),
            }),
            EstimatorStage::MapValueToKey { column } => Ok(Transform::KeyMap {
                column: column.clone(),
                vocabulary: transforms::build_vocabulary(view, column)?,
            }),
            EstimatorStage::Trainer(spec) => Ok(Transform::Predictor {
                features: spec.features_column.clone(),
                predictor: spec.fit(view)?,
            }),
        }
    }
}

/// Ordered list of unfit stages.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EstimatorChain {
    stages: Vec<EstimatorStage>,
}

impl EstimatorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(mut self, stage: EstimatorStage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[EstimatorStage] {
        &self.stages
    }

    /// Fit every stage in order on `data`.
    pub fn fit(&self, data: &DataView) -> HyperResult<FittedPipeline> {
        let mut view = data.clone();
        let mut stages = Vec::with_capacity(self.stages.len());
        for (index, stage) in self.stages.iter().enumerate() {
            let transform = stage.fit(&view)?;
            if index + 1 < self.stages.len() {
                transform.apply(&mut view)?;
            }
            stages.push(Arc::new(transform));
        }
        Ok(FittedPipeline { stages })
    }
}

/// Fitted, immutable pipeline stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Transform {
    Concatenate {
        output: String,
        inputs: Vec<String>,
    },
    KeyMap {
        column: String,
        vocabulary: Arc<[Cell]>,
    },
    Predictor {
        features: String,
        predictor: Predictor,
    },
}

impl Transform {
    /// Apply this stage to `view` in place.
    pub fn apply(&self, view: &mut DataView) -> HyperResult<()> {
        match self {
            Transform::Concatenate { output, inputs } => {
                transforms::concatenate(view, output, inputs)
            }
            Transform::KeyMap { column, vocabulary } => {
                transforms::map_to_keys(view, column, vocabulary)
            }
            Transform::Predictor { features, predictor } => {
                let columns = predictor.predict(view.vectors(features)?.view())?;
                for (name, data) in columns {
                    view.put(name, data)?;
                }
                Ok(())
            }
        }
    }
}

/// Fitted pipeline. Cloning and appending share stages.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FittedPipeline {
    stages: Vec<Arc<Transform>>,
}

impl FittedPipeline {
    pub fn stages(&self) -> &[Arc<Transform>] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run `data` through every stage.
    pub fn transform(&self, data: &DataView) -> HyperResult<DataView> {
        let mut view = data.clone();
        for stage in &self.stages {
            stage.apply(&mut view)?;
        }
        Ok(view)
    }

    /// New pipeline running `self` then `next`.
    pub fn append(&self, next: &FittedPipeline) -> FittedPipeline {
        FittedPipeline {
            stages: self.stages.iter().chain(&next.stages).cloned().collect(),
        }
    }
}
