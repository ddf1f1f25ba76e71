//! Incremental fine-tuning of trained models.
//!
//! Fine-tuning fits a fresh trainer on data already transformed by the
//! existing pipeline and appends it. Existing stages are shared, never refit.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::common::error::{HyperError, HyperResult};
use crate::common::log::log_result;
use crate::common::time;
use crate::data::load_records;
use crate::inference::Label;
use crate::training::service::fine_tune_chain;
use crate::training::{TaskRegistry, TrainerOptions};

use super::trained::TrainedModel;

pub const DEFAULT_MAX_ITERATIONS: u32 = 100;
pub const DEFAULT_L2_REGULARIZATION: f32 = 0.01;

/// Hyperparameters stored on a model.
///
/// [`ModelTuning::fine_tune_with`] takes its own values and does not read
/// these.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TuningConfig {
    pub max_iterations: u32,
    pub l2_regularization: f32,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            l2_regularization: DEFAULT_L2_REGULARIZATION,
        }
    }
}

fn check_l2(value: f32) -> HyperResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(HyperError::InvalidConfig(format!(
            "l2 regularization must be a non-negative number, got {value}"
        )))
    }
}

/// Fine-tuning capability of a trained model.
pub trait ModelTuning: Sized {
    type Record;

    fn maximum_number_of_iterations(&self) -> u32;

    fn set_maximum_number_of_iterations(&mut self, value: u32);

    fn l2_regularization(&self) -> f32;

    /// Rejects negative and non-finite values.
    fn set_l2_regularization(&mut self, value: f32) -> HyperResult<()>;

    /// Fine-tune with the default hyperparameters.
    fn fine_tune(&self, data: &[Self::Record]) -> HyperResult<Self> {
        self.fine_tune_with(data, DEFAULT_MAX_ITERATIONS, DEFAULT_L2_REGULARIZATION)
    }

    /// Fit a new trainer on `data` and return a model running the existing
    /// pipeline followed by it.
    fn fine_tune_with(
        &self,
        data: &[Self::Record],
        max_iterations: u32,
        l2_regularization: f32,
    ) -> HyperResult<Self>;
}

impl<T, L> ModelTuning for TrainedModel<T, L>
where
    T: Serialize + DeserializeOwned,
    L: Label,
{
    type Record = T;

    fn maximum_number_of_iterations(&self) -> u32 {
        self.tuning.max_iterations
    }

    fn set_maximum_number_of_iterations(&mut self, value: u32) {
        self.tuning.max_iterations = value;
    }

    fn l2_regularization(&self) -> f32 {
        self.tuning.l2_regularization
    }

    fn set_l2_regularization(&mut self, value: f32) -> HyperResult<()> {
        check_l2(value)?;
        self.tuning.l2_regularization = value;
        Ok(())
    }

    fn fine_tune_with(
        &self,
        data: &[T],
        max_iterations: u32,
        l2_regularization: f32,
    ) -> HyperResult<Self> {
        let start = time::now_ms();
        let result = self.fine_tune_inner(data, max_iterations, l2_regularization);
        log_result("model", "fine_tune", start, result)
    }
}

impl<T, L> TrainedModel<T, L>
where
    T: Serialize + DeserializeOwned,
    L: Label,
{
    fn fine_tune_inner(
        &self,
        data: &[T],
        max_iterations: u32,
        l2_regularization: f32,
    ) -> HyperResult<Self> {
        if !TaskRegistry::supports_fine_tune(self.task) {
            return Err(HyperError::UnsupportedTask(self.task));
        }
        check_l2(l2_regularization)?;
        let options = TrainerOptions {
            max_iterations,
            l2_regularization,
            ..TrainerOptions::default()
        };
        let chain = fine_tune_chain(self.task, &self.features, options)?;

        let view = load_records(data)?;
        let intermediate = self.pipeline.transform(&view)?;
        let tail = chain.fit(&intermediate)?;
        tracing::debug!(
            task = %self.task,
            rows = view.num_rows(),
            stages = self.pipeline.len() + tail.len(),
            "fine-tuned pipeline"
        );

        Ok(TrainedModel::new(
            self.pipeline.append(&tail),
            Arc::new(view),
            self.task,
            self.features.clone(),
            self.tuning,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_must_be_finite_and_non_negative() {
        assert!(check_l2(0.0).is_ok());
        assert!(check_l2(2.5).is_ok());
        assert!(matches!(check_l2(-0.1), Err(HyperError::InvalidConfig(_))));
        assert!(check_l2(f32::NAN).is_err());
        assert!(check_l2(f32::INFINITY).is_err());
    }

    #[test]
    fn tuning_defaults() {
        let config = TuningConfig::default();
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.l2_regularization, 0.01);
    }
}
