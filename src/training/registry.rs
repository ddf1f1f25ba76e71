//! Task to trainer mapping.
//!
//! Both tables are consts, so an unsupported task is a lookup miss and full
//! coverage can be checked by a test.

use crate::common::error::{HyperError, HyperResult};

use super::domain::{FeatureSpec, Task, TrainerKind, TrainerOptions, TrainerSpec};

/// Name of the assembled feature vector column.
pub const FEATURES_COLUMN: &str = "Features";

const TRAINERS: [(Task, TrainerKind); 4] = [
    (Task::BinaryClassification, TrainerKind::Logistic),
    (Task::MulticlassClassification, TrainerKind::MaximumEntropy),
    (Task::Regression, TrainerKind::LeastSquares),
    (Task::Clustering, TrainerKind::KMeans),
];

const FINE_TUNABLE: [Task; 3] = [
    Task::BinaryClassification,
    Task::MulticlassClassification,
    Task::Regression,
];

/// Finite task registry.
pub struct TaskRegistry;

impl TaskRegistry {
    /// Trainer family for initial training, if the task is mapped.
    pub fn trainer_kind(task: Task) -> Option<TrainerKind> {
        TRAINERS
            .iter()
            .find(|(mapped, _)| *mapped == task)
            .map(|(_, kind)| *kind)
    }

    pub fn supports_fine_tune(task: Task) -> bool {
        FINE_TUNABLE.contains(&task)
    }

    /// Tasks that can be trained from scratch.
    pub fn trainable_tasks() -> impl Iterator<Item = Task> {
        TRAINERS.iter().map(|(task, _)| *task)
    }

    /// Trainer stage for the initial `train` call.
    pub fn trainer(
        task: Task,
        spec: &FeatureSpec,
        options: TrainerOptions,
    ) -> HyperResult<TrainerSpec> {
        let Some(kind) = Self::trainer_kind(task) else {
            return Err(HyperError::UnsupportedTask(task));
        };
        Ok(Self::build(kind, spec, options))
    }

    /// Trainer stage for a fine-tuning pass.
    pub fn fine_tune_trainer(
        task: Task,
        spec: &FeatureSpec,
        options: TrainerOptions,
    ) -> HyperResult<TrainerSpec> {
        if !Self::supports_fine_tune(task) {
            return Err(HyperError::UnsupportedTask(task));
        }
        Self::trainer(task, spec, options)
    }

    fn build(kind: TrainerKind, spec: &FeatureSpec, options: TrainerOptions) -> TrainerSpec {
        TrainerSpec {
            kind,
            features_column: FEATURES_COLUMN.to_string(),
            label_column: spec.label().to_string(),
            options,
        }
    }
}
