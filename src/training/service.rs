//! Service layer assembling estimator chains for training and fine-tuning.

use crate::common::config::EngineCfg;
use crate::common::error::HyperResult;
use crate::pipeline::{EstimatorChain, EstimatorStage};

use super::domain::{FeatureSpec, Task, TrainerOptions};
use super::registry::{TaskRegistry, FEATURES_COLUMN};

impl From<&EngineCfg> for TrainerOptions {
    fn from(cfg: &EngineCfg) -> Self {
        Self {
            max_iterations: cfg.max_iterations,
            l2_regularization: cfg.l2_regularization,
            number_of_clusters: cfg.kmeans_clusters,
            seed: cfg.seed,
        }
    }
}

/// Full training chain: feature assembly, label keys, then the task's trainer.
///
/// The label is key-encoded for every task, regression and clustering
/// included.
pub fn training_chain(
    task: Task,
    spec: &FeatureSpec,
    options: TrainerOptions,
) -> HyperResult<EstimatorChain> {
    let trainer = TaskRegistry::trainer(task, spec, options)?;
    Ok(EstimatorChain::new()
        .append(EstimatorStage::Concatenate {
            output: FEATURES_COLUMN.to_string(),
            inputs: spec.features().to_vec(),
        })
        .append(EstimatorStage::MapValueToKey {
            column: spec.label().to_string(),
        })
        .append(EstimatorStage::Trainer(trainer)))
}

/// Trainer-only chain fit on data already transformed by an existing pipeline.
pub fn fine_tune_chain(
    task: Task,
    spec: &FeatureSpec,
    options: TrainerOptions,
) -> HyperResult<EstimatorChain> {
    let trainer = TaskRegistry::fine_tune_trainer(task, spec, options)?;
    let chain = EstimatorChain::new();
    Ok(chain.append(EstimatorStage::Trainer(trainer)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::HyperError;
    use crate::training::TrainerKind;

    fn spec() -> FeatureSpec {
        let features = vec!["b".to_string(), "a".to_string()];
        FeatureSpec::new(features, Some("y".into())).unwrap()
    }

    #[test]
    fn training_chain_has_three_stages_in_order() {
        let options = TrainerOptions::default();
        let chain = training_chain(Task::Regression, &spec(), options).unwrap();
        let stages = chain.stages();
        assert_eq!(stages.len(), 3);
        assert_eq!(
            stages[0],
            EstimatorStage::Concatenate {
                output: "Features".into(),
                inputs: vec!["b".into(), "a".into()],
            }
        );
        assert_eq!(
            stages[1],
            EstimatorStage::MapValueToKey { column: "y".into() }
        );
        assert!(matches!(
            &stages[2],
            EstimatorStage::Trainer(t) if t.kind == TrainerKind::LeastSquares
        ));
    }

    #[test]
    fn fine_tune_chain_is_trainer_only() {
        let options = TrainerOptions::default();
        let chain = fine_tune_chain(Task::Regression, &spec(), options).unwrap();
        assert_eq!(chain.stages().len(), 1);
        assert!(matches!(
            fine_tune_chain(Task::Clustering, &spec(), TrainerOptions::default()),
            Err(HyperError::UnsupportedTask(Task::Clustering))
        ));
    }

    #[test]
    fn options_follow_the_engine_config() {
        let cfg = EngineCfg {
            seed: 7,
            max_iterations: 12,
            l2_regularization: 0.5,
            kmeans_clusters: 3,
        };
        let options = TrainerOptions::from(&cfg);
        assert_eq!(options.seed, 7);
        assert_eq!(options.max_iterations, 12);
        assert_eq!(options.number_of_clusters, 3);
    }
}
