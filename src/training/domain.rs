//! Domain types for tasks, feature specs and trainer configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::error::{HyperError, HyperResult};
use crate::evaluation::Probe;

/// Supported machine learning task types.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Task {
    #[default]
    BinaryClassification,
    MulticlassClassification,
    Regression,
    Clustering,
    Recommendation,
    Anomaly,
}

impl Task {
    pub const ALL: [Task; 6] = [
        Task::BinaryClassification,
        Task::MulticlassClassification,
        Task::Regression,
        Task::Clustering,
        Task::Recommendation,
        Task::Anomaly,
    ];

    /// Evaluator that scores this task's predictions, if any.
    pub fn probe(self) -> Option<Probe> {
        match self {
            Task::BinaryClassification => Some(Probe::Binary),
            Task::Regression => Some(Probe::Regression),
            Task::MulticlassClassification => Some(Probe::Multiclass),
            Task::Clustering | Task::Recommendation | Task::Anomaly => None,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Ordered feature columns plus the label column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    features: Vec<String>,
    label: String,
}

impl FeatureSpec {
    pub fn new(features: Vec<String>, label: Option<String>) -> HyperResult<Self> {
        if features.is_empty() {
            return Err(HyperError::MissingFeatures);
        }
        let label = label.ok_or(HyperError::MissingLabel)?;
        Ok(Self { features, label })
    }

    /// Feature columns in assembly order.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Trainer families the registry can construct.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TrainerKind {
    /// L2-regularized logistic regression.
    Logistic,
    /// L2-regularized softmax (maximum entropy) classifier.
    MaximumEntropy,
    /// L2-regularized least-squares regression.
    LeastSquares,
    /// Centroid clustering.
    KMeans,
}

/// Hyperparameters handed to a trainer.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainerOptions {
    pub max_iterations: u32,
    pub l2_regularization: f32,
    pub number_of_clusters: usize,
    pub seed: u64,
}

impl TrainerOptions {
    pub fn validate(&self) -> HyperResult<()> {
        if !self.l2_regularization.is_finite() || self.l2_regularization < 0.0 {
            return Err(HyperError::InvalidConfig(format!(
                "l2 regularization must be a non-negative number, got {}",
                self.l2_regularization
            )));
        }
        if self.number_of_clusters == 0 {
            return Err(HyperError::InvalidConfig("number of clusters must be positive".into()));
        }
        Ok(())
    }
}

impl Default for TrainerOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            l2_regularization: 0.01,
            number_of_clusters: 5,
            seed: 42,
        }
    }
}

/// Unfit trainer stage: which family, which columns, which hyperparameters.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainerSpec {
    pub kind: TrainerKind,
    pub features_column: String,
    pub label_column: String,
    pub options: TrainerOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_spec_requires_features_then_label() {
        assert!(matches!(
            FeatureSpec::new(vec![], Some("y".into())),
            Err(HyperError::MissingFeatures)
        ));
        assert!(matches!(
            FeatureSpec::new(vec!["x".into()], None),
            Err(HyperError::MissingLabel)
        ));
        let features = vec!["b".to_string(), "a".to_string()];
        let spec = FeatureSpec::new(features, Some("y".into())).unwrap();
        assert_eq!(spec.features(), ["b", "a"]);
        assert_eq!(spec.label(), "y");
    }

    #[test]
    fn options_reject_negative_l2() {
        let options = TrainerOptions {
            l2_regularization: -0.5,
            ..TrainerOptions::default()
        };
        assert!(matches!(options.validate(), Err(HyperError::InvalidConfig(_))));
        assert!(TrainerOptions::default().validate().is_ok());
    }

    #[test]
    fn task_display_uses_variant_name() {
        let name = Task::MulticlassClassification.to_string();
        assert_eq!(name, "MulticlassClassification");
        assert_eq!(Task::Clustering.probe(), None);
    }
}
