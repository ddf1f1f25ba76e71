//! Training: task registry, trainers, pipeline assembly and artifact storage.

pub mod builder;
pub mod domain;
pub mod kmeans;
pub mod linear;
pub mod predictor;
pub mod registry;
pub mod repo_fs;
pub mod service;

pub use builder::ModelBuilder;
pub use domain::{FeatureSpec, Task, TrainerKind, TrainerOptions, TrainerSpec};
pub use predictor::Predictor;
pub use registry::{TaskRegistry, FEATURES_COLUMN};
