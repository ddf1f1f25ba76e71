//! Fit/transform pipelines: feature assembly, label keys and trainers.

pub mod domain;
pub mod transforms;

pub use domain::{EstimatorChain, EstimatorStage, FittedPipeline, Transform};
