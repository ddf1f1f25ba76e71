// lib.rs - task-driven model facade
//!
//! `hyperml` trains, evaluates, persists and fine-tunes tabular models behind
//! one builder. Pick a [`Task`], name the feature and label columns, and call
//! [`ModelBuilder::train`]:
//!
//! ```no_run
//! use hyperml::{create_model_builder, ModelTuning, Task};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Point {
//!     x1: f32,
//!     x2: f32,
//!     label: bool,
//! }
//!
//! # fn main() -> hyperml::HyperResult<()> {
//! let data = vec![
//!     Point { x1: 0.1, x2: 0.2, label: false },
//!     Point { x1: 0.9, x2: 0.8, label: true },
//! ];
//! let mut model = create_model_builder::<Point, bool>()
//!     .set_task(Task::BinaryClassification)
//!     .with_features(["x1", "x2"])
//!     .with_label("label")
//!     .train(&data)?;
//!
//! print!("{}", model.evaluate(&data)?.print_metrics());
//! let tuned = model.fine_tune(&data)?;
//! let _ = (model.predict(&data[0])?, tuned.predict_batch(&data)?);
//! # Ok(())
//! # }
//! ```
pub mod common;
pub mod data;
pub mod evaluation;
pub mod inference;
pub mod model;
pub mod pipeline;
pub mod training;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use common::{EngineCfg, ErrorCode, HyperError, HyperResult};
pub use data::{Cell, DataView, Schema, TextLoaderOptions};
pub use evaluation::{ModelMetrics, Probe};
pub use inference::Label;
pub use model::{ModelTuning, TrainedModel, TuningConfig};
pub use pipeline::FittedPipeline;
pub use training::{FeatureSpec, ModelBuilder, Task, TaskRegistry};

/// Builder for records of type `T` predicting labels of type `L`,
/// configured from the process environment.
pub fn create_model_builder<T, L>() -> ModelBuilder<T, L>
where
    T: Serialize + DeserializeOwned,
    L: Label,
{
    ModelBuilder::new()
}
