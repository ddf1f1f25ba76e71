//! Trained models and their fine-tuning capability.

pub mod trained;
pub mod tuning;

pub use trained::TrainedModel;
pub use tuning::{ModelTuning, TuningConfig};
