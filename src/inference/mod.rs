//! Inference: single-row engine, batch prediction and label conversion.

pub mod domain;
pub mod service;

pub use domain::{Label, PredictionEngine};
pub use service::predict_batch;
