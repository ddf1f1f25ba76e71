//! Evaluation: metric calculators and the probing metrics extractor.

pub mod domain;
pub mod service;

pub use domain::{ModelMetrics, Probe, PROBE_ORDER};
pub use service::{BinaryMetrics, MulticlassMetrics, RegressionMetrics};
