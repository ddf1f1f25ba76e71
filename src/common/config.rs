//! Runtime configuration loaded from the environment.
//!
//! Only the defaults consumed by the initial `train` call live here; fine-tuning
//! hyperparameters are passed per call.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Snapshot of configuration values consumed by the builder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineCfg {
    /// Seed for every randomised step (k-means seeding).
    pub seed: u64,
    /// Passes over the data made by the linear trainers.
    pub max_iterations: u32,
    /// L2 penalty applied by the linear trainers.
    pub l2_regularization: f32,
    /// Number of centroids fitted for the clustering task.
    pub kmeans_clusters: usize,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self {
            seed: 42,
            max_iterations: 100,
            l2_regularization: 0.01,
            kmeans_clusters: 5,
        }
    }
}

impl EngineCfg {
    /// Create a configuration snapshot from the process environment.
    pub fn load() -> Self {
        fn env_or<T: FromStr>(key: &str, default: T) -> T {
            env::var(key)
                .ok()
                .and_then(|raw| raw.trim().parse().ok())
                .unwrap_or(default)
        }

        let defaults = Self::default();
        Self {
            seed: env_or("HYPERML_SEED", defaults.seed),
            max_iterations: env_or("HYPERML_MAX_ITERATIONS", defaults.max_iterations),
            l2_regularization: env_or("HYPERML_L2_REGULARIZATION", defaults.l2_regularization),
            kmeans_clusters: env_or("HYPERML_KMEANS_CLUSTERS", defaults.kmeans_clusters),
        }
    }
}
