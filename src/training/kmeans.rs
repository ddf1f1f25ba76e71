//! Centroid clustering with k-means++ seeding and Lloyd iterations.

use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::common::error::{HyperError, HyperResult};

/// Fitted centroids, stored row-major (`k × dims`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KMeansModel {
    centroids: Vec<f32>,
    k: usize,
    dims: usize,
}

impl KMeansModel {
    pub fn num_clusters(&self) -> usize {
        self.k
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn centroid(&self, cluster: usize) -> &[f32] {
        &self.centroids[cluster * self.dims..(cluster + 1) * self.dims]
    }

    /// Squared distance from `row` to every centroid.
    pub fn distances(&self, row: ArrayView1<'_, f32>) -> Vec<f32> {
        (0..self.k)
            .map(|cluster| squared_distance(row, self.centroid(cluster)))
            .collect()
    }

    /// Index of the nearest centroid.
    pub fn nearest(&self, row: ArrayView1<'_, f32>) -> usize {
        nearest(&self.distances(row))
    }
}

fn squared_distance(row: ArrayView1<'_, f32>, centroid: &[f32]) -> f32 {
    row.iter()
        .zip(centroid)
        .map(|(a, b)| (a - b) * (a - b))
        .sum()
}

fn nearest(distances: &[f32]) -> usize {
    distances
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map_or(0, |(index, _)| index)
}

/// k-means trainer settings.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KMeansTrainer {
    pub clusters: usize,
    pub max_iterations: u32,
    pub seed: u64,
}

impl KMeansTrainer {
    pub fn fit(&self, features: ArrayView2<'_, f32>) -> HyperResult<KMeansModel> {
        let (rows, dims) = features.dim();
        if rows == 0 {
            return Err(HyperError::InvalidData("no rows to cluster".into()));
        }
        let k = self.clusters.min(rows);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        let mut centroids = self.seed_centroids(features, k, &mut rng);
        let mut assignment = vec![usize::MAX; rows];

        for iteration in 0..self.max_iterations.max(1) {
            let mut changed = false;
            for (row, slot) in features.rows().into_iter().zip(assignment.iter_mut()) {
                let distances: Vec<f32> = centroids
                    .rows()
                    .into_iter()
                    .map(|c| squared_distance(row, c.as_slice().unwrap_or(&[])))
                    .collect();
                let best = nearest(&distances);
                if *slot != best {
                    *slot = best;
                    changed = true;
                }
            }
            if !changed {
                tracing::debug!(iteration, "k-means converged");
                break;
            }

            let mut sums = Array2::<f32>::zeros((k, dims));
            let mut counts = vec![0usize; k];
            for (row, &cluster) in features.rows().into_iter().zip(&assignment) {
                let mut target = sums.row_mut(cluster);
                target += &row;
                counts[cluster] += 1;
            }
            for (cluster, count) in counts.iter().enumerate() {
                // Empty clusters keep their previous centroid.
                if *count > 0 {
                    let mean = sums.row(cluster).mapv(|v| v / *count as f32);
                    centroids.row_mut(cluster).assign(&mean);
                }
            }
        }

        Ok(KMeansModel {
            centroids: centroids.iter().copied().collect(),
            k,
            dims,
        })
    }

    /// k-means++: first centroid uniform, the rest proportional to squared distance.
    fn seed_centroids(
        &self,
        features: ArrayView2<'_, f32>,
        k: usize,
        rng: &mut Xoshiro256PlusPlus,
    ) -> Array2<f32> {
        let (rows, dims) = features.dim();
        let mut centroids = Array2::<f32>::zeros((k, dims));
        let first = rng.gen_range(0..rows);
        centroids.row_mut(0).assign(&features.row(first));

        let mut closest: Vec<f32> = features
            .rows()
            .into_iter()
            .map(|row| squared_distance(row, centroids.row(0).as_slice().unwrap_or(&[])))
            .collect();

        for chosen in 1..k {
            let total: f32 = closest.iter().sum();
            let pick = if total > 0.0 {
                let mut threshold = rng.gen::<f32>() * total;
                closest
                    .iter()
                    .position(|d| {
                        threshold -= d;
                        threshold <= 0.0
                    })
                    .unwrap_or(rows - 1)
            } else {
                rng.gen_range(0..rows)
            };
            centroids.row_mut(chosen).assign(&features.row(pick));
            for (row, best) in features.rows().into_iter().zip(closest.iter_mut()) {
                let d = squared_distance(row, centroids.row(chosen).as_slice().unwrap_or(&[]));
                *best = best.min(d);
            }
        }
        centroids
    }
}
