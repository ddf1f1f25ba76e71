//! Linear models trained by L2-regularized coordinate descent.
//!
//! Each pass visits the bias and then every feature weight of every output
//! group, taking one Newton step per coordinate:
//!
//! ```text
//! grad = Σ g_i x_ij + λ w_j
//! hess = Σ h_i x_ij² + λ
//! w_j -= grad / hess
//! ```
//!
//! Margins are updated in place after every step so each coordinate sees exact
//! gradients. The bias is never regularized.

use ndarray::{ArrayView1, ArrayView2, ArrayViewMut1};
use serde::{Deserialize, Serialize};

use crate::common::error::{HyperError, HyperResult};

const HESS_MIN: f64 = 1e-6;
const TOLERANCE: f64 = 1e-5;

/// Weights and biases of a linear model.
///
/// Layout is feature-major, group-minor, with the biases in the last row:
/// `weights[feature * num_groups + group]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    weights: Vec<f32>,
    num_features: usize,
    num_groups: usize,
}

impl LinearModel {
    pub fn zeros(num_features: usize, num_groups: usize) -> Self {
        Self {
            weights: vec![0.0; (num_features + 1) * num_groups],
            num_features,
            num_groups,
        }
    }

    #[inline]
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    #[inline]
    pub fn num_groups(&self) -> usize {
        self.num_groups
    }

    #[inline]
    pub fn weight(&self, feature: usize, group: usize) -> f32 {
        self.weights[feature * self.num_groups + group]
    }

    #[inline]
    pub fn bias(&self, group: usize) -> f32 {
        self.weights[self.num_features * self.num_groups + group]
    }

    fn add_weight(&mut self, feature: usize, group: usize, delta: f32) {
        self.weights[feature * self.num_groups + group] += delta;
    }

    fn add_bias(&mut self, group: usize, delta: f32) {
        self.weights[self.num_features * self.num_groups + group] += delta;
    }

    /// Raw margins of one row, written into `out` (length `num_groups`).
    ///
    /// NaN features contribute nothing, as in training.
    pub fn margins(&self, row: ArrayView1<'_, f32>, mut out: ArrayViewMut1<'_, f32>) {
        for group in 0..self.num_groups {
            let mut sum = self.bias(group);
            for (feature, value) in row.iter().enumerate() {
                if !value.is_nan() {
                    sum += self.weight(feature, group) * value;
                }
            }
            out[group] = sum;
        }
    }
}

/// Loss minimised by the trainer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Objective {
    /// Binary log loss; targets are 0 or 1.
    Logistic,
    /// Multiclass cross entropy; targets are class indices.
    Softmax,
    /// Squared error; targets are real values.
    Squared,
}

impl Objective {
    /// Gradient and hessian of row `row` for `group`, given all margins.
    fn gradient(self, margins: ArrayView1<'_, f64>, target: f32, group: usize) -> (f64, f64) {
        match self {
            Objective::Logistic => {
                let p = sigmoid(margins[0]);
                (p - f64::from(target), (p * (1.0 - p)).max(HESS_MIN))
            }
            Objective::Softmax => {
                let max = margins.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let denom: f64 = margins.iter().map(|m| (m - max).exp()).sum();
                let p = (margins[group] - max).exp() / denom;
                let y = if target as usize == group { 1.0 } else { 0.0 };
                (p - y, (p * (1.0 - p)).max(HESS_MIN))
            }
            Objective::Squared => (margins[0] - f64::from(target), 1.0),
        }
    }
}

#[inline]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Softmax of `margins` in place.
pub fn softmax(margins: &mut [f32]) {
    let max = margins.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for m in margins.iter_mut() {
        *m = (*m - max).exp();
        sum += *m;
    }
    for m in margins.iter_mut() {
        *m /= sum;
    }
}

/// Coordinate descent settings.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CoordinateDescent {
    pub max_iterations: u32,
    pub lambda: f32,
}

impl CoordinateDescent {
    /// Fit a model on `features` (rows × features) against `targets`.
    pub fn fit(
        &self,
        features: ArrayView2<'_, f32>,
        targets: &[f32],
        objective: Objective,
        num_groups: usize,
    ) -> HyperResult<LinearModel> {
        let (rows, num_features) = features.dim();
        if rows == 0 {
            return Err(HyperError::InvalidData("no labelled rows to train on".into()));
        }
        if targets.len() != rows {
            return Err(HyperError::InvalidData(format!(
                "{} targets for {rows} rows",
                targets.len()
            )));
        }

        let lambda = f64::from(self.lambda);
        let mut model = LinearModel::zeros(num_features, num_groups);
        let mut margins = ndarray::Array2::<f64>::zeros((rows, num_groups));

        for round in 0..self.max_iterations {
            let mut largest_step = 0.0f64;

            for group in 0..num_groups {
                let (sum_grad, sum_hess) = (0..rows).fold((0.0, 0.0), |(g, h), row| {
                    let (gi, hi) = objective.gradient(margins.row(row), targets[row], group);
                    (g + gi, h + hi)
                });
                let delta = -sum_grad / sum_hess;
                model.add_bias(group, delta as f32);
                margins.column_mut(group).mapv_inplace(|m| m + delta);
                largest_step = largest_step.max(delta.abs());

                for feature in 0..num_features {
                    let column = features.column(feature);
                    let current = f64::from(model.weight(feature, group));
                    let (mut sum_grad, mut sum_hess) = (lambda * current, lambda);
                    for row in 0..rows {
                        let x = f64::from(column[row]);
                        if x == 0.0 || x.is_nan() {
                            continue;
                        }
                        let (gi, hi) = objective.gradient(margins.row(row), targets[row], group);
                        sum_grad += gi * x;
                        sum_hess += hi * x * x;
                    }
                    if sum_hess.abs() < 1e-10 {
                        continue;
                    }
                    let delta = -sum_grad / sum_hess;
                    model.add_weight(feature, group, delta as f32);
                    for row in 0..rows {
                        let x = f64::from(column[row]);
                        if !x.is_nan() {
                            margins[[row, group]] += delta * x;
                        }
                    }
                    largest_step = largest_step.max(delta.abs());
                }
            }

            if largest_step < TOLERANCE {
                tracing::debug!(round, "coordinate descent converged");
                break;
            }
        }

        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1, Array2};

    use super::*;

    fn descent(max_iterations: u32, lambda: f32) -> CoordinateDescent {
        CoordinateDescent {
            max_iterations,
            lambda,
        }
    }

    #[test]
    fn recovers_a_linear_function() {
        // y = 2 * x0 - x1 + 1
        let x = array![
            [0.0f32, 1.0],
            [1.0, 0.0],
            [0.5, 0.5],
            [1.0, 1.0],
            [0.2, 0.8],
            [0.9, 0.1]
        ];
        let y: Vec<f32> = x.outer_iter().map(|r| 2.0 * r[0] - r[1] + 1.0).collect();

        let trainer = descent(500, 0.0);
        let model = trainer.fit(x.view(), &y, Objective::Squared, 1).unwrap();
        assert_abs_diff_eq!(model.weight(0, 0), 2.0, epsilon = 1e-2);
        assert_abs_diff_eq!(model.weight(1, 0), -1.0, epsilon = 1e-2);
        assert_abs_diff_eq!(model.bias(0), 1.0, epsilon = 1e-2);
    }

    #[test]
    fn l2_shrinks_weights() {
        let x = array![[1.0f32], [2.0], [3.0], [4.0]];
        let y = [2.0f32, 4.0, 6.0, 8.0];
        let loose = descent(200, 0.0)
            .fit(x.view(), &y, Objective::Squared, 1)
            .unwrap();
        let tight = descent(200, 50.0)
            .fit(x.view(), &y, Objective::Squared, 1)
            .unwrap();
        assert!(tight.weight(0, 0).abs() < loose.weight(0, 0).abs());
    }

    #[test]
    fn separates_two_classes() {
        let x = array![[-2.0f32], [-1.5], [-1.0], [1.0], [1.5], [2.0]];
        let y = [0.0f32, 0.0, 0.0, 1.0, 1.0, 1.0];
        let model = descent(100, 0.01)
            .fit(x.view(), &y, Objective::Logistic, 1)
            .unwrap();

        let mut out = Array1::<f32>::zeros(1);
        model.margins(array![1.2f32].view(), out.view_mut());
        assert!(out[0] > 0.0);
        model.margins(array![-1.2f32].view(), out.view_mut());
        assert!(out[0] < 0.0);
    }

    #[test]
    fn softmax_picks_the_right_class() {
        let x = array![
            [0.0f32, 0.0],
            [0.2, 0.1],
            [3.0, 0.0],
            [3.1, 0.2],
            [0.0, 3.0],
            [0.1, 3.2]
        ];
        let y = [0.0f32, 0.0, 1.0, 1.0, 2.0, 2.0];
        let model = descent(100, 0.01)
            .fit(x.view(), &y, Objective::Softmax, 3)
            .unwrap();

        let mut out = Array2::<f32>::zeros((1, 3));
        model.margins(array![3.0f32, 0.1].view(), out.row_mut(0));
        let mut scores = out.row(0).to_vec();
        softmax(&mut scores);
        assert_abs_diff_eq!(scores.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
        let best = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(best, Some(1));
    }

    #[test]
    fn missing_features_contribute_nothing() {
        let mut model = LinearModel::zeros(2, 1);
        model.add_weight(0, 0, 2.0);
        model.add_weight(1, 0, -1.0);
        model.add_bias(0, 0.5);

        let mut out = Array1::<f32>::zeros(1);
        model.margins(array![f32::NAN, 3.0].view(), out.view_mut());
        assert_abs_diff_eq!(out[0], -2.5);
        model.margins(array![0.0f32, 3.0].view(), out.view_mut());
        assert_abs_diff_eq!(out[0], -2.5);
    }

    #[test]
    fn empty_data_is_rejected() {
        let x = Array2::<f32>::zeros((0, 2));
        let trainer = descent(10, 0.0);
        assert!(trainer.fit(x.view(), &[], Objective::Squared, 1).is_err());
    }
}
