//! Metric calculators for scored data views.
//!
//! Each evaluator reads the label column plus the prediction columns its task
//! writes, and fails with an evaluation error when a column is missing or has
//! the wrong shape. Rows whose label is missing are skipped.

use crate::common::error::{HyperError, HyperResult};
use crate::data::{Cell, DataView};
use crate::training::predictor::{PREDICTED_LABEL_COLUMN, PROBABILITY_COLUMN, SCORE_COLUMN};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BinaryMetrics {
    pub accuracy: f64,
    pub f1_score: f64,
    pub auc: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RegressionMetrics {
    pub r_squared: f64,
    pub rmse: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MulticlassMetrics {
    pub micro_accuracy: f64,
    pub macro_accuracy: f64,
}

fn read<T>(result: HyperResult<T>) -> HyperResult<T> {
    result.map_err(|e| HyperError::evaluation(e.to_string()))
}

fn strict_bool(column: &str, cell: &Cell) -> HyperResult<bool> {
    cell.as_bool()
        .ok_or_else(|| HyperError::evaluation(format!("`{column}` value {cell} is not a boolean")))
}

/// Accuracy, F1 of the positive class, and ROC AUC.
pub fn evaluate_binary(view: &DataView, label: &str) -> HyperResult<BinaryMetrics> {
    let labels = read(view.cells(label))?;
    let scores = read(view.floats(SCORE_COLUMN))?;
    let probabilities = read(view.floats(PROBABILITY_COLUMN))?;
    let predicted = read(view.cells(PREDICTED_LABEL_COLUMN))?;

    let mut truth = Vec::new();
    let mut ranked = Vec::new();
    let (mut tp, mut fp, mut fn_, mut correct) = (0usize, 0usize, 0usize, 0usize);
    for (row, cell) in labels.iter().enumerate() {
        if cell.is_missing() {
            continue;
        }
        let actual = strict_bool(label, cell)?;
        let guess = strict_bool(PREDICTED_LABEL_COLUMN, &predicted[row])?;
        match (actual, guess) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
        if actual == guess {
            correct += 1;
        }
        truth.push(actual);
        let score = if probabilities[row].is_nan() {
            scores[row]
        } else {
            probabilities[row]
        };
        ranked.push(score);
    }
    if truth.is_empty() {
        return Err(HyperError::evaluation("no labelled rows"));
    }

    let precision_denominator = tp + fp;
    let recall_denominator = tp + fn_;
    let f1_score = if precision_denominator == 0 || recall_denominator == 0 || tp == 0 {
        0.0
    } else {
        let precision = tp as f64 / precision_denominator as f64;
        let recall = tp as f64 / recall_denominator as f64;
        2.0 * precision * recall / (precision + recall)
    };

    Ok(BinaryMetrics {
        accuracy: correct as f64 / truth.len() as f64,
        f1_score,
        auc: auc(&ranked, &truth),
    })
}

/// Area under the ROC curve by average rank; ties share their mean rank.
fn auc(scores: &[f32], positives: &[bool]) -> f64 {
    let n = scores.len();
    let n_pos = positives.iter().filter(|&&p| p).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum_pos = 0.0f64;
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && scores[order[j]] == scores[order[i]] {
            j += 1;
        }
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        rank_sum_pos += order[i..j].iter().filter(|&&idx| positives[idx]).count() as f64 * avg_rank;
        i = j;
    }

    let n_pos = n_pos as f64;
    (rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg as f64)
}

/// Coefficient of determination and root mean squared error.
pub fn evaluate_regression(view: &DataView, label: &str) -> HyperResult<RegressionMetrics> {
    let labels = read(view.cells(label))?;
    let scores = read(view.floats(SCORE_COLUMN))?;

    let mut pairs = Vec::with_capacity(labels.len());
    for (row, cell) in labels.iter().enumerate() {
        if cell.is_missing() {
            continue;
        }
        let actual = cell.as_f64().ok_or_else(|| {
            HyperError::evaluation(format!("`{label}` value {cell} is not numeric"))
        })?;
        pairs.push((actual, f64::from(scores[row])));
    }
    if pairs.is_empty() {
        return Err(HyperError::evaluation("no labelled rows"));
    }

    let n = pairs.len() as f64;
    let mean = pairs.iter().map(|(actual, _)| actual).sum::<f64>() / n;
    let ss_res: f64 = pairs.iter().map(|(a, p)| (a - p) * (a - p)).sum();
    let ss_tot: f64 = pairs.iter().map(|(a, _)| (a - mean) * (a - mean)).sum();
    let r_squared = if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    };

    Ok(RegressionMetrics {
        r_squared,
        rmse: (ss_res / n).sqrt(),
    })
}

/// Micro accuracy over rows and macro accuracy over the classes present.
pub fn evaluate_multiclass(view: &DataView, label: &str) -> HyperResult<MulticlassMetrics> {
    let (keys, vocabulary) = read(view.keys(label))?;
    let scores = read(view.vectors(SCORE_COLUMN))?;
    if scores.ncols() != vocabulary.len() {
        return Err(HyperError::evaluation(format!(
            "{} scores per row for {} classes",
            scores.ncols(),
            vocabulary.len()
        )));
    }

    let mut seen = vec![0usize; vocabulary.len()];
    let mut hits = vec![0usize; vocabulary.len()];
    for (key, row) in keys.iter().zip(scores.rows()) {
        let Some(class) = key.map(|k| k as usize) else {
            continue;
        };
        let predicted = row
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(index, _)| index);
        seen[class] += 1;
        if predicted == Some(class) {
            hits[class] += 1;
        }
    }

    let total: usize = seen.iter().sum();
    if total == 0 {
        return Err(HyperError::evaluation("no labelled rows"));
    }
    let present: Vec<f64> = seen
        .iter()
        .zip(&hits)
        .filter(|(count, _)| **count > 0)
        .map(|(count, hit)| *hit as f64 / *count as f64)
        .collect();

    Ok(MulticlassMetrics {
        micro_accuracy: hits.iter().sum::<usize>() as f64 / total as f64,
        macro_accuracy: present.iter().sum::<f64>() / present.len() as f64,
    })
}
