//! Accuracy and ROC-AUC
//!
//! Predictions are scores in [0, 1]; ground truth is 0 or 1. A row counts as
//! predicted positive when its score is strictly above [`THRESHOLD`].

use serde::{Deserialize, Serialize};

use crate::errors::{EvalError, Result};

/// Decision threshold for accuracy.
pub const THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub accuracy: f64,
    /// `None` when the ground truth holds a single class.
    pub auc: Option<f64>,
}

/// Score `predictions` against `ground_truth`.
pub fn evaluate(predictions: &[f64], ground_truth: &[f64]) -> Result<Scores> {
    if predictions.len() != ground_truth.len() {
        return Err(EvalError::Shape(format!(
            "{} predictions, {} ground-truth labels",
            predictions.len(),
            ground_truth.len()
        )));
    }
    if predictions.is_empty() {
        return Err(EvalError::Shape("no rows to score".to_string()));
    }
    let labels = labels(ground_truth)?;

    let correct = predictions
        .iter()
        .zip(&labels)
        .filter(|(p, y)| (**p > THRESHOLD) == **y)
        .count();

    Ok(Scores {
        accuracy: correct as f64 / predictions.len() as f64,
        auc: roc_auc(predictions, &labels),
    })
}

fn labels(ground_truth: &[f64]) -> Result<Vec<bool>> {
    ground_truth
        .iter()
        .enumerate()
        .map(|(row, &value)| {
            if value == 1.0 {
                Ok(true)
            } else if value == 0.0 {
                Ok(false)
            } else {
                Err(EvalError::Label { row, value })
            }
        })
        .collect()
}

/// Area under the ROC curve.
///
/// Every distinct score is a threshold; rows sharing a score move the curve
/// diagonally, which the trapezoid rule credits as half. Returns `None` when
/// either class is absent.
pub fn roc_auc(scores: &[f64], labels: &[bool]) -> Option<f64> {
    let positives = labels.iter().filter(|&&y| y).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let (mut tp, mut fp) = (0usize, 0usize);
    let (mut prev_tp, mut prev_fp) = (0usize, 0usize);
    let mut area = 0.0;

    let mut i = 0;
    while i < order.len() {
        let threshold = scores[order[i]];
        while i < order.len() && scores[order[i]].total_cmp(&threshold).is_eq() {
            if labels[order[i]] {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        area += (fp - prev_fp) as f64 * (tp + prev_tp) as f64 / 2.0;
        prev_tp = tp;
        prev_fp = fp;
    }

    Some(area / (positives * negatives) as f64)
}
