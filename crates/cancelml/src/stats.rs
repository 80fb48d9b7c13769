//! Binary classification evaluation metrics.
use serde::{Deserialize, Serialize};

use crate::config::Scoring;
use crate::error::{PipelineError, Result};

/// Held-out evaluation metrics, with class `1` as the positive class.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Metrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl Metrics {
    pub fn score(&self, scoring: Scoring) -> f64 {
        match scoring {
            Scoring::Accuracy => self.accuracy,
            Scoring::Precision => self.precision,
            Scoring::Recall => self.recall,
            Scoring::F1 => self.f1,
        }
    }
}

/// Compute accuracy/precision/recall/F1 from true and predicted labels.
/// Undefined ratios (zero denominators) evaluate to 0.
pub fn evaluate(y_true: &[i64], y_pred: &[i64]) -> Result<Metrics> {
    if y_true.len() != y_pred.len() {
        return Err(PipelineError::data(format!(
            "{} true labels but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(PipelineError::data("cannot evaluate on an empty set"));
    }

    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut tn = 0usize;
    let mut fn_ = 0usize;
    for (&t, &p) in y_true.iter().zip(y_pred) {
        match (t != 0, p != 0) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (false, false) => tn += 1,
            (true, false) => fn_ += 1,
        }
    }

    let accuracy = (tp + tn) as f64 / y_true.len() as f64;
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    Ok(Metrics {
        accuracy,
        precision,
        recall,
        f1,
    })
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions() {
        let y = vec![0, 1, 1, 0, 1];
        let m = evaluate(&y, &y).unwrap();
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1, 1.0);
    }

    #[test]
    fn known_confusion_counts() {
        // tp=2, fp=1, tn=2, fn=1
        let y_true = vec![1, 1, 1, 0, 0, 0];
        let y_pred = vec![1, 1, 0, 1, 0, 0];
        let m = evaluate(&y_true, &y_pred).unwrap();
        assert!((m.accuracy - 4.0 / 6.0).abs() < 1e-12);
        assert!((m.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.f1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn no_positive_predictions_yields_zero_precision() {
        let m = evaluate(&[1, 0, 1], &[0, 0, 0]).unwrap();
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1, 0.0);
    }

    #[test]
    fn mismatched_lengths_rejected() {
        assert!(evaluate(&[1, 0], &[1]).is_err());
    }
}
