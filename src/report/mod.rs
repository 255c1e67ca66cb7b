//! Evaluation metrics and report formatting.
//!
//! Binary classification metrics over the 0/1 decision target: per-class
//! precision/recall/F1 with supports, accuracy, and the micro-averaged F1
//! that serves as the headline pipeline score. The text rendering mirrors the
//! usual classification-report layout so eyeballing runs stays easy.

use serde::{Deserialize, Serialize};

use crate::domain::{Lender, TrainMethod};
use crate::error::AppError;

/// Per-class evaluation row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Full evaluation of one lender's model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub micro_f1: f64,
    pub n_rows: usize,
}

/// On-disk metrics artifact, one per lender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsFile {
    pub tool: String,
    pub lender: Lender,
    pub method: TrainMethod,
    #[serde(flatten)]
    pub evaluation: Evaluation,
}

/// Compute binary metrics from true and predicted 0/1 labels.
pub fn evaluate(y_true: &[f64], y_pred: &[f64]) -> Result<Evaluation, AppError> {
    if y_true.is_empty() || y_true.len() != y_pred.len() {
        return Err(AppError::new(
            3,
            "Evaluation needs matching, non-empty label vectors.".to_string(),
        ));
    }

    let n = y_true.len();
    let mut classes = Vec::with_capacity(2);
    let mut correct = 0usize;

    for (label, class) in [("denied", 0.0), ("success", 1.0)] {
        let tp = count(y_true, y_pred, |t, p| t == class && p == class);
        let fp = count(y_true, y_pred, |t, p| t != class && p == class);
        let fn_ = count(y_true, y_pred, |t, p| t == class && p != class);
        let support = tp + fn_;

        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, support);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        correct += tp;
        classes.push(ClassMetrics {
            label: label.to_string(),
            precision,
            recall,
            f1,
            support,
        });
    }

    let accuracy = correct as f64 / n as f64;

    // Micro-averaging over both classes: every row counts once as true and
    // once as predicted, so micro-F1 collapses to accuracy here.
    let micro_f1 = accuracy;

    Ok(Evaluation {
        classes,
        accuracy,
        micro_f1,
        n_rows: n,
    })
}

fn count(y_true: &[f64], y_pred: &[f64], pred: impl Fn(f64, f64) -> bool) -> usize {
    y_true
        .iter()
        .zip(y_pred)
        .filter(|(t, p)| pred(**t, **p))
        .count()
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Render the familiar classification-report table.
pub fn format_report(eval: &Evaluation) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>12} {:>10} {:>10} {:>10} {:>10}\n",
        "", "precision", "recall", "f1-score", "support"
    ));
    out.push('\n');
    for c in &eval.classes {
        out.push_str(&format!(
            "{:>12} {:>10.3} {:>10.3} {:>10.3} {:>10}\n",
            c.label, c.precision, c.recall, c.f1, c.support
        ));
    }
    out.push('\n');
    out.push_str(&format!(
        "{:>12} {:>10} {:>10} {:>10.3} {:>10}\n",
        "accuracy", "", "", eval.accuracy, eval.n_rows
    ));
    out.push_str(&format!("{:>12} {:>32.3}\n", "micro f1", eval.micro_f1));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions() {
        let y = vec![0.0, 1.0, 1.0, 0.0];
        let eval = evaluate(&y, &y).unwrap();
        assert_eq!(eval.accuracy, 1.0);
        assert_eq!(eval.micro_f1, 1.0);
        for c in &eval.classes {
            assert_eq!(c.f1, 1.0);
        }
        assert_eq!(eval.classes[0].support, 2);
    }

    #[test]
    fn asymmetric_errors_show_up_per_class() {
        // All predicted success: denied recall must be 0.
        let y_true = vec![0.0, 0.0, 1.0, 1.0];
        let y_pred = vec![1.0, 1.0, 1.0, 1.0];
        let eval = evaluate(&y_true, &y_pred).unwrap();

        assert_eq!(eval.classes[0].recall, 0.0);
        assert_eq!(eval.classes[1].recall, 1.0);
        assert_eq!(eval.classes[1].precision, 0.5);
        assert_eq!(eval.accuracy, 0.5);
    }

    #[test]
    fn micro_f1_equals_accuracy_for_binary() {
        let y_true = vec![0.0, 1.0, 1.0, 0.0, 1.0];
        let y_pred = vec![0.0, 1.0, 0.0, 1.0, 1.0];
        let eval = evaluate(&y_true, &y_pred).unwrap();
        assert_eq!(eval.micro_f1, eval.accuracy);
        assert!((eval.accuracy - 0.6).abs() < 1e-12);
    }

    #[test]
    fn rejects_mismatched_lengths() {
        assert!(evaluate(&[1.0], &[]).is_err());
        assert!(evaluate(&[], &[]).is_err());
    }

    #[test]
    fn report_renders_all_rows() {
        let eval = evaluate(&[0.0, 1.0], &[0.0, 1.0]).unwrap();
        let text = format_report(&eval);
        assert!(text.contains("denied"));
        assert!(text.contains("success"));
        assert!(text.contains("accuracy"));
        assert!(text.contains("micro f1"));
    }
}
