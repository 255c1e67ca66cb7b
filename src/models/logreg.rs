//! Logistic regression fitted by iteratively reweighted least squares.
//!
//! Each IRLS step solves a weighted linear regression on the working response
//! `z = eta + (y - p) / w` with weights `w = p (1 - p)`, using the SVD-backed
//! solver so the near-collinear one-hot blocks do not blow up. A small ridge
//! term keeps separated classes from driving the weights to infinity.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::config::LogregParams;
use crate::error::AppError;
use crate::math::solve::solve_weighted_least_squares;
use crate::models::sigmoid;

/// Fitted coefficients; `intercept` is kept apart from the feature weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogregModel {
    pub intercept: f64,
    pub weights: Vec<f64>,
}

impl LogregModel {
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let z = self.intercept
            + self
                .weights
                .iter()
                .zip(row)
                .map(|(w, v)| w * v)
                .sum::<f64>();
        sigmoid(z)
    }
}

/// Fit on a dense row-major matrix and 0/1 targets.
pub fn train(rows: &[Vec<f64>], y: &[f64], params: &LogregParams) -> Result<LogregModel, AppError> {
    let n = rows.len();
    if n == 0 || y.len() != n {
        return Err(AppError::new(3, "Logreg: empty or mismatched training set.".to_string()));
    }
    let d = rows[0].len();

    // Design matrix with a leading intercept column.
    let mut x = DMatrix::zeros(n, d + 1);
    for (i, row) in rows.iter().enumerate() {
        x[(i, 0)] = 1.0;
        for (j, v) in row.iter().enumerate() {
            x[(i, j + 1)] = *v;
        }
    }
    let y = DVector::from_row_slice(y);

    let mut beta = DVector::zeros(d + 1);

    for _ in 0..params.max_iter {
        let eta = &x * &beta;
        let p: DVector<f64> = eta.map(sigmoid);

        // Working weights and response; weights floored to keep z finite.
        let w: DVector<f64> = p.map(|pi| (pi * (1.0 - pi)).max(1e-6));
        let mut z = eta.clone();
        for i in 0..n {
            z[i] += (y[i] - p[i]) / w[i];
        }

        // Ridge term as extra pseudo-rows (not applied to the intercept).
        let lambda = params.l2.max(0.0);
        let (xa, za, wa) = if lambda > 0.0 {
            let mut xa = DMatrix::zeros(n + d, d + 1);
            xa.view_mut((0, 0), (n, d + 1)).copy_from(&x);
            for j in 0..d {
                xa[(n + j, j + 1)] = lambda.sqrt();
            }
            let mut za = DVector::zeros(n + d);
            za.view_mut((0, 0), (n, 1)).copy_from(&z);
            let mut wa = DVector::from_element(n + d, 1.0);
            wa.view_mut((0, 0), (n, 1)).copy_from(&w);
            (xa, za, wa)
        } else {
            (x.clone(), z, w)
        };

        let next = solve_weighted_least_squares(&xa, &za, &wa)
            .ok_or_else(|| AppError::new(4, "Logreg: IRLS solve failed.".to_string()))?;

        let delta = (&next - &beta).amax();
        beta = next;
        if delta < params.tol {
            break;
        }
    }

    Ok(LogregModel {
        intercept: beta[0],
        weights: beta.iter().skip(1).copied().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> LogregParams {
        LogregParams::default()
    }

    #[test]
    fn separates_a_clean_threshold() {
        // y = 1 iff x > 5
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..20).map(|i| if i > 5 { 1.0 } else { 0.0 }).collect();

        let model = train(&rows, &y, &params()).unwrap();
        assert!(model.predict_proba(&[0.0]) < 0.5);
        assert!(model.predict_proba(&[19.0]) > 0.5);
    }

    #[test]
    fn recovers_sign_of_a_noisy_effect() {
        // Two features: only the first matters.
        let rows: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![(i % 2) as f64, ((i * 7) % 5) as f64])
            .collect();
        let y: Vec<f64> = rows.iter().map(|r| r[0]).collect();

        let model = train(&rows, &y, &params()).unwrap();
        assert!(model.weights[0] > 0.0);
        assert!(model.predict_proba(&[1.0, 2.0]) > model.predict_proba(&[0.0, 2.0]));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(train(&[], &[], &params()).is_err());
    }
}
