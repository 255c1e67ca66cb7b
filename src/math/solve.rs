//! Weighted least squares solver.
//!
//! Logistic regression is fitted by IRLS, which repeatedly solves a weighted
//! linear regression:
//!
//! ```text
//! minimize Σ w_i (z_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - Rows are scaled by `sqrt(w_i)` and the problem is solved as ordinary
//!   least squares.
//! - We use SVD so tall systems and the nearly collinear columns produced by
//!   one-hot blocks still solve robustly (QR-based solves panic on non-square
//!   systems in nalgebra).

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if the strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve the row-weighted problem by scaling rows with `sqrt(w_i)`.
pub fn solve_weighted_least_squares(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    w: &DVector<f64>,
) -> Option<DVector<f64>> {
    let mut xw = x.clone();
    let mut yw = y.clone();
    for i in 0..x.nrows() {
        let s = w[i].max(0.0).sqrt();
        for j in 0..x.ncols() {
            xw[(i, j)] *= s;
        }
        yw[i] *= s;
    }
    solve_least_squares(&xw, &yw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn weighted_solve_downweights_rows() {
        // Two contradictory observations of a constant; the heavier one wins.
        let x = DMatrix::from_row_slice(2, 1, &[1.0, 1.0]);
        let y = DVector::from_row_slice(&[0.0, 10.0]);
        let w = DVector::from_row_slice(&[1e6, 1.0]);

        let beta = solve_weighted_least_squares(&x, &y, &w).unwrap();
        assert!(beta[0] < 0.1, "heavy weight should pull estimate near 0, got {}", beta[0]);
    }
}
