//! Column-wise standard scaler.
//!
//! The lender-preparation stage standardizes the four core numeric features
//! (`(x - mean) / std`) before polynomial expansion. The fitted parameters are
//! persisted as JSON next to the models so the exact same transform can be
//! replayed at predict time.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::math::stats::{mean, std_dev};

/// Fitted standardization parameters for a set of named columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub columns: Vec<String>,
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl StandardScaler {
    /// Fit a scaler on column-major data.
    ///
    /// `data[i]` holds the values of `columns[i]`. Constant columns get a unit
    /// std so transforming them yields zeros rather than NaNs.
    pub fn fit(columns: &[String], data: &[Vec<f64>]) -> Result<Self, AppError> {
        if columns.len() != data.len() {
            return Err(AppError::new(
                4,
                format!(
                    "Scaler fit: {} column names but {} data columns.",
                    columns.len(),
                    data.len()
                ),
            ));
        }

        let mut means = Vec::with_capacity(columns.len());
        let mut stds = Vec::with_capacity(columns.len());

        for (name, values) in columns.iter().zip(data) {
            let m = mean(values)
                .ok_or_else(|| AppError::new(3, format!("Scaler fit: column `{name}` is empty.")))?;
            let s = std_dev(values).unwrap_or(0.0);
            means.push(m);
            stds.push(if s > 0.0 { s } else { 1.0 });
        }

        Ok(Self {
            columns: columns.to_vec(),
            means,
            stds,
        })
    }

    /// Standardize one row (values ordered like `self.columns`).
    pub fn transform_row(&self, values: &[f64]) -> Result<Vec<f64>, AppError> {
        if values.len() != self.columns.len() {
            return Err(AppError::new(
                4,
                format!(
                    "Scaler transform: expected {} values, got {}.",
                    self.columns.len(),
                    values.len()
                ),
            ));
        }
        Ok(values
            .iter()
            .zip(self.means.iter().zip(&self.stds))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_and_transform() {
        let columns = vec!["a".to_string(), "b".to_string()];
        let data = vec![vec![1.0, 2.0, 3.0], vec![10.0, 10.0, 10.0]];
        let scaler = StandardScaler::fit(&columns, &data).unwrap();

        let row = scaler.transform_row(&[2.0, 10.0]).unwrap();
        assert!(row[0].abs() < 1e-12, "mean value maps to 0");
        assert_eq!(row[1], 0.0, "constant column maps to 0");

        let hi = scaler.transform_row(&[3.0, 10.0]).unwrap();
        assert!(hi[0] > 0.0);
    }

    #[test]
    fn transform_rejects_wrong_arity() {
        let scaler = StandardScaler::fit(&["a".to_string()], &[vec![1.0, 2.0]]).unwrap();
        assert!(scaler.transform_row(&[1.0, 2.0]).is_err());
    }
}
