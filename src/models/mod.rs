//! Per-lender binary classifiers.
//!
//! Three interchangeable training methods, all producing calibrated-ish
//! probabilities of approval:
//!
//! - [`logreg`] — logistic regression fitted by IRLS
//! - [`mlp`] — a small feed-forward network (trained on an undersampled set,
//!   see [`balance`])
//! - [`gbdt`] — gradient-boosted trees on the logistic loss
//!
//! A fitted model is persisted as a [`ModelFile`]: the parameters plus the
//! exact feature-column schema it was trained on, so prediction can realign
//! frames instead of trusting column order.

pub mod balance;
pub mod gbdt;
pub mod logreg;
pub mod mlp;

pub use balance::near_miss;
pub use gbdt::GbdtModel;
pub use logreg::LogregModel;
pub use mlp::MlpModel;

use serde::{Deserialize, Serialize};

use crate::config::Params;
use crate::domain::{FeatureFrame, Lender, TrainMethod};
use crate::error::AppError;

/// A fitted classifier of any supported method.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TrainedModel {
    Logreg(LogregModel),
    Mlp(MlpModel),
    Gbdt(GbdtModel),
}

impl TrainedModel {
    /// Approval probability for one feature row.
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        match self {
            TrainedModel::Logreg(m) => m.predict_proba(row),
            TrainedModel::Mlp(m) => m.predict_proba(row),
            TrainedModel::Gbdt(m) => m.predict_proba(row),
        }
    }

    /// Hard 0/1 predictions for every row of a feature matrix.
    pub fn predict(&self, x: &FeatureFrame) -> Vec<f64> {
        x.rows
            .iter()
            .map(|row| if self.predict_proba(row) >= 0.5 { 1.0 } else { 0.0 })
            .collect()
    }

    pub fn method(&self) -> TrainMethod {
        match self {
            TrainedModel::Logreg(_) => TrainMethod::Logreg,
            TrainedModel::Mlp(_) => TrainMethod::Mlp,
            TrainedModel::Gbdt(_) => TrainMethod::Gbdt,
        }
    }
}

/// On-disk model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub lender: Lender,
    pub method: TrainMethod,
    /// Feature columns, in training order, excluding the target.
    pub feature_names: Vec<String>,
    pub model: TrainedModel,
}

/// Fit a classifier on a prepared training frame (target column `y`).
///
/// The MLP path undersamples the majority class first; logistic regression
/// and the boosted trees handle imbalance through instance weights instead.
pub fn train_model(
    train: &FeatureFrame,
    method: TrainMethod,
    params: &Params,
) -> Result<(TrainedModel, Vec<String>), AppError> {
    let (x, y) = train.split_xy("y")?;
    if x.n_rows() == 0 {
        return Err(AppError::new(3, "No rows left to train on.".to_string()));
    }
    let feature_names = x.columns.clone();

    let model = match method {
        TrainMethod::Logreg => {
            TrainedModel::Logreg(logreg::train(&x.rows, &y, &params.logreg)?)
        }
        TrainMethod::Mlp => {
            let (bx, by) = balance::near_miss(&x.rows, &y);
            TrainedModel::Mlp(mlp::train(&bx, &by, &params.mlp, params.split.seed)?)
        }
        TrainMethod::Gbdt => TrainedModel::Gbdt(gbdt::train(&x.rows, &y, &params.gbdt)?),
    };

    Ok((model, feature_names))
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_is_stable_at_extremes() {
        assert!(sigmoid(1000.0) <= 1.0);
        assert!(sigmoid(-1000.0) >= 0.0);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-12);
    }
}
