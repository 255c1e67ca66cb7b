//! Pipeline parameters.
//!
//! Loaded from a YAML file (`params.yaml` by default). Every field has a
//! default, so a missing file or a partial file both work; unknown keys are
//! rejected to catch typos early.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::TrainMethod;
use crate::error::AppError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Params {
    pub general: GeneralParams,
    pub split: SplitParams,
    pub logreg: LogregParams,
    pub mlp: MlpParams,
    pub gbdt: GbdtParams,
}

impl Params {
    /// Read parameters from a YAML file; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::io(format!("Cannot read params file {}: {e}", path.display())))?;
        serde_yaml::from_str(&text)
            .map_err(|e| AppError::io(format!("Bad params file {}: {e}", path.display())))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GeneralParams {
    /// Training method used when the CLI does not override it.
    pub train_method: TrainMethod,
}

impl Default for GeneralParams {
    fn default() -> Self {
        Self {
            train_method: TrainMethod::Gbdt,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SplitParams {
    /// Fraction of each class routed to the test partition.
    pub test_ratio: f64,
    /// Seed shared by the split shuffle and model initialization.
    pub seed: u64,
}

impl Default for SplitParams {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LogregParams {
    pub max_iter: usize,
    /// IRLS stops when no coefficient moves more than this.
    pub tol: f64,
    /// Ridge strength applied to the feature weights (not the intercept).
    pub l2: f64,
}

impl Default for LogregParams {
    fn default() -> Self {
        Self {
            max_iter: 50,
            tol: 1e-6,
            l2: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MlpParams {
    /// First hidden layer width.
    pub hidden_x: usize,
    /// Second hidden layer width.
    pub hidden_y: usize,
    pub learning_rate: f64,
    pub max_epochs: usize,
    pub batch_size: usize,
}

impl Default for MlpParams {
    fn default() -> Self {
        Self {
            hidden_x: 64,
            hidden_y: 32,
            learning_rate: 0.05,
            max_epochs: 200,
            batch_size: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GbdtParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    /// L2 regularization on leaf values.
    pub reg_lambda: f64,
    /// L1 soft threshold on leaf gradients.
    pub reg_alpha: f64,
    /// Instance-weight multiplier for the positive class.
    pub scale_pos_weight: f64,
    pub min_child_rows: usize,
    pub min_gain: f64,
}

impl Default for GbdtParams {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: 5,
            learning_rate: 0.1,
            reg_lambda: 1.0,
            reg_alpha: 0.0,
            scale_pos_weight: 3.0,
            min_child_rows: 5,
            min_gain: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_fills_defaults() {
        let params: Params = serde_yaml::from_str("split:\n  seed: 7\n").unwrap();
        assert_eq!(params.split.seed, 7);
        assert_eq!(params.split.test_ratio, 0.2);
        assert_eq!(params.gbdt.n_trees, 200);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = serde_yaml::from_str::<Params>("splitt:\n  seed: 7\n");
        assert!(err.is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let params = Params::load(Path::new("/nonexistent/params.yaml")).unwrap();
        assert_eq!(params.general.train_method, TrainMethod::Gbdt);
    }
}
