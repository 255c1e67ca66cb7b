//! Gradient-boosted decision trees on the logistic loss.
//!
//! Standard second-order boosting: each round fits a regression tree to the
//! gradient/hessian statistics of the current predictions and adds its
//! shrunken output to the ensemble logits.
//!
//! - leaf values are Newton steps `-G / (H + lambda)` with an optional L1
//!   soft threshold on `G`
//! - split gain is the usual `G^2 / (H + lambda)` improvement
//! - class imbalance is handled by weighting positive rows with
//!   `scale_pos_weight`
//! - the best split is searched per feature in parallel with rayon

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::GbdtParams;
use crate::error::AppError;
use crate::models::sigmoid;

/// A node of a fitted regression tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn score(&self, row: &[f64]) -> f64 {
        match self {
            TreeNode::Leaf { value } => *value,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] < *threshold {
                    left.score(row)
                } else {
                    right.score(row)
                }
            }
        }
    }
}

/// Fitted ensemble. Predictions sum the shrunken tree outputs into a logit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbdtModel {
    pub base_logit: f64,
    pub learning_rate: f64,
    pub trees: Vec<TreeNode>,
}

impl GbdtModel {
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let logit = self.base_logit
            + self.learning_rate * self.trees.iter().map(|t| t.score(row)).sum::<f64>();
        sigmoid(logit)
    }
}

/// Per-row boosting statistics for one round.
struct GradHess {
    grad: Vec<f64>,
    hess: Vec<f64>,
}

/// Fit on a dense row-major matrix and 0/1 targets.
pub fn train(rows: &[Vec<f64>], y: &[f64], params: &GbdtParams) -> Result<GbdtModel, AppError> {
    let n = rows.len();
    if n == 0 || y.len() != n {
        return Err(AppError::new(3, "GBDT: empty or mismatched training set.".to_string()));
    }

    // Instance weights: positives get scale_pos_weight.
    let weights: Vec<f64> = y
        .iter()
        .map(|&yi| if yi > 0.5 { params.scale_pos_weight } else { 1.0 })
        .collect();

    let mut model = GbdtModel {
        base_logit: 0.0,
        learning_rate: params.learning_rate,
        trees: Vec::with_capacity(params.n_trees),
    };
    let mut logits = vec![0.0; n];

    for _ in 0..params.n_trees {
        let mut stats = GradHess {
            grad: Vec::with_capacity(n),
            hess: Vec::with_capacity(n),
        };
        for i in 0..n {
            let p = sigmoid(logits[i]);
            stats.grad.push(weights[i] * (p - y[i]));
            stats.hess.push(weights[i] * (p * (1.0 - p)).max(1e-12));
        }

        let indices: Vec<usize> = (0..n).collect();
        let tree = build_node(rows, &stats, indices, params.max_depth, params);

        for (i, row) in rows.iter().enumerate() {
            logits[i] += params.learning_rate * tree.score(row);
        }
        model.trees.push(tree);

        if logits.iter().any(|l| !l.is_finite()) {
            return Err(AppError::new(4, "GBDT: predictions diverged.".to_string()));
        }
    }

    Ok(model)
}

/// Newton leaf value with L1 soft threshold and L2 shrinkage.
fn leaf_value(g: f64, h: f64, params: &GbdtParams) -> f64 {
    let g = if g > params.reg_alpha {
        g - params.reg_alpha
    } else if g < -params.reg_alpha {
        g + params.reg_alpha
    } else {
        0.0
    };
    -g / (h + params.reg_lambda)
}

fn gain_term(g: f64, h: f64, params: &GbdtParams) -> f64 {
    g * g / (h + params.reg_lambda)
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

fn build_node(
    rows: &[Vec<f64>],
    stats: &GradHess,
    indices: Vec<usize>,
    depth: usize,
    params: &GbdtParams,
) -> TreeNode {
    let g_total: f64 = indices.iter().map(|&i| stats.grad[i]).sum();
    let h_total: f64 = indices.iter().map(|&i| stats.hess[i]).sum();

    if depth == 0 || indices.len() < 2 * params.min_child_rows {
        return TreeNode::Leaf {
            value: leaf_value(g_total, h_total, params),
        };
    }

    let n_features = rows[0].len();
    let best = (0..n_features)
        .into_par_iter()
        .filter_map(|feature| best_split_for_feature(rows, stats, &indices, feature, g_total, h_total, params))
        .reduce_with(|a, b| if a.gain >= b.gain { a } else { b });

    let Some(best) = best else {
        return TreeNode::Leaf {
            value: leaf_value(g_total, h_total, params),
        };
    };

    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .into_iter()
        .partition(|&i| rows[i][best.feature] < best.threshold);

    TreeNode::Split {
        feature: best.feature,
        threshold: best.threshold,
        left: Box::new(build_node(rows, stats, left, depth - 1, params)),
        right: Box::new(build_node(rows, stats, right, depth - 1, params)),
    }
}

fn best_split_for_feature(
    rows: &[Vec<f64>],
    stats: &GradHess,
    indices: &[usize],
    feature: usize,
    g_total: f64,
    h_total: f64,
    params: &GbdtParams,
) -> Option<BestSplit> {
    let mut order: Vec<usize> = indices.to_vec();
    order.sort_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));

    let parent_gain = gain_term(g_total, h_total, params);
    let mut g_left = 0.0;
    let mut h_left = 0.0;
    let mut best: Option<BestSplit> = None;

    for k in 0..order.len() - 1 {
        let i = order[k];
        g_left += stats.grad[i];
        h_left += stats.hess[i];

        let lo = rows[i][feature];
        let hi = rows[order[k + 1]][feature];
        if lo == hi {
            continue;
        }
        if k + 1 < params.min_child_rows || order.len() - k - 1 < params.min_child_rows {
            continue;
        }

        let gain = gain_term(g_left, h_left, params)
            + gain_term(g_total - g_left, h_total - h_left, params)
            - parent_gain;
        if gain > params.min_gain && best.as_ref().is_none_or(|b| gain > b.gain) {
            best = Some(BestSplit {
                feature,
                threshold: (lo + hi) / 2.0,
                gain,
            });
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GbdtParams {
        GbdtParams {
            n_trees: 20,
            max_depth: 3,
            learning_rate: 0.3,
            reg_lambda: 1.0,
            reg_alpha: 0.0,
            scale_pos_weight: 1.0,
            min_child_rows: 1,
            min_gain: 0.0,
        }
    }

    #[test]
    fn fits_an_axis_aligned_rule() {
        // y = 1 iff x0 > 0.5, x1 is noise.
        let rows: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![(i % 10) as f64 / 10.0, ((i * 3) % 7) as f64])
            .collect();
        let y: Vec<f64> = rows.iter().map(|r| if r[0] > 0.5 { 1.0 } else { 0.0 }).collect();

        let model = train(&rows, &y, &params()).unwrap();
        assert!(model.predict_proba(&[0.9, 3.0]) > 0.7);
        assert!(model.predict_proba(&[0.1, 3.0]) < 0.3);
    }

    #[test]
    fn fits_an_interaction() {
        // Conjunctive target needs depth >= 2: y = 1 iff both flags are set.
        let rows: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![(i % 2) as f64, ((i / 2) % 2) as f64])
            .collect();
        let y: Vec<f64> = rows
            .iter()
            .map(|r| if r[0] > 0.5 && r[1] > 0.5 { 1.0 } else { 0.0 })
            .collect();

        let model = train(&rows, &y, &params()).unwrap();
        assert!(model.predict_proba(&[1.0, 1.0]) > 0.5);
        assert!(model.predict_proba(&[1.0, 0.0]) < 0.5);
        assert!(model.predict_proba(&[0.0, 1.0]) < 0.5);
    }

    #[test]
    fn pos_weight_shifts_probabilities_up() {
        let rows: Vec<Vec<f64>> = (0..30).map(|i| vec![(i % 3) as f64]).collect();
        let y: Vec<f64> = (0..30).map(|i| ((i % 10) == 0) as u8 as f64).collect();

        let plain = train(&rows, &y, &params()).unwrap();
        let mut heavy = params();
        heavy.scale_pos_weight = 9.0;
        let weighted = train(&rows, &y, &heavy).unwrap();

        assert!(weighted.predict_proba(&[0.0]) > plain.predict_proba(&[0.0]));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(train(&[], &[], &params()).is_err());
    }
}
