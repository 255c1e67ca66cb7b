//! A small feed-forward network: two hidden ReLU layers, sigmoid output.
//!
//! Trained with mini-batch gradient descent on the logistic loss. All
//! randomness (weight init, batch shuffling) comes from one seeded RNG, so a
//! run is reproducible. He-scaled normal init keeps the ReLU layers alive at
//! the start.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::config::MlpParams;
use crate::error::AppError;
use crate::models::sigmoid;

/// One dense layer; `weights[o][i]` maps input `i` to output `o`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
}

impl DenseLayer {
    fn new(rng: &mut StdRng, inputs: usize, outputs: usize) -> Result<Self, AppError> {
        let std = (2.0 / inputs.max(1) as f64).sqrt();
        let normal = Normal::new(0.0, std)
            .map_err(|e| AppError::new(4, format!("MLP init: {e}")))?;
        let weights = (0..outputs)
            .map(|_| (0..inputs).map(|_| normal.sample(rng)).collect())
            .collect();
        Ok(Self {
            weights,
            biases: vec![0.0; outputs],
        })
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(w, b)| b + w.iter().zip(input).map(|(wi, xi)| wi * xi).sum::<f64>())
            .collect()
    }
}

/// Fitted network: hidden layers use ReLU, the single output a sigmoid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpModel {
    pub hidden: Vec<DenseLayer>,
    pub output: DenseLayer,
}

impl MlpModel {
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let mut activ = row.to_vec();
        for layer in &self.hidden {
            activ = layer.forward(&activ);
            for v in &mut activ {
                *v = v.max(0.0);
            }
        }
        sigmoid(self.output.forward(&activ)[0])
    }
}

/// Fit on a dense row-major matrix and 0/1 targets.
pub fn train(
    rows: &[Vec<f64>],
    y: &[f64],
    params: &MlpParams,
    seed: u64,
) -> Result<MlpModel, AppError> {
    let n = rows.len();
    if n == 0 || y.len() != n {
        return Err(AppError::new(3, "MLP: empty or mismatched training set.".to_string()));
    }
    let d = rows[0].len();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut model = MlpModel {
        hidden: vec![
            DenseLayer::new(&mut rng, d, params.hidden_x)?,
            DenseLayer::new(&mut rng, params.hidden_x, params.hidden_y)?,
        ],
        output: DenseLayer::new(&mut rng, params.hidden_y, 1)?,
    };

    let batch = params.batch_size.max(1).min(n);
    let mut order: Vec<usize> = (0..n).collect();

    for _ in 0..params.max_epochs {
        order.shuffle(&mut rng);
        for chunk in order.chunks(batch) {
            step(&mut model, rows, y, chunk, params.learning_rate)?;
        }
    }

    Ok(model)
}

/// One gradient step on a mini-batch.
fn step(
    model: &mut MlpModel,
    rows: &[Vec<f64>],
    y: &[f64],
    batch: &[usize],
    learning_rate: f64,
) -> Result<(), AppError> {
    let scale = learning_rate / batch.len() as f64;

    // Accumulated gradients, same shapes as the parameters.
    let mut grad_hidden: Vec<(Vec<Vec<f64>>, Vec<f64>)> = model
        .hidden
        .iter()
        .map(|l| {
            (
                l.weights.iter().map(|w| vec![0.0; w.len()]).collect(),
                vec![0.0; l.biases.len()],
            )
        })
        .collect();
    let mut grad_out_w = vec![0.0; model.output.weights[0].len()];
    let mut grad_out_b = 0.0;

    for &i in batch {
        // Forward pass keeping every activation.
        let mut activations: Vec<Vec<f64>> = vec![rows[i].clone()];
        for layer in &model.hidden {
            let mut a = layer.forward(activations.last().unwrap());
            for v in &mut a {
                *v = v.max(0.0);
            }
            activations.push(a);
        }
        let last = activations.last().unwrap();
        let p = sigmoid(model.output.forward(last)[0]);

        // Log-loss gradient at the output logit.
        let delta_out = p - y[i];
        if !delta_out.is_finite() {
            return Err(AppError::new(4, "MLP: non-finite gradient.".to_string()));
        }
        for (g, a) in grad_out_w.iter_mut().zip(last) {
            *g += delta_out * a;
        }
        grad_out_b += delta_out;

        // Backpropagate through the hidden stack.
        let mut delta: Vec<f64> = model.output.weights[0]
            .iter()
            .zip(last)
            .map(|(w, a)| if *a > 0.0 { delta_out * w } else { 0.0 })
            .collect();

        for l in (0..model.hidden.len()).rev() {
            let input = &activations[l];
            let (gw, gb) = &mut grad_hidden[l];
            for (o, d) in delta.iter().enumerate() {
                gb[o] += d;
                for (g, a) in gw[o].iter_mut().zip(input) {
                    *g += d * a;
                }
            }
            if l > 0 {
                delta = (0..model.hidden[l].weights[0].len())
                    .map(|j| {
                        let s: f64 = delta
                            .iter()
                            .enumerate()
                            .map(|(o, d)| d * model.hidden[l].weights[o][j])
                            .sum();
                        if activations[l][j] > 0.0 { s } else { 0.0 }
                    })
                    .collect();
            }
        }
    }

    // Apply.
    for (layer, (gw, gb)) in model.hidden.iter_mut().zip(&grad_hidden) {
        for (w, g) in layer.weights.iter_mut().zip(gw) {
            for (wi, gi) in w.iter_mut().zip(g) {
                *wi -= scale * gi;
            }
        }
        for (b, g) in layer.biases.iter_mut().zip(gb) {
            *b -= scale * g;
        }
    }
    for (w, g) in model.output.weights[0].iter_mut().zip(&grad_out_w) {
        *w -= scale * g;
    }
    model.output.biases[0] -= scale * grad_out_b;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> MlpParams {
        MlpParams {
            hidden_x: 8,
            hidden_y: 4,
            learning_rate: 0.1,
            max_epochs: 300,
            batch_size: 16,
        }
    }

    #[test]
    fn learns_a_linear_boundary() {
        let rows: Vec<Vec<f64>> = (0..40).map(|i| vec![(i as f64) / 40.0 - 0.5]).collect();
        let y: Vec<f64> = rows.iter().map(|r| if r[0] > 0.0 { 1.0 } else { 0.0 }).collect();

        let model = train(&rows, &y, &params(), 7).unwrap();
        assert!(model.predict_proba(&[0.4]) > 0.5);
        assert!(model.predict_proba(&[-0.4]) < 0.5);
    }

    #[test]
    fn same_seed_same_model() {
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![(i % 4) as f64, (i % 3) as f64]).collect();
        let y: Vec<f64> = (0..20).map(|i| ((i % 4) >= 2) as u8 as f64).collect();

        let a = train(&rows, &y, &params(), 42).unwrap();
        let b = train(&rows, &y, &params(), 42).unwrap();
        assert_eq!(a.predict_proba(&[1.0, 2.0]), b.predict_proba(&[1.0, 2.0]));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(train(&[], &[], &params(), 1).is_err());
    }
}
