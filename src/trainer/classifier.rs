//! Shallow text classifier: embedding, mean pooling, one hidden layer,
//! softmax output. Trained with per-sample SGD and balanced class weights.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct FitConfig {
    pub epochs: usize,
    pub embed_dim: usize,
    pub hidden_dim: usize,
    pub learning_rate: f32,
    pub seed: u64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            epochs: 12,
            embed_dim: 64,
            hidden_dim: 64,
            learning_rate: 0.05,
            seed: 42,
        }
    }
}

/// Trained weights, serialized as the model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub vocab_size: usize,
    pub embed_dim: usize,
    pub hidden_dim: usize,
    pub num_classes: usize,
    pub max_len: usize,
    pub embedding: Vec<Vec<f32>>,
    pub w1: Vec<Vec<f32>>,
    pub b1: Vec<f32>,
    pub w2: Vec<Vec<f32>>,
    pub b2: Vec<f32>,
}

/// Per-epoch summary handed to the progress callback.
#[derive(Debug, Clone, Copy)]
pub struct EpochStats {
    pub epoch: usize,
    pub loss: f32,
    pub accuracy: f32,
}

struct Forward {
    pooled: Vec<f32>,
    pre_act: Vec<f32>,
    hidden: Vec<f32>,
    probs: Vec<f32>,
}

impl Model {
    fn init(vocab_size: usize, num_classes: usize, max_len: usize, cfg: &FitConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let mut matrix = |rows: usize, cols: usize| -> Vec<Vec<f32>> {
            (0..rows)
                .map(|_| (0..cols).map(|_| rng.gen_range(-0.05..0.05)).collect())
                .collect()
        };
        Self {
            vocab_size,
            embed_dim: cfg.embed_dim,
            hidden_dim: cfg.hidden_dim,
            num_classes,
            max_len,
            embedding: matrix(vocab_size, cfg.embed_dim),
            w1: matrix(cfg.embed_dim, cfg.hidden_dim),
            b1: vec![0.0; cfg.hidden_dim],
            w2: matrix(cfg.hidden_dim, num_classes),
            b2: vec![0.0; num_classes],
        }
    }

    fn forward(&self, seq: &[usize]) -> Forward {
        // Mean-pool the embeddings of non-pad tokens; index 0 is padding.
        let tokens: Vec<usize> = seq.iter().copied().filter(|&t| t > 0).collect();
        let mut pooled = vec![0.0f32; self.embed_dim];
        if !tokens.is_empty() {
            for &t in &tokens {
                for (p, e) in pooled.iter_mut().zip(&self.embedding[t]) {
                    *p += e;
                }
            }
            let inv = 1.0 / tokens.len() as f32;
            for p in pooled.iter_mut() {
                *p *= inv;
            }
        }

        let mut pre_act = self.b1.clone();
        for (e, row) in self.w1.iter().enumerate() {
            for (h, w) in row.iter().enumerate() {
                pre_act[h] += pooled[e] * w;
            }
        }
        let hidden: Vec<f32> = pre_act.iter().map(|&a| a.max(0.0)).collect();

        let mut logits = self.b2.clone();
        for (h, row) in self.w2.iter().enumerate() {
            for (c, w) in row.iter().enumerate() {
                logits[c] += hidden[h] * w;
            }
        }
        let probs = softmax(&logits);

        Forward {
            pooled,
            pre_act,
            hidden,
            probs,
        }
    }

    /// Predicted class index for one padded sequence.
    pub fn predict(&self, seq: &[usize]) -> usize {
        argmax(&self.forward(seq).probs)
    }

    fn sgd_step(&mut self, seq: &[usize], label: usize, weight: f32, lr: f32) -> f32 {
        let fwd = self.forward(seq);
        let loss = -weight * fwd.probs[label].max(1e-9).ln();

        // dL/dlogits for weighted cross-entropy over softmax.
        let mut d_logits = fwd.probs.clone();
        d_logits[label] -= 1.0;
        for d in d_logits.iter_mut() {
            *d *= weight;
        }

        let mut d_hidden = vec![0.0f32; self.hidden_dim];
        for (h, row) in self.w2.iter_mut().enumerate() {
            for (c, w) in row.iter_mut().enumerate() {
                d_hidden[h] += *w * d_logits[c];
                *w -= lr * fwd.hidden[h] * d_logits[c];
            }
        }
        for (c, b) in self.b2.iter_mut().enumerate() {
            *b -= lr * d_logits[c];
        }

        let d_pre: Vec<f32> = d_hidden
            .iter()
            .zip(&fwd.pre_act)
            .map(|(&d, &a)| if a > 0.0 { d } else { 0.0 })
            .collect();

        let mut d_pooled = vec![0.0f32; self.embed_dim];
        for (e, row) in self.w1.iter_mut().enumerate() {
            for (h, w) in row.iter_mut().enumerate() {
                d_pooled[e] += *w * d_pre[h];
                *w -= lr * fwd.pooled[e] * d_pre[h];
            }
        }
        for (h, b) in self.b1.iter_mut().enumerate() {
            *b -= lr * d_pre[h];
        }

        let tokens: Vec<usize> = seq.iter().copied().filter(|&t| t > 0).collect();
        if !tokens.is_empty() {
            let inv = 1.0 / tokens.len() as f32;
            for &t in &tokens {
                for (e, d) in self.embedding[t].iter_mut().zip(&d_pooled) {
                    *e -= lr * d * inv;
                }
            }
        }

        loss
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Balanced class weights: n_samples / (n_classes * count[class]).
fn class_weights(labels: &[usize], num_classes: usize) -> Vec<f32> {
    let mut counts = vec![0usize; num_classes];
    for &l in labels {
        counts[l] += 1;
    }
    let n = labels.len() as f32;
    counts
        .iter()
        .map(|&c| {
            if c == 0 {
                0.0
            } else {
                n / (num_classes as f32 * c as f32)
            }
        })
        .collect()
}

/// Train a model over padded sequences and encoded labels.
///
/// A tenth of the data (at least one sample when there are ten or more) is
/// held out for the per-epoch accuracy figure; with fewer samples accuracy is
/// measured on the training set itself.
pub fn fit(
    padded: &[Vec<usize>],
    labels: &[usize],
    vocab_size: usize,
    num_classes: usize,
    max_len: usize,
    cfg: &FitConfig,
    mut on_epoch: impl FnMut(EpochStats),
) -> Model {
    let mut model = Model::init(vocab_size, num_classes, max_len, cfg);
    let weights = class_weights(labels, num_classes);

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut order: Vec<usize> = (0..padded.len()).collect();
    order.shuffle(&mut rng);

    let held_out = if padded.len() >= 10 {
        (padded.len() as f32 * 0.1).ceil() as usize
    } else {
        0
    };
    let (val_idx, train_idx) = order.split_at(held_out);
    let mut train_idx = train_idx.to_vec();

    for epoch in 0..cfg.epochs {
        train_idx.shuffle(&mut rng);
        let mut loss_sum = 0.0f32;
        for &i in &train_idx {
            loss_sum += model.sgd_step(&padded[i], labels[i], weights[labels[i]], cfg.learning_rate);
        }

        let eval: &[usize] = if val_idx.is_empty() { &train_idx } else { val_idx };
        let correct = eval
            .iter()
            .filter(|&&i| model.predict(&padded[i]) == labels[i])
            .count();
        let accuracy = if eval.is_empty() {
            0.0
        } else {
            correct as f32 / eval.len() as f32
        };

        on_epoch(EpochStats {
            epoch: epoch + 1,
            loss: loss_sum / train_idx.len().max(1) as f32,
            accuracy,
        });
    }

    model
}
