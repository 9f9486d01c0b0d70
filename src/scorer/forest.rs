//! Random-forest training and inference
//!
//! A small in-crate forest: gini-split decision trees over bootstrap
//! samples with per-split feature subsampling, class-balanced sample
//! weights, and feature standardization. Training is fully deterministic
//! for a given seed, so a retrain over the same feedback set reproduces
//! the same model bit for bit.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TrainingConfig;
use crate::error::TrainingError;
use crate::types::{ModelInfo, FEATURE_SLOT_COUNT};

/// Fraction of samples held out for the accuracy estimate
const HOLDOUT_FRACTION: f32 = 0.25;

/// Minimum gini improvement for a split to be kept
const MIN_GINI_GAIN: f32 = 1e-7;

/// Per-column standardization fitted on the training set
///
/// Constant columns pass through centered but unscaled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureScaler {
    means: Vec<f32>,
    scales: Vec<f32>,
}

impl FeatureScaler {
    /// Fit means and scales column by column
    ///
    /// Callers guarantee `rows` is non-empty and rectangular.
    pub fn fit(rows: &[Vec<f32>]) -> Self {
        let width = rows.first().map(|row| row.len()).unwrap_or(0);
        let count = rows.len() as f64;
        let mut means = Vec::with_capacity(width);
        let mut scales = Vec::with_capacity(width);

        for column in 0..width {
            let mut min = f32::INFINITY;
            let mut max = f32::NEG_INFINITY;
            let mut sum = 0.0f64;
            for row in rows {
                let value = row[column];
                min = min.min(value);
                max = max.max(value);
                sum += f64::from(value);
            }
            let mean = sum / count;

            let scale = if min == max {
                1.0
            } else {
                let variance = rows
                    .iter()
                    .map(|row| {
                        let delta = f64::from(row[column]) - mean;
                        delta * delta
                    })
                    .sum::<f64>()
                    / count;
                variance.sqrt() as f32
            };

            means.push(mean as f32);
            scales.push(scale);
        }

        Self { means, scales }
    }

    pub fn transform(&self, row: &[f32]) -> Vec<f32> {
        row.iter()
            .zip(self.means.iter().zip(self.scales.iter()))
            .map(|(value, (mean, scale))| (value - mean) / scale)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        positive_fraction: f32,
    },
    Split {
        feature: usize,
        threshold: f32,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// A single gini-split tree over standardized features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: TreeNode,
}

impl DecisionTree {
    fn predict_proba(&self, row: &[f32]) -> f32 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { positive_fraction } => return *positive_fraction,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

/// Shared inputs for growing one tree
struct TreeBuilder<'a> {
    rows: &'a [Vec<f32>],
    labels: &'a [bool],
    sample_weights: &'a [f32],
    max_depth: usize,
    features_per_split: usize,
    width: usize,
}

impl TreeBuilder<'_> {
    fn grow(&self, indices: &[usize], depth: usize, rng: &mut StdRng) -> TreeNode {
        let (positive_weight, total_weight) = self.weigh(indices);
        let fraction = if total_weight > 0.0 {
            positive_weight / total_weight
        } else {
            0.5
        };

        if depth >= self.max_depth || indices.len() < 2 || fraction == 0.0 || fraction == 1.0 {
            return TreeNode::Leaf {
                positive_fraction: fraction,
            };
        }

        let parent_gini = gini(fraction);
        match self.best_split(indices, parent_gini, rng) {
            Some((feature, threshold)) => {
                let (left, right): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&index| self.rows[index][feature] <= threshold);
                TreeNode::Split {
                    feature,
                    threshold,
                    left: Box::new(self.grow(&left, depth + 1, rng)),
                    right: Box::new(self.grow(&right, depth + 1, rng)),
                }
            }
            None => TreeNode::Leaf {
                positive_fraction: fraction,
            },
        }
    }

    /// Best (feature, threshold) among a random feature subset, if any
    /// candidate actually reduces impurity
    fn best_split(
        &self,
        indices: &[usize],
        parent_gini: f32,
        rng: &mut StdRng,
    ) -> Option<(usize, f32)> {
        let candidates = rand::seq::index::sample(rng, self.width, self.features_per_split);
        let mut best: Option<(usize, f32, f32)> = None;

        for feature in candidates {
            let mut values: Vec<f32> = indices
                .iter()
                .map(|&index| self.rows[index][feature])
                .collect();
            values.sort_by(f32::total_cmp);
            values.dedup();

            for pair in values.windows(2) {
                let threshold = (pair[0] + pair[1]) / 2.0;
                let split_gini = self.split_gini(indices, feature, threshold);
                let improved = match best {
                    Some((_, _, current)) => split_gini < current,
                    None => split_gini < parent_gini - MIN_GINI_GAIN,
                };
                if improved {
                    best = Some((feature, threshold, split_gini));
                }
            }
        }

        best.map(|(feature, threshold, _)| (feature, threshold))
    }

    /// Weighted gini of a candidate split
    fn split_gini(&self, indices: &[usize], feature: usize, threshold: f32) -> f32 {
        let mut left_positive = 0.0;
        let mut left_total = 0.0;
        let mut right_positive = 0.0;
        let mut right_total = 0.0;

        for &index in indices {
            let weight = self.sample_weights[index];
            if self.rows[index][feature] <= threshold {
                left_total += weight;
                if self.labels[index] {
                    left_positive += weight;
                }
            } else {
                right_total += weight;
                if self.labels[index] {
                    right_positive += weight;
                }
            }
        }

        let total = left_total + right_total;
        let left_gini = gini(left_positive / left_total.max(f32::MIN_POSITIVE));
        let right_gini = gini(right_positive / right_total.max(f32::MIN_POSITIVE));
        (left_total * left_gini + right_total * right_gini) / total.max(f32::MIN_POSITIVE)
    }

    fn weigh(&self, indices: &[usize]) -> (f32, f32) {
        let mut positive = 0.0;
        let mut total = 0.0;
        for &index in indices {
            let weight = self.sample_weights[index];
            total += weight;
            if self.labels[index] {
                positive += weight;
            }
        }
        (positive, total)
    }
}

fn gini(positive_fraction: f32) -> f32 {
    2.0 * positive_fraction * (1.0 - positive_fraction)
}

/// Bagged ensemble of decision trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    feature_len: usize,
}

impl RandomForest {
    /// Fit an ensemble over already-standardized rows
    ///
    /// Sample weights are balanced by class so a lopsided label
    /// distribution does not collapse every leaf to the majority vote.
    pub fn fit(
        rows: &[Vec<f32>],
        labels: &[bool],
        tree_count: usize,
        max_depth: usize,
        seed: u64,
    ) -> Result<Self, TrainingError> {
        if rows.is_empty() {
            return Err(TrainingError::EmptySet);
        }
        let width = rows[0].len();
        for row in rows {
            if row.len() != width {
                return Err(TrainingError::ShapeMismatch {
                    expected: width,
                    actual: row.len(),
                });
            }
        }

        let positive_count = labels.iter().filter(|&&label| label).count();
        let negative_count = labels.len() - positive_count;
        if positive_count == 0 || negative_count == 0 {
            return Err(TrainingError::SingleClass);
        }

        let total = labels.len() as f32;
        let positive_weight = total / (2.0 * positive_count as f32);
        let negative_weight = total / (2.0 * negative_count as f32);
        let sample_weights: Vec<f32> = labels
            .iter()
            .map(|&label| {
                if label {
                    positive_weight
                } else {
                    negative_weight
                }
            })
            .collect();

        let features_per_split = ((width as f64).sqrt().ceil() as usize).clamp(1, width);
        let builder = TreeBuilder {
            rows,
            labels,
            sample_weights: &sample_weights,
            max_depth,
            features_per_split,
            width,
        };

        let mut rng = StdRng::seed_from_u64(seed);
        let mut trees = Vec::with_capacity(tree_count);
        for _ in 0..tree_count {
            let bootstrap: Vec<usize> = (0..rows.len())
                .map(|_| rng.gen_range(0..rows.len()))
                .collect();
            trees.push(DecisionTree {
                root: builder.grow(&bootstrap, 0, &mut rng),
            });
        }

        Ok(Self {
            trees,
            feature_len: width,
        })
    }

    /// Mean positive fraction across the ensemble
    pub fn predict_proba(&self, row: &[f32]) -> f32 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let sum: f32 = self
            .trees
            .iter()
            .map(|tree| tree.predict_proba(row))
            .sum();
        sum / self.trees.len() as f32
    }

    pub fn feature_len(&self) -> usize {
        self.feature_len
    }
}

/// A fitted model plus everything needed to reuse and describe it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    version: u32,
    trained_at: DateTime<Utc>,
    sample_count: usize,
    accuracy: Option<f32>,
    scaler: FeatureScaler,
    forest: RandomForest,
}

impl TrainedModel {
    /// Train on labeled feature rows
    ///
    /// With enough samples a 25% holdout estimates accuracy first, then
    /// the final model is refitted on the full set.
    pub fn fit(
        samples: &[(Vec<f32>, bool)],
        version: u32,
        config: &TrainingConfig,
    ) -> Result<Self, TrainingError> {
        if samples.is_empty() {
            return Err(TrainingError::EmptySet);
        }
        for (row, _) in samples {
            if row.len() != FEATURE_SLOT_COUNT {
                return Err(TrainingError::ShapeMismatch {
                    expected: FEATURE_SLOT_COUNT,
                    actual: row.len(),
                });
            }
        }

        let rows: Vec<Vec<f32>> = samples.iter().map(|(row, _)| row.clone()).collect();
        let labels: Vec<bool> = samples.iter().map(|&(_, label)| label).collect();

        let accuracy = if samples.len() >= config.holdout_min_samples {
            holdout_accuracy(&rows, &labels, config)
        } else {
            None
        };

        let scaler = FeatureScaler::fit(&rows);
        let scaled: Vec<Vec<f32>> = rows.iter().map(|row| scaler.transform(row)).collect();
        let forest = RandomForest::fit(
            &scaled,
            &labels,
            config.tree_count,
            config.max_depth,
            config.seed,
        )?;

        debug!(
            version,
            samples = samples.len(),
            accuracy = ?accuracy,
            "Fitted relevance model"
        );

        Ok(Self {
            version,
            trained_at: Utc::now(),
            sample_count: samples.len(),
            accuracy,
            scaler,
            forest,
        })
    }

    /// Positive-class probability for one feature row
    pub fn predict(&self, values: &[f32]) -> f32 {
        let scaled = self.scaler.transform(values);
        self.forest.predict_proba(&scaled)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn feature_len(&self) -> usize {
        self.forest.feature_len()
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            version: self.version,
            trained_at: self.trained_at,
            sample_count: self.sample_count,
            accuracy: self.accuracy,
        }
    }
}

/// Fit on a shuffled 75% and score the held-out 25%
///
/// Returns None when the shuffled training part ends up single-class,
/// in which case no estimate is better than a meaningless one.
fn holdout_accuracy(rows: &[Vec<f32>], labels: &[bool], config: &TrainingConfig) -> Option<f32> {
    let mut indices: Vec<usize> = (0..rows.len()).collect();
    let mut rng = StdRng::seed_from_u64(config.seed);
    indices.shuffle(&mut rng);

    let holdout_len = ((rows.len() as f32 * HOLDOUT_FRACTION) as usize).max(1);
    let (test_indices, train_indices) = indices.split_at(holdout_len);

    let train_rows: Vec<Vec<f32>> = train_indices.iter().map(|&i| rows[i].clone()).collect();
    let train_labels: Vec<bool> = train_indices.iter().map(|&i| labels[i]).collect();

    let scaler = FeatureScaler::fit(&train_rows);
    let scaled: Vec<Vec<f32>> = train_rows.iter().map(|row| scaler.transform(row)).collect();
    let forest = RandomForest::fit(
        &scaled,
        &train_labels,
        config.tree_count,
        config.max_depth,
        config.seed,
    )
    .ok()?;

    let correct = test_indices
        .iter()
        .filter(|&&i| {
            let proba = forest.predict_proba(&scaler.transform(&rows[i]));
            (proba >= 0.5) == labels[i]
        })
        .count();
    Some(correct as f32 / test_indices.len() as f32)
}
