//! Fits one ridge regression per segment against `target_gold`.

use std::collections::BTreeMap;

use chrono::Utc;
use opscore_features::{FeatureRegistry, MinuteFeatureRow, SegmentKey};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::artifact::{standardized, FitMetrics, LinearArtifact};
use crate::error::TrainError;
use crate::predictor::project;

#[derive(Debug, Clone, Copy)]
pub struct TrainOptions {
    pub min_rows: usize,
    pub train_split: f64,
    pub seed: u64,
    pub l2: f64,
    pub learning_rate: f64,
    pub max_iters: usize,
    /// Stop after this many validation checks without improvement.
    pub patience: usize,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            min_rows: 10,
            train_split: 0.85,
            seed: 42,
            l2: 0.05,
            learning_rate: 0.05,
            max_iters: 2000,
            patience: 20,
        }
    }
}

const CHECK_EVERY: usize = 20;
const IMPROVEMENT_EPS: f64 = 1e-6;

struct Sample {
    x: Vec<f64>,
    y: f64,
}

/// Group rows by segment, the same way the scoring engine does.
pub fn partition(rows: &[MinuteFeatureRow]) -> BTreeMap<SegmentKey, Vec<&MinuteFeatureRow>> {
    let mut segments: BTreeMap<SegmentKey, Vec<&MinuteFeatureRow>> = BTreeMap::new();
    for row in rows {
        if let Some(key) = SegmentKey::for_row(row) {
            segments.entry(key).or_default().push(row);
        }
    }
    segments
}

/// Train every segment present in `rows`, in parallel. Segments that cannot
/// be trained come back as errors and are logged.
pub fn train_all(
    rows: &[MinuteFeatureRow],
    registry: &FeatureRegistry,
    options: &TrainOptions,
) -> Vec<(SegmentKey, Result<LinearArtifact, TrainError>)> {
    let results: Vec<_> = partition(rows)
        .into_par_iter()
        .map(|(key, members)| {
            let features = registry.features_for(&key);
            let result = train_segment(&key, &members, &features, registry.version(), options);
            (key, result)
        })
        .collect();

    for (key, result) in &results {
        match result {
            Ok(artifact) => info!(
                "Trained {key} on {} rows: val rmse {:.1} (baseline {:.1})",
                artifact.metrics.train_rows + artifact.metrics.val_rows,
                artifact.metrics.val_rmse,
                artifact.metrics.baseline_val_rmse
            ),
            Err(e) => warn!("Skipping {key}: {e}"),
        }
    }
    results
}

pub fn train_segment(
    key: &SegmentKey,
    rows: &[&MinuteFeatureRow],
    features: &[&str],
    registry_version: u32,
    options: &TrainOptions,
) -> Result<LinearArtifact, TrainError> {
    if features.is_empty() {
        return Err(TrainError::NoFeatures);
    }
    if rows.len() < options.min_rows.max(2) {
        return Err(TrainError::TooFewRows {
            rows: rows.len(),
            min: options.min_rows.max(2),
        });
    }

    let mut samples = rows
        .iter()
        .map(|row| -> Result<Sample, TrainError> {
            Ok(Sample {
                x: project(row, features)?,
                y: row.target_gold as f64,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    samples.shuffle(&mut StdRng::seed_from_u64(options.seed));

    let split_idx = split_train_index(samples.len(), options.train_split);
    let (means, stds) = feature_norm_stats(&samples[..split_idx], features.len());
    for sample in &mut samples {
        for (i, x) in sample.x.iter_mut().enumerate() {
            *x = standardized(*x, means[i], stds[i]);
        }
    }
    let (train, val) = samples.split_at(split_idx);

    let intercept = train.iter().map(|s| s.y).sum::<f64>() / train.len() as f64;
    let baseline_val_rmse = rmse(&vec![0.0; features.len()], intercept, val);
    let (coeffs, intercept, iterations) = fit_coeffs(train, val, intercept, options);

    let metrics = FitMetrics {
        train_rows: train.len(),
        val_rows: val.len(),
        train_rmse: rmse(&coeffs, intercept, train),
        val_rmse: rmse(&coeffs, intercept, val),
        baseline_val_rmse,
        iterations,
    };
    if !metrics.train_rmse.is_finite() || coeffs.iter().any(|c| !c.is_finite()) {
        return Err(TrainError::Diverged);
    }

    Ok(LinearArtifact {
        segment: key.artifact_stem(),
        registry_version,
        feature_names: features.iter().map(|f| f.to_string()).collect(),
        feature_means: means,
        feature_stds: stds,
        coeffs,
        intercept,
        l2: options.l2,
        metrics,
        trained_at: Utc::now(),
    })
}

fn split_train_index(n: usize, train_split: f64) -> usize {
    let idx = ((n as f64) * train_split).round() as usize;
    idx.clamp(1, n.saturating_sub(1))
}

fn feature_norm_stats(samples: &[Sample], n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut mean = vec![0.0; n];
    let mut var = vec![0.0; n];
    let count = samples.len().max(1) as f64;

    for sample in samples {
        for (m, x) in mean.iter_mut().zip(&sample.x) {
            *m += x;
        }
    }
    for m in &mut mean {
        *m /= count;
    }

    for sample in samples {
        for ((v, m), x) in var.iter_mut().zip(&mean).zip(&sample.x) {
            let d = x - m;
            *v += d * d;
        }
    }
    let stds = var.into_iter().map(|v| (v / count).sqrt().max(1e-6)).collect();
    (mean, stds)
}

fn predict(coeffs: &[f64], intercept: f64, x: &[f64]) -> f64 {
    intercept + coeffs.iter().zip(x).map(|(c, x)| c * x).sum::<f64>()
}

fn rmse(coeffs: &[f64], intercept: f64, samples: &[Sample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sse: f64 = samples
        .iter()
        .map(|s| (predict(coeffs, intercept, &s.x) - s.y).powi(2))
        .sum();
    (sse / samples.len() as f64).sqrt()
}

/// Batch gradient descent on squared error plus an L2 penalty on the
/// coefficients (not the intercept). Keeps the coefficients with the best
/// validation error.
fn fit_coeffs(
    train: &[Sample],
    val: &[Sample],
    intercept: f64,
    options: &TrainOptions,
) -> (Vec<f64>, f64, usize) {
    let n = train.first().map_or(0, |s| s.x.len());
    let count = train.len() as f64;
    let mut coeffs = vec![0.0; n];
    let mut intercept = intercept;
    let mut best = (coeffs.clone(), intercept);
    let mut best_val = rmse(&coeffs, intercept, val);
    let mut no_improve = 0usize;
    let mut iterations = 0;

    for iter in 0..options.max_iters {
        iterations = iter + 1;
        let mut grad = vec![0.0; n];
        let mut grad_intercept = 0.0;
        for sample in train {
            let residual = predict(&coeffs, intercept, &sample.x) - sample.y;
            grad_intercept += residual;
            for (g, x) in grad.iter_mut().zip(&sample.x) {
                *g += residual * x;
            }
        }

        let lr = options.learning_rate / (1.0 + iter as f64 * 0.003);
        for (c, g) in coeffs.iter_mut().zip(&grad) {
            *c -= lr * (g / count + options.l2 * *c);
        }
        intercept -= lr * grad_intercept / count;

        if iter % CHECK_EVERY == 0 || iter + 1 == options.max_iters {
            let val_rmse = rmse(&coeffs, intercept, val);
            if val_rmse + IMPROVEMENT_EPS < best_val {
                best_val = val_rmse;
                best = (coeffs.clone(), intercept);
                no_improve = 0;
            } else {
                no_improve += 1;
                if no_improve >= options.patience {
                    break;
                }
            }
        }
    }

    let (coeffs, intercept) = best;
    (coeffs, intercept, iterations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::Predictor;
    use opscore_features::{Lane, Phase, SupportRole};

    fn rows(n: i64) -> Vec<MinuteFeatureRow> {
        (0..n)
            .map(|i| MinuteFeatureRow {
                match_id: format!("NA1_{i}"),
                lane: Lane::Adc,
                minute: 5,
                duration_min: 30,
                cs: 20 + (i * 7) % 40,
                xp: 1000 + (i * 13) % 300,
                target_gold: 8000 + 100 * (20 + (i * 7) % 40),
                ..Default::default()
            })
            .collect()
    }

    fn key() -> SegmentKey {
        SegmentKey::new(Lane::Adc, Phase::Early, SupportRole::Damage).unwrap()
    }

    #[test]
    fn split_keeps_both_sides_non_empty() {
        assert_eq!(split_train_index(10, 0.85), 9);
        assert_eq!(split_train_index(100, 0.85), 85);
        assert_eq!(split_train_index(2, 0.85), 1);
    }

    #[test]
    fn too_few_rows() {
        let rows = rows(9);
        let refs: Vec<_> = rows.iter().collect();
        let err = train_segment(&key(), &refs, &["cs"], 1, &TrainOptions::default()).unwrap_err();
        assert!(matches!(err, TrainError::TooFewRows { rows: 9, min: 10 }));
    }

    #[test]
    fn no_features() {
        let rows = rows(20);
        let refs: Vec<_> = rows.iter().collect();
        let err = train_segment(&key(), &refs, &[], 1, &TrainOptions::default()).unwrap_err();
        assert!(matches!(err, TrainError::NoFeatures));
    }

    #[test]
    fn learns_a_linear_target() {
        let rows = rows(200);
        let refs: Vec<_> = rows.iter().collect();
        let artifact =
            train_segment(&key(), &refs, &["cs", "xp"], 3, &TrainOptions::default()).unwrap();

        assert_eq!(artifact.segment, "ADC_early");
        assert_eq!(artifact.registry_version, 3);
        assert_eq!(artifact.feature_names, vec!["cs".to_string(), "xp".to_string()]);
        assert_eq!(artifact.metrics.train_rows, 170);
        assert_eq!(artifact.metrics.val_rows, 30);
        assert!(artifact.metrics.val_rmse < artifact.metrics.baseline_val_rmse);

        let low = artifact.predict(&[20.0, 1100.0]).unwrap();
        let high = artifact.predict(&[55.0, 1100.0]).unwrap();
        assert!(high > low);
    }

    #[test]
    fn training_is_deterministic() {
        let rows = rows(60);
        let refs: Vec<_> = rows.iter().collect();
        let a = train_segment(&key(), &refs, &["cs"], 1, &TrainOptions::default()).unwrap();
        let b = train_segment(&key(), &refs, &["cs"], 1, &TrainOptions::default()).unwrap();
        assert_eq!(a.coeffs, b.coeffs);
        assert_eq!(a.intercept, b.intercept);
    }
}
