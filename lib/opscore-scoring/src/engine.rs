//! Segmented scoring: per-segment model scores, the manual heuristic, the blend,
//! and min-max normalization over the whole scored table.

use std::collections::BTreeMap;
use std::fmt;

use opscore_features::{FeatureRegistry, MinuteFeatureRow, Phase, SegmentKey};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::artifact::PredictorSource;
use crate::manual::manual_score;
use crate::predictor::predict_rows;

/// Weights of the manual and model scores in `op_score`. Each pair sums to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeights {
    pub manual: f64,
    pub model: f64,
}

impl BlendWeights {
    pub const END: BlendWeights = BlendWeights {
        manual: 0.2,
        model: 0.8,
    };
    pub const OTHER: BlendWeights = BlendWeights {
        manual: 0.1,
        model: 0.9,
    };

    pub fn for_phase(phase: Phase) -> BlendWeights {
        match phase {
            Phase::End => Self::END,
            Phase::Early | Phase::Late => Self::OTHER,
        }
    }

    /// The weights are applied as-is even when the model score is missing.
    pub fn blend(&self, manual_score: f64, model_score: f64) -> f64 {
        self.manual * manual_score + self.model * model_score
    }
}

/// A minute row with its scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRow {
    #[serde(flatten)]
    pub row: MinuteFeatureRow,
    pub phase: Phase,
    pub model_score: f64,
    pub manual_score: f64,
    pub op_score: f64,
    pub final_score_norm: f64,
}

pub struct ScoringEngine<'a> {
    registry: &'a FeatureRegistry,
    predictors: &'a dyn PredictorSource,
}

impl fmt::Debug for ScoringEngine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoringEngine")
            .field("registry_version", &self.registry.version())
            .finish_non_exhaustive()
    }
}

impl<'a> ScoringEngine<'a> {
    pub fn new(registry: &'a FeatureRegistry, predictors: &'a dyn PredictorSource) -> Self {
        Self {
            registry,
            predictors,
        }
    }

    /// Score every row. Output order matches input order.
    ///
    /// Segments are scored in parallel. Rows with an unscored lane keep zero
    /// model and manual scores but still take part in normalization.
    pub fn score(&self, rows: Vec<MinuteFeatureRow>) -> Vec<ScoredRow> {
        let mut segments: BTreeMap<SegmentKey, Vec<usize>> = BTreeMap::new();
        let mut unsegmented = 0usize;
        for (idx, row) in rows.iter().enumerate() {
            match SegmentKey::for_row(row) {
                Some(key) => segments.entry(key).or_default().push(idx),
                None => unsegmented += 1,
            }
        }
        if unsegmented > 0 {
            warn!("{unsegmented} row(s) have no segment and are scored as 0");
        }

        let segment_scores: Vec<(Vec<usize>, Vec<f64>, Vec<f64>)> = segments
            .into_par_iter()
            .map(|(key, indices)| {
                let members: Vec<&MinuteFeatureRow> = indices.iter().map(|idx| &rows[*idx]).collect();
                let model = self.model_scores(&key, &members);
                let manual: Vec<f64> = members
                    .iter()
                    .map(|row| manual_score(row, key.phase))
                    .collect();
                (indices, model, manual)
            })
            .collect();

        let mut model_scores = vec![0.0; rows.len()];
        let mut manual_scores = vec![0.0; rows.len()];
        for (indices, model, manual) in segment_scores {
            for ((idx, model), manual) in indices.into_iter().zip(model).zip(manual) {
                model_scores[idx] = model;
                manual_scores[idx] = manual;
            }
        }

        let mut scored: Vec<ScoredRow> = rows
            .into_iter()
            .zip(model_scores.into_iter().zip(manual_scores))
            .map(|(row, (model_score, manual_score))| {
                let phase = Phase::of_row(&row);
                ScoredRow {
                    op_score: BlendWeights::for_phase(phase).blend(manual_score, model_score),
                    row,
                    phase,
                    model_score,
                    manual_score,
                    final_score_norm: 0.0,
                }
            })
            .collect();

        normalize(&mut scored);
        info!("Scored {} rows", scored.len());
        scored
    }

    /// Model scores for one segment's rows, or all zeros when the segment has
    /// no usable predictor.
    fn model_scores(&self, key: &SegmentKey, rows: &[&MinuteFeatureRow]) -> Vec<f64> {
        let zeros = || vec![0.0; rows.len()];
        let predictor = match self.predictors.load(key) {
            Ok(Some(predictor)) => predictor,
            Ok(None) => {
                debug!("No predictor for {key}, model score is 0 for {} rows", rows.len());
                return zeros();
            }
            Err(e) => {
                warn!("Failed to load predictor {key}: {e}");
                return zeros();
            }
        };

        let features = self.registry.features_for(key);
        match predict_rows(predictor.as_ref(), &features, rows) {
            Ok(scores) => scores,
            Err(e) => {
                warn!("Predictor {key} failed, model score is 0 for {} rows: {e}", rows.len());
                zeros()
            }
        }
    }
}

/// Min-max normalize `op_score` across every row. A zero range maps every row
/// to 0.
pub fn normalize(rows: &mut [ScoredRow]) {
    let (min, max) = rows
        .iter()
        .map(|row| row.op_score)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), score| {
            (min.min(score), max.max(score))
        });
    let range = max - min;
    for row in rows.iter_mut() {
        row.final_score_norm = if range > 0.0 && range.is_finite() {
            (row.op_score - min) / range
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(op_score: f64) -> ScoredRow {
        ScoredRow {
            row: MinuteFeatureRow::default(),
            phase: Phase::Early,
            model_score: 0.0,
            manual_score: 0.0,
            op_score,
            final_score_norm: -1.0,
        }
    }

    #[test]
    fn blend_weights_sum_to_one() {
        assert_eq!(BlendWeights::END.manual + BlendWeights::END.model, 1.0);
        assert_eq!(BlendWeights::OTHER.manual + BlendWeights::OTHER.model, 1.0);
        assert_eq!(BlendWeights::for_phase(Phase::End), BlendWeights::END);
        assert_eq!(BlendWeights::for_phase(Phase::Late), BlendWeights::OTHER);
    }

    #[test]
    fn end_phase_blend() {
        let op = BlendWeights::for_phase(Phase::End).blend(2.0, 5.0);
        assert!((op - 4.4).abs() < 1e-12);
    }

    #[test]
    fn constant_scores_normalize_to_zero() {
        let mut rows: Vec<_> = (0..5).map(|_| scored(7.0)).collect();
        normalize(&mut rows);
        assert!(rows.iter().all(|row| row.final_score_norm == 0.0));
    }

    #[test]
    fn normalization_spans_zero_to_one() {
        let mut rows = vec![scored(-2.0), scored(3.0), scored(8.0)];
        normalize(&mut rows);
        let norms: Vec<f64> = rows.iter().map(|row| row.final_score_norm).collect();
        assert_eq!(norms, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn debug_shows_registry_version() {
        let predictors = crate::artifact::InMemoryPredictors::default();
        let registry = FeatureRegistry::global();
        let engine = ScoringEngine::new(registry, &predictors);
        let debug = format!("{engine:?}");
        assert!(debug.starts_with("ScoringEngine"));
        assert!(debug.contains(&format!("registry_version: {}", registry.version())));
    }

    #[test]
    fn empty_table_normalizes() {
        let mut rows: Vec<ScoredRow> = Vec::new();
        normalize(&mut rows);
        assert!(rows.is_empty());
    }
}
