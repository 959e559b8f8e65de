//! Trained predictors on disk, one JSON file per segment.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use opscore_features::SegmentKey;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ArtifactError, PredictError};
use crate::predictor::Predictor;

pub const ARTIFACT_EXTENSION: &str = "json";

/// How well a fit did on the rows it was trained and validated on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FitMetrics {
    pub train_rows: usize,
    pub val_rows: usize,
    pub train_rmse: f64,
    pub val_rmse: f64,
    /// RMSE of always predicting the training mean.
    pub baseline_val_rmse: f64,
    pub iterations: usize,
}

/// A ridge regression over standardized features:
/// `intercept + sum(coeff_i * (x_i - mean_i) / std_i)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearArtifact {
    pub segment: String,
    pub registry_version: u32,
    pub feature_names: Vec<String>,
    pub feature_means: Vec<f64>,
    pub feature_stds: Vec<f64>,
    pub coeffs: Vec<f64>,
    pub intercept: f64,
    pub l2: f64,
    pub metrics: FitMetrics,
    pub trained_at: DateTime<Utc>,
}

impl LinearArtifact {
    fn check(&self, path: &Path) -> Result<(), ArtifactError> {
        let n = self.feature_names.len();
        if self.feature_means.len() != n || self.feature_stds.len() != n || self.coeffs.len() != n {
            return Err(ArtifactError::Malformed {
                path: path.to_path_buf(),
                reason: format!(
                    "{n} features but {} means, {} stds, {} coefficients",
                    self.feature_means.len(),
                    self.feature_stds.len(),
                    self.coeffs.len()
                ),
            });
        }
        Ok(())
    }
}

impl Predictor for LinearArtifact {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, features: &[f64]) -> Result<f64, PredictError> {
        if features.len() != self.coeffs.len() {
            return Err(PredictError::FeatureCount {
                expected: self.coeffs.len(),
                actual: features.len(),
            });
        }
        let z: f64 = features
            .iter()
            .zip(&self.feature_means)
            .zip(&self.feature_stds)
            .zip(&self.coeffs)
            .map(|(((x, mean), std), coeff)| coeff * standardized(*x, *mean, *std))
            .sum();
        Ok(self.intercept + z)
    }
}

pub(crate) fn standardized(x: f64, mean: f64, std: f64) -> f64 {
    (x - mean) / std.max(1e-6)
}

/// Where the scoring engine gets a segment's predictor from.
pub trait PredictorSource: Sync {
    /// `Ok(None)` when the segment has no predictor.
    fn load(&self, key: &SegmentKey) -> Result<Option<Arc<dyn Predictor>>, ArtifactError>;
}

/// A directory of `<stem>.json` artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactDir {
    root: PathBuf,
}

impl ArtifactDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &SegmentKey) -> PathBuf {
        self.root
            .join(format!("{}.{ARTIFACT_EXTENSION}", key.artifact_stem()))
    }

    pub fn save(&self, key: &SegmentKey, artifact: &LinearArtifact) -> Result<PathBuf, ArtifactError> {
        let path = self.path_for(key);
        let io_err = |source| ArtifactError::Io {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.root).map_err(io_err)?;
        let contents = serde_json::to_string_pretty(artifact).map_err(|source| ArtifactError::Parse {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, contents).map_err(io_err)?;
        Ok(path)
    }

    pub fn read(&self, key: &SegmentKey) -> Result<Option<LinearArtifact>, ArtifactError> {
        let path = self.path_for(key);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No artifact at {}", path.display());
                return Ok(None);
            }
            Err(source) => return Err(ArtifactError::Io { path, source }),
        };
        let artifact: LinearArtifact =
            serde_json::from_str(&contents).map_err(|source| ArtifactError::Parse {
                path: path.clone(),
                source,
            })?;
        artifact.check(&path)?;
        Ok(Some(artifact))
    }
}

impl PredictorSource for ArtifactDir {
    fn load(&self, key: &SegmentKey) -> Result<Option<Arc<dyn Predictor>>, ArtifactError> {
        Ok(self
            .read(key)?
            .map(|artifact| Arc::new(artifact) as Arc<dyn Predictor>))
    }
}

/// Predictors held in memory, keyed by segment.
#[derive(Default, Clone)]
pub struct InMemoryPredictors {
    predictors: HashMap<SegmentKey, Arc<dyn Predictor>>,
}

impl InMemoryPredictors {
    pub fn insert(&mut self, key: SegmentKey, predictor: Arc<dyn Predictor>) {
        self.predictors.insert(key, predictor);
    }
}

impl PredictorSource for InMemoryPredictors {
    fn load(&self, key: &SegmentKey) -> Result<Option<Arc<dyn Predictor>>, ArtifactError> {
        Ok(self.predictors.get(key).cloned())
    }
}
