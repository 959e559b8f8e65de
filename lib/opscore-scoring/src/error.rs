use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },
    #[error("feature list {actual:?} does not match the trained list {expected:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    #[error("row is missing feature {0}")]
    MissingFeature(String),
    #[error("prediction is not finite: {0}")]
    NonFinite(f64),
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to access artifact {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("artifact {path} is inconsistent: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("only {rows} rows, need at least {min}")]
    TooFewRows { rows: usize, min: usize },
    #[error("segment has no features")]
    NoFeatures,
    #[error(transparent)]
    Predict(#[from] PredictError),
    #[error("fit diverged")]
    Diverged,
}
