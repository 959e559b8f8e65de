//! Scores the minute-feature table: segment predictors blended with a manual
//! heuristic, normalized across the whole table.

pub mod artifact;
pub mod engine;
pub mod error;
pub mod manual;
pub mod predictor;
pub mod train;
pub mod validate;

pub use artifact::{ArtifactDir, InMemoryPredictors, LinearArtifact, PredictorSource};
pub use engine::{normalize, BlendWeights, ScoredRow, ScoringEngine};
pub use error::{ArtifactError, PredictError, TrainError};
pub use predictor::Predictor;
pub use train::{train_all, TrainOptions};
