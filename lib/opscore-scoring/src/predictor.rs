use opscore_features::MinuteFeatureRow;

use crate::error::PredictError;

/// A trained model that maps one ordered feature vector to a score.
///
/// The scoring engine only relies on the feature list a predictor reports;
/// how the number is produced is up to the implementation.
pub trait Predictor: Send + Sync {
    /// Feature names, in the order [`Predictor::predict`] expects them.
    fn feature_names(&self) -> &[String];

    fn predict(&self, features: &[f64]) -> Result<f64, PredictError>;
}

/// Project a row onto an ordered allow-list.
pub fn project(row: &MinuteFeatureRow, features: &[&str]) -> Result<Vec<f64>, PredictError> {
    features
        .iter()
        .map(|name| {
            row.feature(name)
                .ok_or_else(|| PredictError::MissingFeature(name.to_string()))
        })
        .collect()
}

/// Score every row with `predictor`, fed `features` in order.
///
/// Fails as a whole when the predictor was trained on a different list or
/// any single prediction fails.
pub fn predict_rows(
    predictor: &dyn Predictor,
    features: &[&str],
    rows: &[&MinuteFeatureRow],
) -> Result<Vec<f64>, PredictError> {
    let trained = predictor.feature_names();
    if trained.len() != features.len() || trained.iter().zip(features).any(|(a, b)| a != b) {
        return Err(PredictError::FeatureMismatch {
            expected: trained.to_vec(),
            actual: features.iter().map(|f| f.to_string()).collect(),
        });
    }

    rows.iter()
        .map(|row| {
            let score = predictor.predict(&project(row, features)?)?;
            if score.is_finite() {
                Ok(score)
            } else {
                Err(PredictError::NonFinite(score))
            }
        })
        .collect()
}
