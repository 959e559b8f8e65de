use anyhow::Context as _;
use opscore_db::DbHandler;
use opscore_features::FeatureRegistry;
use opscore_scoring::validate::validate_scored_rows;
use opscore_scoring::{ArtifactDir, ScoringEngine};
use tracing::info;

/// Scores the stored minute rows with the artifacts in the model directory.
#[derive(Debug)]
pub struct ScoreHandler<'a> {
    db: &'a DbHandler,
    registry: &'a FeatureRegistry,
    artifacts: ArtifactDir,
}

impl<'a> ScoreHandler<'a> {
    pub fn new(db: &'a DbHandler, registry: &'a FeatureRegistry, artifacts: ArtifactDir) -> Self {
        Self {
            db,
            registry,
            artifacts,
        }
    }

    /// Returns the number of scored rows written.
    #[tracing::instrument(skip_all)]
    pub async fn run(&self) -> anyhow::Result<u64> {
        let rows = self
            .db
            .get_minute_features()
            .await
            .context("Failed to read minute rows")?;
        info!("Scoring {} rows", rows.len());

        let engine = ScoringEngine::new(self.registry, &self.artifacts);
        let scored = tokio::task::block_in_place(|| engine.score(rows));

        let report = validate_scored_rows(&scored);
        report.log("scored_rows");
        if !report.is_ok() {
            anyhow::bail!("Scored table failed validation: {report}");
        }

        let written = self
            .db
            .replace_scored_rows(&scored)
            .await
            .context("Failed to store scored rows")?;
        info!("Stored {written} scored rows");
        Ok(written)
    }
}
