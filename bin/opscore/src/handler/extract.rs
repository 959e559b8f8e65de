use anyhow::Context as _;
use opscore_db::DbHandler;
use opscore_features::telemetry::discover_match_files;
use opscore_features::validate::validate_minute_rows;
use opscore_features::{aggregate_batch, FeatureRegistry};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct ExtractSummary {
    pub matches: usize,
    pub failed: usize,
    pub rows: u64,
}

/// Turns the raw documents on disk into stored minute rows.
#[derive(Debug)]
pub struct ExtractHandler<'a> {
    db: &'a DbHandler,
    registry: &'a FeatureRegistry,
    match_dir: PathBuf,
    timeline_dir: PathBuf,
}

impl<'a> ExtractHandler<'a> {
    pub fn new(
        db: &'a DbHandler,
        registry: &'a FeatureRegistry,
        match_dir: PathBuf,
        timeline_dir: PathBuf,
    ) -> Self {
        Self {
            db,
            registry,
            match_dir,
            timeline_dir,
        }
    }

    #[tracing::instrument(skip_all)]
    pub async fn run(&self) -> anyhow::Result<ExtractSummary> {
        let (pairs, unpaired) = discover_match_files(&self.match_dir, &self.timeline_dir)
            .context("Failed to list raw documents")?;
        for match_id in &unpaired {
            warn!("Skipping {match_id}: match or timeline document is missing");
        }
        info!("Aggregating {} matches", pairs.len());

        let batch = tokio::task::block_in_place(|| aggregate_batch(&pairs, self.registry));

        let report = validate_minute_rows(&batch.rows);
        report.log("minute_features");
        if !report.is_ok() {
            anyhow::bail!("Minute table failed validation: {report}");
        }

        let rows = self
            .db
            .replace_minute_features(&batch.rows)
            .await
            .context("Failed to store minute rows")?;
        let stored_matches = self
            .db
            .get_match_ids()
            .await
            .context("Failed to list stored matches")?;
        info!(
            "Stored {rows} minute rows; the table now holds {} matches",
            stored_matches.len()
        );

        Ok(ExtractSummary {
            matches: batch.succeeded.len(),
            failed: batch.failures.len(),
            rows,
        })
    }
}
