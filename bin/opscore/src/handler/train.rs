use anyhow::Context as _;
use opscore_db::DbHandler;
use opscore_features::FeatureRegistry;
use opscore_scoring::{train_all, ArtifactDir, TrainOptions};
use tracing::{error, info};

/// Fits one predictor per segment from the stored minute rows and writes them
/// to the model directory.
#[derive(Debug)]
pub struct TrainHandler<'a> {
    db: &'a DbHandler,
    registry: &'a FeatureRegistry,
    artifacts: ArtifactDir,
    options: TrainOptions,
}

impl<'a> TrainHandler<'a> {
    pub fn new(db: &'a DbHandler, registry: &'a FeatureRegistry, artifacts: ArtifactDir) -> Self {
        Self {
            db,
            registry,
            artifacts,
            options: TrainOptions::default(),
        }
    }

    /// Returns the number of artifacts written.
    #[tracing::instrument(skip_all)]
    pub async fn run(&self) -> anyhow::Result<usize> {
        let rows = self
            .db
            .get_minute_features()
            .await
            .context("Failed to read minute rows")?;
        info!("Training on {} rows", rows.len());

        let results =
            tokio::task::block_in_place(|| train_all(&rows, self.registry, &self.options));

        let mut saved = 0;
        for (key, result) in results {
            let Ok(artifact) = result else {
                continue;
            };
            match self.artifacts.save(&key, &artifact) {
                Ok(path) => {
                    info!("Wrote {}", path.display());
                    saved += 1;
                }
                Err(e) => error!("Failed to save {key}: {e}"),
            }
        }
        info!(
            "Wrote {saved} artifacts to {}",
            self.artifacts.root().display()
        );
        Ok(saved)
    }
}
