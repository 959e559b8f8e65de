use anyhow::Context as _;
use opscore_features::telemetry::{document_file_name, MATCH_FILE_PREFIX, TIMELINE_FILE_PREFIX};
use riven::consts::RegionalRoute;
use riven::RiotApi;
use std::path::{Path, PathBuf};
use tracing::debug;

// Max value that Riot API accepts for getting match IDs
pub const MAX_MATCHES: i32 = 100;

/// What became of one match ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Download {
    Saved,
    AlreadyPresent,
    NotFound,
}

/// Downloads match and timeline documents from the Riot API into the raw
/// directories.
pub struct MatchFetcher {
    riot_api: RiotApi,
    route: RegionalRoute,
    match_dir: PathBuf,
    timeline_dir: PathBuf,
}

impl std::fmt::Debug for MatchFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchFetcher")
            .field("route", &self.route)
            .field("match_dir", &self.match_dir)
            .field("timeline_dir", &self.timeline_dir)
            .finish()
    }
}

impl MatchFetcher {
    pub fn new(
        riot_api: RiotApi,
        route: RegionalRoute,
        match_dir: PathBuf,
        timeline_dir: PathBuf,
    ) -> Self {
        Self {
            riot_api,
            route,
            match_dir,
            timeline_dir,
        }
    }

    /// Resolve a Riot ID to a PUUID. `Ok(None)` when no such account exists.
    pub async fn get_puuid(&self, game_name: &str, tag_line: &str) -> anyhow::Result<Option<String>> {
        let account = self
            .riot_api
            .account_v1()
            .get_by_riot_id(self.route, game_name, tag_line)
            .await
            .context("Failed to look up account")?;
        Ok(account.map(|account| account.puuid))
    }

    /// Most recent match IDs of a player, newest first.
    pub async fn get_match_ids(&self, puuid: &str, count: i32) -> anyhow::Result<Vec<String>> {
        self.riot_api
            .match_v5()
            .get_match_ids_by_puuid(
                self.route,
                puuid,
                Some(count.clamp(1, MAX_MATCHES)),
                None,
                None,
                None,
                None,
                None,
            )
            .await
            .context("Failed to get match IDs")
    }

    /// Fetch both documents of a match unless they are already on disk.
    pub async fn download(&self, match_id: &str) -> anyhow::Result<Download> {
        let match_path = self
            .match_dir
            .join(document_file_name(MATCH_FILE_PREFIX, match_id));
        let timeline_path = self
            .timeline_dir
            .join(document_file_name(TIMELINE_FILE_PREFIX, match_id));
        if exists(&match_path).await && exists(&timeline_path).await {
            debug!("Already have {match_id}");
            return Ok(Download::AlreadyPresent);
        }

        let api = self.riot_api.match_v5();
        let Some(match_data) = api
            .get_match(self.route, match_id)
            .await
            .with_context(|| format!("Failed to get match {match_id}"))?
        else {
            return Ok(Download::NotFound);
        };
        let Some(timeline) = api
            .get_timeline(self.route, match_id)
            .await
            .with_context(|| format!("Failed to get timeline {match_id}"))?
        else {
            return Ok(Download::NotFound);
        };

        write_json(&match_path, &match_data).await?;
        write_json(&timeline_path, &timeline).await?;
        debug!("Saved {match_id}");
        Ok(Download::Saved)
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let contents = serde_json::to_vec(value)?;
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
