use crate::riot_api::{Download, MatchFetcher};
use tracing::{error, info, warn};

/// Who to fetch matches for.
#[derive(Debug, Clone)]
pub enum Player {
    RiotId { game_name: String, tag_line: String },
    Puuid(String),
}

impl Player {
    /// Parse `NAME#TAG`.
    pub fn from_riot_id(riot_id: &str) -> anyhow::Result<Self> {
        let Some((game_name, tag_line)) = riot_id.rsplit_once('#') else {
            anyhow::bail!("Riot ID {riot_id:?} should look like NAME#TAG");
        };
        if game_name.is_empty() || tag_line.is_empty() {
            anyhow::bail!("Riot ID {riot_id:?} should look like NAME#TAG");
        }
        Ok(Player::RiotId {
            game_name: game_name.to_string(),
            tag_line: tag_line.to_string(),
        })
    }
}

#[derive(Debug, Default)]
pub struct FetchSummary {
    pub saved: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct FetchHandler {
    fetcher: MatchFetcher,
}

impl FetchHandler {
    pub fn new(fetcher: MatchFetcher) -> Self {
        Self { fetcher }
    }

    /// Download the `count` most recent matches of `player`. A match that
    /// fails to download is logged and the rest continue.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, player: Player, count: i32) -> anyhow::Result<FetchSummary> {
        let puuid = match player {
            Player::Puuid(puuid) => puuid,
            Player::RiotId {
                game_name,
                tag_line,
            } => match self.fetcher.get_puuid(&game_name, &tag_line).await? {
                Some(puuid) => puuid,
                None => anyhow::bail!("No account found for {game_name}#{tag_line}"),
            },
        };

        let match_ids = self.fetcher.get_match_ids(&puuid, count).await?;
        info!("Found {} match IDs", match_ids.len());

        let mut summary = FetchSummary::default();
        for match_id in &match_ids {
            match self.fetcher.download(match_id).await {
                Ok(Download::Saved) => summary.saved += 1,
                Ok(Download::AlreadyPresent) => summary.skipped += 1,
                Ok(Download::NotFound) => {
                    warn!("Match {match_id} not found");
                    summary.failed += 1;
                }
                Err(e) => {
                    error!("Failed to download match {match_id}: {e:?}");
                    summary.failed += 1;
                }
            }
        }
        info!(
            "Saved {} matches, {} already present, {} failed",
            summary.saved, summary.skipped, summary.failed
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn riot_id_splits_on_last_hash() {
        let Player::RiotId {
            game_name,
            tag_line,
        } = Player::from_riot_id("Faker#KR1").unwrap()
        else {
            panic!("expected a Riot ID");
        };
        assert_eq!(game_name, "Faker");
        assert_eq!(tag_line, "KR1");

        assert!(Player::from_riot_id("NoTag").is_err());
        assert!(Player::from_riot_id("#NA1").is_err());
        assert!(Player::from_riot_id("Name#").is_err());
    }
}
