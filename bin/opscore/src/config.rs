use riven::consts::RegionalRoute;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs::read_to_string;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Americas,
    Asia,
    Europe,
    Sea,
}

impl Region {
    pub fn route(&self) -> RegionalRoute {
        match self {
            Region::Americas => RegionalRoute::AMERICAS,
            Region::Asia => RegionalRoute::ASIA,
            Region::Europe => RegionalRoute::EUROPE,
            Region::Sea => RegionalRoute::SEA,
        }
    }
}

impl FromStr for Region {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "americas" => Ok(Region::Americas),
            "asia" => Ok(Region::Asia),
            "europe" => Ok(Region::Europe),
            "sea" => Ok(Region::Sea),
            other => anyhow::bail!("unknown region {other:?}"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_url: String,
    pub rgapi_key: String,
    pub region: Region,
    pub match_dir: PathBuf,
    pub timeline_dir: PathBuf,
    pub model_dir: PathBuf,
    /// Replaces the feature registry built into the binary.
    pub registry_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://opscore.db?mode=rwc".to_string(),
            rgapi_key: String::new(),
            region: Region::default(),
            match_dir: PathBuf::from("raw/match_data"),
            timeline_dir: PathBuf::from("raw/timeline_data"),
            model_dir: PathBuf::from("models"),
            registry_path: None,
        }
    }
}

impl Config {
    pub async fn load(path: Option<impl AsRef<Path>>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_file(path).await?,
            None => Default::default(),
        };

        config.database_url = std::env::var("DATABASE_URL")
            .ok()
            .unwrap_or(config.database_url);
        config.rgapi_key = std::env::var("RGAPI_KEY").ok().unwrap_or(config.rgapi_key);
        if let Ok(region) = std::env::var("RIOT_REGION") {
            config.region = region.parse()?;
        }
        config.match_dir = std::env::var("MATCH_DIR")
            .map(PathBuf::from)
            .ok()
            .unwrap_or(config.match_dir);
        config.timeline_dir = std::env::var("TIMELINE_DIR")
            .map(PathBuf::from)
            .ok()
            .unwrap_or(config.timeline_dir);
        config.model_dir = std::env::var("MODEL_DIR")
            .map(PathBuf::from)
            .ok()
            .unwrap_or(config.model_dir);

        Ok(config)
    }

    async fn load_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = read_to_string(path).await?;
        Ok(toml::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            database_url = "sqlite::memory:"
            region = "europe"
            model_dir = "out/models"
            "#,
        )
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.region, Region::Europe);
        assert_eq!(config.model_dir, PathBuf::from("out/models"));
        assert_eq!(config.match_dir, PathBuf::from("raw/match_data"));
        assert_eq!(config.registry_path, None);
    }

    #[test]
    fn region_names() {
        assert_eq!("SEA".parse::<Region>().unwrap(), Region::Sea);
        assert_eq!(Region::Asia.route(), RegionalRoute::ASIA);
        assert!("mars".parse::<Region>().is_err());
    }
}
