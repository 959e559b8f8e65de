use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use config::Config;
use handler::extract::ExtractHandler;
use handler::fetch::{FetchHandler, Player};
use handler::score::ScoreHandler;
use handler::train::TrainHandler;
use opscore_db::{DbHandler, SqlitePoolOptions};
use opscore_features::FeatureRegistry;
use opscore_scoring::ArtifactDir;
use riot_api::MatchFetcher;
use riven::RiotApi;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod handler;
mod riot_api;

/// Per-minute player features and OPScores from League of Legends matches.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file. Environment variables override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download recent match and timeline documents of a player.
    Fetch(FetchArgs),
    /// Aggregate the raw documents into the minute-feature table.
    Extract,
    /// Train one predictor per segment from the minute-feature table.
    Train,
    /// Score the minute-feature table.
    Score,
    /// Extract, train and score.
    Run,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Extract,
    Train,
    Score,
}

#[derive(Debug, Args)]
struct FetchArgs {
    /// Riot ID as NAME#TAG.
    #[arg(long, conflicts_with = "puuid")]
    riot_id: Option<String>,

    #[arg(long)]
    puuid: Option<String>,

    /// How many recent matches to fetch.
    #[arg(long, default_value_t = 20)]
    count: i32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; everything can come from the config file
    let _ = dotenvy::dotenv();
    setup_tracing_subscriber();

    let cli = Cli::parse();

    info!("Loading configuration");
    let config = Config::load(cli.config.as_ref()).await?;

    let stages: &[Stage] = match cli.command {
        Command::Fetch(args) => return fetch(&config, args).await,
        Command::Extract => &[Stage::Extract],
        Command::Train => &[Stage::Train],
        Command::Score => &[Stage::Score],
        Command::Run => &[Stage::Extract, Stage::Train, Stage::Score],
    };

    let custom_registry = match &config.registry_path {
        Some(path) => Some(
            FeatureRegistry::from_path(path)
                .with_context(|| format!("Failed to load registry {}", path.display()))?,
        ),
        None => None,
    };
    let registry = custom_registry
        .as_ref()
        .unwrap_or_else(|| FeatureRegistry::global());
    info!("Using feature registry version {}", registry.version());

    info!("Setting up DB client");
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    let db_handler = DbHandler::new(pool);
    db_handler
        .migrate()
        .await
        .context("Failed to migrate database")?;

    let artifacts = ArtifactDir::new(config.model_dir.clone());
    for stage in stages {
        match stage {
            Stage::Extract => {
                let summary = ExtractHandler::new(
                    &db_handler,
                    registry,
                    config.match_dir.clone(),
                    config.timeline_dir.clone(),
                )
                .run()
                .await?;
                info!(
                    "Extracted {} matches ({} failed) into {} rows",
                    summary.matches, summary.failed, summary.rows
                );
            }
            Stage::Train => {
                TrainHandler::new(&db_handler, registry, artifacts.clone())
                    .run()
                    .await?;
            }
            Stage::Score => {
                ScoreHandler::new(&db_handler, registry, artifacts.clone())
                    .run()
                    .await?;
            }
        }
    }

    Ok(())
}

async fn fetch(config: &Config, args: FetchArgs) -> anyhow::Result<()> {
    let player = match (args.riot_id, args.puuid) {
        (Some(riot_id), _) => Player::from_riot_id(&riot_id)?,
        (None, Some(puuid)) => Player::Puuid(puuid),
        (None, None) => anyhow::bail!("Either --riot-id or --puuid is required"),
    };
    if config.rgapi_key.is_empty() {
        anyhow::bail!("RGAPI_KEY is not set");
    }

    info!("Setting up Riot API client");
    let riot_api = RiotApi::new(config.rgapi_key.as_str());
    let fetcher = MatchFetcher::new(
        riot_api,
        config.region.route(),
        config.match_dir.clone(),
        config.timeline_dir.clone(),
    );
    FetchHandler::new(fetcher).run(player, args.count).await?;
    Ok(())
}

fn setup_tracing_subscriber() {
    let layer = fmt::layer()
        .pretty()
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_thread_names(true)
        .with_thread_ids(false)
        .with_target(false);
    tracing_subscriber::registry()
        .with(layer)
        .with(EnvFilter::from_default_env())
        .init();
}
