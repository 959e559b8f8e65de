use std::path::PathBuf;
use thiserror::Error;

/// Failure to load one match's raw documents.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("match {0} has no participants")]
    MissingRoster(String),
    #[error("match {0} has no timeline frames")]
    MissingFrames(String),
    #[error("timeline {timeline_id} does not belong to match {match_id}")]
    MismatchedTimeline {
        match_id: String,
        timeline_id: String,
    },
}

/// Failure that aborts the aggregation of a single match.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("participant {0} is outside the 1..=10 roster range")]
    InvalidParticipant(i32),
    #[error("participant {participant_id} has unknown team {team_id}")]
    InvalidTeam { participant_id: i32, team_id: i32 },
    #[error("roster is empty")]
    EmptyRoster,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Parse(#[from] toml::de::Error),
    #[error("failed to read registry {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unknown feature {feature} in {section}")]
    UnknownFeature { section: String, feature: String },
    #[error("missing section: {0}")]
    MissingSection(String),
    #[error("champion {champion} is listed under both {first} and {second}")]
    DuplicateChampion {
        champion: String,
        first: String,
        second: String,
    },
}
