//! Match and timeline documents in the shape Riot's match-v5 API returns them.
//!
//! Only the fields the aggregation pass reads are modelled; everything else is
//! ignored, and missing numeric fields default to zero.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::TelemetryError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, deserialize_with = "nullable")]
    pub match_id: String,
}

/// `match_<id>.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchDocument {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub info: MatchInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    /// Seconds.
    #[serde(default, deserialize_with = "nullable")]
    pub game_duration: i64,
    #[serde(default)]
    pub participants: Option<Vec<Participant>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default)]
    pub participant_id: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub puuid: String,
    #[serde(default, deserialize_with = "nullable")]
    pub team_id: i32,
    #[serde(default, deserialize_with = "nullable")]
    pub champion_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub team_position: String,
    #[serde(default)]
    pub individual_position: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub gold_earned: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub total_time_spent_dead: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub turret_takedowns: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub damage_dealt_to_turrets: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub win: bool,
    #[serde(default)]
    pub challenges: Option<Challenges>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenges {
    #[serde(default, deserialize_with = "nullable")]
    pub turret_plates_taken: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub split_push_time: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub team_damage_percentage: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub solo_kills: f64,
}

/// `timeline_<id>.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineDocument {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub info: TimelineInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineInfo {
    #[serde(default)]
    pub frames: Option<Vec<Frame>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Milliseconds since the start of the match.
    #[serde(default, deserialize_with = "nullable")]
    pub timestamp: i64,
    #[serde(default)]
    pub events: Option<Vec<Event>>,
    /// Keyed by participant ID as a string (`"1"` through `"10"`).
    #[serde(default)]
    pub participant_frames: Option<BTreeMap<String, ParticipantFrame>>,
}

impl Frame {
    pub fn events(&self) -> &[Event] {
        self.events.as_deref().unwrap_or_default()
    }

    /// Participant frames paired with their resolved participant ID, in ID
    /// order. Frames whose ID cannot be determined are dropped.
    pub fn participants(&self) -> Vec<(i32, &ParticipantFrame)> {
        let mut participants: Vec<_> = self
            .participant_frames
            .iter()
            .flatten()
            .filter_map(|(key, frame)| {
                frame
                    .participant_id
                    .or_else(|| key.parse().ok())
                    .map(|id| (id, frame))
            })
            .collect();
        participants.sort_by_key(|(id, _)| *id);
        participants
    }
}

/// Timeline events. Anything not listed is read as [`Event::Other`] and has no
/// effect on aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "WARD_PLACED", rename_all = "camelCase")]
    WardPlaced {
        #[serde(default)]
        creator_id: Option<i32>,
    },
    #[serde(rename = "WARD_KILL", rename_all = "camelCase")]
    WardKill {
        #[serde(default)]
        killer_id: Option<i32>,
    },
    #[serde(rename = "CHAMPION_KILL", rename_all = "camelCase")]
    ChampionKill {
        #[serde(default)]
        killer_id: Option<i32>,
        #[serde(default)]
        victim_id: Option<i32>,
        #[serde(default)]
        assisting_participant_ids: Option<Vec<i32>>,
    },
    #[serde(rename = "ELITE_MONSTER_KILL", rename_all = "camelCase")]
    EliteMonsterKill {
        #[serde(default)]
        killer_id: Option<i32>,
        #[serde(default)]
        assisting_participant_ids: Option<Vec<i32>>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantFrame {
    #[serde(default)]
    pub participant_id: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub current_gold: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub total_gold: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub xp: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub level: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub minions_killed: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub jungle_minions_killed: i64,
    /// Seconds of crowd control applied to enemies so far.
    #[serde(default, deserialize_with = "nullable")]
    pub time_enemy_spent_controlled: f64,
    #[serde(default)]
    pub damage_stats: Option<DamageStats>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageStats {
    #[serde(default, deserialize_with = "nullable", alias = "totalDamageDealtToChampions")]
    pub total_damage_done_to_champions: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub total_damage_taken: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub total_heal: f64,
}

/// One match: its roster and its chronological frames. Immutable once built.
#[derive(Debug, Clone)]
pub struct MatchTelemetry {
    pub match_id: String,
    pub duration_secs: i64,
    pub participants: Vec<Participant>,
    pub frames: Vec<Frame>,
}

impl MatchTelemetry {
    /// Combine a match document with its timeline. A document without a roster
    /// or without frames is rejected.
    pub fn from_documents(
        match_doc: MatchDocument,
        timeline_doc: TimelineDocument,
    ) -> Result<Self, TelemetryError> {
        let match_id = match_doc.metadata.match_id;
        let timeline_id = timeline_doc.metadata.match_id;
        if !timeline_id.is_empty() && timeline_id != match_id {
            return Err(TelemetryError::MismatchedTimeline {
                match_id,
                timeline_id,
            });
        }
        let participants = match_doc
            .info
            .participants
            .ok_or_else(|| TelemetryError::MissingRoster(match_id.clone()))?;
        let frames = timeline_doc
            .info
            .frames
            .ok_or_else(|| TelemetryError::MissingFrames(match_id.clone()))?;

        Ok(Self {
            match_id,
            duration_secs: match_doc.info.game_duration,
            participants,
            frames,
        })
    }

    /// Whole minutes the match lasted.
    pub fn duration_min(&self) -> i64 {
        self.duration_secs.div_euclid(60)
    }
}

/// Anything the batch driver can turn into a [`MatchTelemetry`].
pub trait TelemetrySource {
    fn match_id(&self) -> &str;
    fn load(&self) -> Result<MatchTelemetry, TelemetryError>;
}

impl TelemetrySource for MatchTelemetry {
    fn match_id(&self) -> &str {
        &self.match_id
    }

    fn load(&self) -> Result<MatchTelemetry, TelemetryError> {
        Ok(self.clone())
    }
}

/// A `match_<id>.json` and `timeline_<id>.json` pair on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchFiles {
    pub match_id: String,
    pub match_path: PathBuf,
    pub timeline_path: PathBuf,
}

impl TelemetrySource for MatchFiles {
    fn match_id(&self) -> &str {
        &self.match_id
    }

    fn load(&self) -> Result<MatchTelemetry, TelemetryError> {
        let match_doc: MatchDocument = read_json(&self.match_path)?;
        let timeline_doc: TimelineDocument = read_json(&self.timeline_path)?;
        MatchTelemetry::from_documents(match_doc, timeline_doc)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, TelemetryError> {
    let contents = fs::read_to_string(path).map_err(|source| TelemetryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| TelemetryError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Treat an explicit `null` the same as a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub const MATCH_FILE_PREFIX: &str = "match_";
pub const TIMELINE_FILE_PREFIX: &str = "timeline_";

/// File name for a raw document of `match_id` with the given prefix.
pub fn document_file_name(prefix: &str, match_id: &str) -> String {
    format!("{prefix}{match_id}.json")
}

/// Pair up the match and timeline documents in two directories by match ID.
///
/// Returns the pairs (sorted by match ID) and the IDs that only had one of the
/// two documents.
pub fn discover_match_files(
    match_dir: &Path,
    timeline_dir: &Path,
) -> Result<(Vec<MatchFiles>, Vec<String>), TelemetryError> {
    let matches = list_documents(match_dir, MATCH_FILE_PREFIX)?;
    let mut timelines = list_documents(timeline_dir, TIMELINE_FILE_PREFIX)?;

    let mut pairs = Vec::new();
    let mut unpaired = Vec::new();
    for (match_id, match_path) in matches {
        match timelines.remove(&match_id) {
            Some(timeline_path) => pairs.push(MatchFiles {
                match_id,
                match_path,
                timeline_path,
            }),
            None => unpaired.push(match_id),
        }
    }
    unpaired.extend(timelines.into_keys());
    unpaired.sort();

    Ok((pairs, unpaired))
}

fn list_documents(dir: &Path, prefix: &str) -> Result<BTreeMap<String, PathBuf>, TelemetryError> {
    let entries = fs::read_dir(dir).map_err(|source| TelemetryError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut documents = BTreeMap::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let Some(match_id) = name
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(".json"))
        else {
            continue;
        };
        documents.insert(match_id.to_string(), path.clone());
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_parse_by_type() {
        let events: Vec<Event> = serde_json::from_value(json!([
            { "type": "WARD_PLACED", "creatorId": 3, "wardType": "YELLOW_TRINKET" },
            { "type": "WARD_KILL", "killerId": 7 },
            { "type": "CHAMPION_KILL", "killerId": 1, "victimId": 6, "assistingParticipantIds": [2, 3] },
            { "type": "ELITE_MONSTER_KILL", "killerId": 2, "monsterType": "DRAGON" },
            { "type": "ITEM_PURCHASED", "participantId": 4, "itemId": 1055 },
        ]))
        .unwrap();

        assert_eq!(events[0], Event::WardPlaced { creator_id: Some(3) });
        assert_eq!(events[1], Event::WardKill { killer_id: Some(7) });
        assert_eq!(
            events[2],
            Event::ChampionKill {
                killer_id: Some(1),
                victim_id: Some(6),
                assisting_participant_ids: Some(vec![2, 3]),
            }
        );
        assert_eq!(
            events[3],
            Event::EliteMonsterKill {
                killer_id: Some(2),
                assisting_participant_ids: None,
            }
        );
        assert_eq!(events[4], Event::Other);
    }

    #[test]
    fn null_actors_are_absent() {
        let event: Event = serde_json::from_value(json!({
            "type": "CHAMPION_KILL",
            "killerId": null,
            "victimId": 4,
            "assistingParticipantIds": null,
        }))
        .unwrap();
        assert_eq!(
            event,
            Event::ChampionKill {
                killer_id: None,
                victim_id: Some(4),
                assisting_participant_ids: None,
            }
        );
    }

    #[test]
    fn participant_frames_are_ordered_and_resolved_from_key() {
        let frame: Frame = serde_json::from_value(json!({
            "timestamp": 60000,
            "participantFrames": {
                "10": { "participantId": 10, "xp": 100 },
                "2": { "xp": 20 },
                "1": { "participantId": 1, "xp": 10 },
                "x": { "xp": 0 },
            }
        }))
        .unwrap();

        let ids: Vec<i32> = frame.participants().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2, 10]);
        assert!(frame.events().is_empty());
    }

    #[test]
    fn missing_roster_is_rejected() {
        let match_doc: MatchDocument = serde_json::from_value(json!({
            "metadata": { "matchId": "NA1_1" },
            "info": { "gameDuration": 1800 }
        }))
        .unwrap();
        let timeline_doc: TimelineDocument = serde_json::from_value(json!({
            "metadata": { "matchId": "NA1_1" },
            "info": { "frames": [] }
        }))
        .unwrap();

        let err = MatchTelemetry::from_documents(match_doc, timeline_doc).unwrap_err();
        assert!(matches!(err, TelemetryError::MissingRoster(id) if id == "NA1_1"));
    }

    #[test]
    fn timeline_must_belong_to_match() {
        let match_doc: MatchDocument = serde_json::from_value(json!({
            "metadata": { "matchId": "NA1_1" },
            "info": { "gameDuration": 1800, "participants": [] }
        }))
        .unwrap();
        let timeline_doc: TimelineDocument = serde_json::from_value(json!({
            "metadata": { "matchId": "NA1_2" },
            "info": { "frames": [] }
        }))
        .unwrap();

        let err = MatchTelemetry::from_documents(match_doc, timeline_doc).unwrap_err();
        assert!(matches!(err, TelemetryError::MismatchedTimeline { .. }));
    }

    #[test]
    fn duration_is_whole_minutes() {
        let telemetry = MatchTelemetry {
            match_id: "NA1_1".into(),
            duration_secs: 1925,
            participants: vec![],
            frames: vec![],
        };
        assert_eq!(telemetry.duration_min(), 32);
    }
}
