use std::fs;
use std::path::Path;

use opscore_features::telemetry::{
    discover_match_files, document_file_name, MATCH_FILE_PREFIX, TIMELINE_FILE_PREFIX,
};
use opscore_features::{aggregate_batch, FeatureRegistry, Lane, TelemetryError, TelemetrySource};
use serde_json::{json, Value};

fn match_json(match_id: &str) -> Value {
    let participants: Vec<Value> = (1..=10)
        .map(|id| {
            json!({
                "participantId": id,
                "puuid": format!("p{id}"),
                "teamId": if id <= 5 { 100 } else { 200 },
                "championName": "Ahri",
                "teamPosition": if id == 1 { "" } else { "MIDDLE" },
                "individualPosition": if id == 1 { "JUNGLE" } else { "MIDDLE" },
                "goldEarned": 12000,
                "totalTimeSpentDead": null,
                "damageDealtToTurrets": 4200,
                "win": id > 5,
                "challenges": { "turretPlatesTaken": 3, "soloKills": 2 }
            })
        })
        .collect();
    json!({
        "metadata": { "matchId": match_id },
        "info": { "gameDuration": 1265, "participants": participants }
    })
}

fn timeline_json(match_id: &str) -> Value {
    let frames: Vec<Value> = (0..=21)
        .map(|minute| {
            let participant_frames: serde_json::Map<String, Value> = (1..=10)
                .map(|id| {
                    (
                        id.to_string(),
                        json!({
                            "participantId": id,
                            "minionsKilled": minute * 7,
                            "totalGold": 500 + minute * 350,
                            "damageStats": { "totalDamageDoneToChampions": minute * 150 }
                        }),
                    )
                })
                .collect();
            json!({
                "timestamp": minute * 60_000,
                "events": [{ "type": "PAUSE_END" }],
                "participantFrames": participant_frames
            })
        })
        .collect();
    json!({
        "metadata": { "matchId": match_id },
        "info": { "frames": frames }
    })
}

fn write(dir: &Path, prefix: &str, match_id: &str, value: &Value) {
    fs::write(
        dir.join(document_file_name(prefix, match_id)),
        serde_json::to_string(value).unwrap(),
    )
    .unwrap();
}

#[test]
fn pairs_documents_by_match_id() {
    let match_dir = tempfile::tempdir().unwrap();
    let timeline_dir = tempfile::tempdir().unwrap();

    write(match_dir.path(), MATCH_FILE_PREFIX, "NA1_1", &match_json("NA1_1"));
    write(timeline_dir.path(), TIMELINE_FILE_PREFIX, "NA1_1", &timeline_json("NA1_1"));
    write(match_dir.path(), MATCH_FILE_PREFIX, "NA1_2", &match_json("NA1_2"));
    write(timeline_dir.path(), TIMELINE_FILE_PREFIX, "NA1_3", &timeline_json("NA1_3"));
    fs::write(match_dir.path().join("notes.txt"), "ignored").unwrap();

    let (pairs, unpaired) = discover_match_files(match_dir.path(), timeline_dir.path()).unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].match_id(), "NA1_1");
    assert_eq!(unpaired, vec!["NA1_2".to_string(), "NA1_3".to_string()]);

    let telemetry = pairs[0].load().unwrap();
    assert_eq!(telemetry.duration_min(), 21);
    assert_eq!(telemetry.participants.len(), 10);
    assert_eq!(telemetry.frames.len(), 22);
}

#[test]
fn loaded_documents_aggregate() {
    let match_dir = tempfile::tempdir().unwrap();
    let timeline_dir = tempfile::tempdir().unwrap();
    write(match_dir.path(), MATCH_FILE_PREFIX, "NA1_1", &match_json("NA1_1"));
    write(timeline_dir.path(), TIMELINE_FILE_PREFIX, "NA1_1", &timeline_json("NA1_1"));
    // Truncated document
    fs::write(
        match_dir.path().join(document_file_name(MATCH_FILE_PREFIX, "NA1_9")),
        "{\"metadata\":",
    )
    .unwrap();
    write(timeline_dir.path(), TIMELINE_FILE_PREFIX, "NA1_9", &timeline_json("NA1_9"));

    let (pairs, _) = discover_match_files(match_dir.path(), timeline_dir.path()).unwrap();
    let batch = aggregate_batch(&pairs, FeatureRegistry::global());

    assert_eq!(batch.succeeded, vec!["NA1_1".to_string()]);
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.rows.len(), 22 * 10);

    let jungler = batch
        .rows
        .iter()
        .find(|row| row.participant_id == 1 && row.minute == 20)
        .unwrap();
    assert_eq!(jungler.lane, Lane::Jungle);
    assert_eq!(jungler.total_time_dead, 0);
    assert_eq!(jungler.solo_kills_accum, 2);
    assert_eq!(jungler.dpm, 150.0);
    assert_eq!(jungler.turret_dpm, 210.0);
}

#[test]
fn missing_directory_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = discover_match_files(&dir.path().join("nope"), dir.path()).unwrap_err();
    assert!(matches!(err, TelemetryError::Io { .. }));
}
