//! Minute aggregation: one chronological pass over a match's frames, emitting a
//! [`MinuteFeatureRow`] per player per frame.

use rayon::prelude::*;
use tracing::{debug, error, info};

use crate::error::MatchError;
use crate::lane::{Lane, SupportRole};
use crate::metrics::{per_minute, safe_divide};
use crate::registry::FeatureRegistry;
use crate::row::MinuteFeatureRow;
use crate::telemetry::{Event, Frame, MatchTelemetry, ParticipantFrame, TelemetrySource};

const ROSTER_SIZE: usize = 10;
const MS_PER_MINUTE: i64 = 60_000;
const TEAMS: [i32; 2] = [100, 200];

/// Running counters for one player. Never decrease within a match.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerAccumulator {
    pub kills: i64,
    pub deaths: i64,
    pub assists: i64,
    pub dmg_champ: f64,
    pub dmg_taken: f64,
    pub heal: f64,
    pub cc_time: f64,
    pub ward_place: i64,
    pub ward_kill: i64,
    pub roam_ka: i64,
    pub gank_ka: i64,
    pub obj_takes: i64,
}

/// KDA as of the previous frame, for per-minute deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KdaSnapshot {
    pub kills: i64,
    pub deaths: i64,
    pub assists: i64,
}

/// All mutable state of one match's aggregation. Created fresh per match and
/// threaded through [`process_frame`]; it never outlives the match.
#[derive(Debug, Clone, Default)]
pub struct MatchArena {
    players: [PlayerAccumulator; ROSTER_SIZE],
    previous: [KdaSnapshot; ROSTER_SIZE],
    team_kills: [i64; TEAMS.len()],
}

impl MatchArena {
    #[cfg(test)]
    fn player(&self, participant_id: i32) -> Option<&PlayerAccumulator> {
        slot(participant_id).map(|idx| &self.players[idx])
    }

    fn team_kills(&self, team_id: i32) -> i64 {
        team_slot(team_id).map_or(0, |idx| self.team_kills[idx])
    }

    fn player_mut(&mut self, participant_id: Option<i32>) -> Option<&mut PlayerAccumulator> {
        participant_id
            .and_then(slot)
            .map(|idx| &mut self.players[idx])
    }
}

fn slot(participant_id: i32) -> Option<usize> {
    usize::try_from(participant_id)
        .ok()
        .filter(|id| (1..=ROSTER_SIZE).contains(id))
        .map(|id| id - 1)
}

fn team_slot(team_id: i32) -> Option<usize> {
    TEAMS.iter().position(|team| *team == team_id)
}

/// Static per-player information from the match document.
#[derive(Debug, Clone, Default)]
pub struct RosterEntry {
    pub participant_id: i32,
    pub puuid: String,
    pub team_id: i32,
    pub champion: String,
    pub lane: Lane,
    pub support_role: SupportRole,
    pub win: bool,
    pub gold_earned: i64,
    pub turret_plates_taken: i64,
    pub split_push_time: f64,
    pub total_time_dead: i64,
    pub team_damage_percent: f64,
    pub turret_takedowns: i64,
    pub solo_kills: i64,
    pub turret_damage_total: f64,
}

/// The match's players, indexed by participant ID.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: [Option<RosterEntry>; ROSTER_SIZE],
}

impl Roster {
    pub fn build(telemetry: &MatchTelemetry, registry: &FeatureRegistry) -> Result<Self, MatchError> {
        let mut roster = Roster::default();
        for participant in &telemetry.participants {
            let Some(participant_id) = participant.participant_id else {
                continue;
            };
            let idx = slot(participant_id).ok_or(MatchError::InvalidParticipant(participant_id))?;
            if team_slot(participant.team_id).is_none() {
                return Err(MatchError::InvalidTeam {
                    participant_id,
                    team_id: participant.team_id,
                });
            }

            let challenges = participant.challenges.clone().unwrap_or_default();
            roster.entries[idx] = Some(RosterEntry {
                participant_id,
                puuid: participant.puuid.clone(),
                team_id: participant.team_id,
                champion: participant.champion_name.clone(),
                lane: Lane::classify(
                    &participant.team_position,
                    participant.individual_position.as_deref(),
                ),
                support_role: registry.support_role(&participant.champion_name),
                win: participant.win,
                gold_earned: participant.gold_earned,
                turret_plates_taken: challenges.turret_plates_taken as i64,
                split_push_time: challenges.split_push_time,
                total_time_dead: participant.total_time_spent_dead,
                team_damage_percent: challenges.team_damage_percentage,
                turret_takedowns: participant.turret_takedowns,
                solo_kills: challenges.solo_kills as i64,
                turret_damage_total: participant.damage_dealt_to_turrets,
            });
        }

        if roster.entries.iter().all(Option::is_none) {
            return Err(MatchError::EmptyRoster);
        }
        Ok(roster)
    }

    pub fn get(&self, participant_id: i32) -> Option<&RosterEntry> {
        slot(participant_id).and_then(|idx| self.entries[idx].as_ref())
    }

    fn lane(&self, participant_id: i32) -> Option<Lane> {
        self.get(participant_id).map(|entry| entry.lane)
    }
}

/// Read-only context shared by every frame of one match.
#[derive(Debug)]
pub struct MatchContext<'a> {
    pub match_id: &'a str,
    pub duration_min: i64,
    pub roster: &'a Roster,
}

/// Aggregate a whole match. Frames are consumed in the order given.
pub fn aggregate_match(
    telemetry: &MatchTelemetry,
    registry: &FeatureRegistry,
) -> Result<Vec<MinuteFeatureRow>, MatchError> {
    let roster = Roster::build(telemetry, registry)?;
    let context = MatchContext {
        match_id: &telemetry.match_id,
        duration_min: telemetry.duration_min(),
        roster: &roster,
    };

    let mut rows = Vec::with_capacity(telemetry.frames.len() * ROSTER_SIZE);
    let mut arena = MatchArena::default();
    let frames = &telemetry.frames;
    for (idx, frame) in frames.iter().enumerate() {
        // The end-of-game frame usually shares its minute with the last
        // regular frame. Only the last frame of a minute produces rows.
        let closes_minute = frames
            .get(idx + 1)
            .map_or(true, |next| frame_minute(next) != frame_minute(frame));
        arena = process_frame(arena, frame, &context, closes_minute.then_some(&mut rows));
    }
    Ok(rows)
}

fn frame_minute(frame: &Frame) -> i64 {
    frame.timestamp.div_euclid(MS_PER_MINUTE)
}

/// Apply one frame: every event first, then one row per resolvable
/// participant when `rows` is given. Snapshots used for per-minute deltas
/// only advance when rows are emitted.
pub fn process_frame(
    mut arena: MatchArena,
    frame: &Frame,
    context: &MatchContext<'_>,
    rows: Option<&mut Vec<MinuteFeatureRow>>,
) -> MatchArena {
    for event in frame.events() {
        apply_event(&mut arena, event, context.roster);
    }

    let Some(rows) = rows else {
        return arena;
    };
    let minute = frame_minute(frame);
    for (participant_id, participant_frame) in frame.participants() {
        let Some(entry) = context.roster.get(participant_id) else {
            continue;
        };
        rows.push(emit_row(&mut arena, entry, participant_frame, minute, context));
    }
    arena
}

fn apply_event(arena: &mut MatchArena, event: &Event, roster: &Roster) {
    match event {
        Event::WardPlaced { creator_id } => {
            if let Some(player) = arena.player_mut(*creator_id) {
                player.ward_place += 1;
            }
        }
        Event::WardKill { killer_id } => {
            if let Some(player) = arena.player_mut(*killer_id) {
                player.ward_kill += 1;
            }
        }
        Event::ChampionKill {
            killer_id,
            victim_id,
            assisting_participant_ids,
        } => {
            let assists = assisting_participant_ids.as_deref().unwrap_or_default();

            if let Some(team) = killer_id
                .and_then(|id| roster.get(id))
                .and_then(|entry| team_slot(entry.team_id))
            {
                arena.team_kills[team] += 1;
            }
            if let Some(killer) = arena.player_mut(*killer_id) {
                killer.kills += 1;
            }
            if let Some(victim) = arena.player_mut(*victim_id) {
                victim.deaths += 1;
            }
            for assist in assists {
                if let Some(assister) = arena.player_mut(Some(*assist)) {
                    assister.assists += 1;
                }
            }

            for participant_id in killer_id.iter().chain(assists) {
                let lane = roster.lane(*participant_id);
                let Some(player) = arena.player_mut(Some(*participant_id)) else {
                    continue;
                };
                match lane {
                    Some(Lane::Mid | Lane::Support) => player.roam_ka += 1,
                    Some(Lane::Jungle) => player.gank_ka += 1,
                    _ => {}
                }
            }
        }
        Event::EliteMonsterKill {
            killer_id,
            assisting_participant_ids,
        } => {
            let assists = assisting_participant_ids.as_deref().unwrap_or_default();
            for participant_id in killer_id.iter().chain(assists) {
                if let Some(player) = arena.player_mut(Some(*participant_id)) {
                    player.obj_takes += 1;
                }
            }
        }
        Event::Other => {}
    }
}

fn emit_row(
    arena: &mut MatchArena,
    entry: &RosterEntry,
    frame: &ParticipantFrame,
    minute: i64,
    context: &MatchContext<'_>,
) -> MinuteFeatureRow {
    let idx = slot(entry.participant_id).unwrap_or_default();
    let team_kills = arena.team_kills(entry.team_id);
    let player = &mut arena.players[idx];

    // Damage, healing and CC come from the frame as running totals
    let damage = frame.damage_stats.clone().unwrap_or_default();
    player.dmg_champ = player.dmg_champ.max(damage.total_damage_done_to_champions);
    player.dmg_taken = player.dmg_taken.max(damage.total_damage_taken);
    player.heal = player.heal.max(damage.total_heal);
    player.cc_time = player.cc_time.max(frame.time_enemy_spent_controlled);
    let player = *player;

    let previous = arena.previous[idx];
    arena.previous[idx] = KdaSnapshot {
        kills: player.kills,
        deaths: player.deaths,
        assists: player.assists,
    };

    MinuteFeatureRow {
        match_id: context.match_id.to_string(),
        minute,
        participant_id: entry.participant_id,
        puuid: entry.puuid.clone(),
        team_id: entry.team_id,
        champion: entry.champion.clone(),
        lane: entry.lane,
        support_role: entry.support_role,
        duration_min: context.duration_min,
        win: entry.win,
        target_gold: entry.gold_earned,

        cs: frame.minions_killed,
        jungle_cs: frame.jungle_minions_killed,
        xp: frame.xp,
        level: frame.level,
        total_gold: frame.total_gold,
        current_gold: frame.current_gold,

        kills_minute: player.kills - previous.kills,
        deaths_minute: player.deaths - previous.deaths,
        assists_minute: player.assists - previous.assists,

        kills_accum: player.kills,
        deaths_accum: player.deaths,
        assists_accum: player.assists,
        dmg_champ_accum: player.dmg_champ,
        dmg_taken_accum: player.dmg_taken,
        heal_accum: player.heal,
        cc_time_accum: player.cc_time,
        ward_place_accum: player.ward_place,
        ward_kill_accum: player.ward_kill,
        roam_ka_accum: player.roam_ka,
        gank_ka_accum: player.gank_ka,
        obj_takes_accum: player.obj_takes,
        team_kills,

        turret_plates_taken: entry.turret_plates_taken,
        turret_takedowns_accum: entry.turret_takedowns,
        solo_kills_accum: entry.solo_kills,
        split_push_time: entry.split_push_time,
        total_time_dead: entry.total_time_dead,
        team_damage_percent: entry.team_damage_percent,
        turret_damage_total: entry.turret_damage_total,

        dpm: per_minute(player.dmg_champ, minute),
        cspm: per_minute(frame.minions_killed as f64, minute),
        turret_dpm: per_minute(entry.turret_damage_total, minute),
        heal_per_min: per_minute(player.heal, minute),
        cc_per_min: per_minute(player.cc_time, minute),
        kills_per_min: per_minute(player.kills as f64, minute),
        kill_participation: safe_divide(
            (player.kills + player.assists) as f64,
            team_kills.max(1) as f64,
        ),
        dmg_taken_per_death: safe_divide(player.dmg_taken, player.deaths as f64),
        dmg_dealt_per_death: safe_divide(player.dmg_champ, player.deaths as f64),
        dmg_taken_per_kill: safe_divide(player.dmg_taken, player.kills as f64),
    }
}

/// What became of one match in a batch.
#[derive(Debug)]
pub enum MatchOutcome {
    Success {
        match_id: String,
        rows: Vec<MinuteFeatureRow>,
    },
    Failure {
        match_id: String,
        reason: MatchError,
    },
}

/// Rows from every match that aggregated cleanly, and the reasons the others
/// did not.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub rows: Vec<MinuteFeatureRow>,
    pub succeeded: Vec<String>,
    pub failures: Vec<(String, MatchError)>,
}

/// Load and aggregate every source, one match per task. A failing match is
/// logged and dropped; the rest of the batch is unaffected.
pub fn aggregate_batch<S>(sources: &[S], registry: &FeatureRegistry) -> BatchResult
where
    S: TelemetrySource + Sync,
{
    let outcomes: Vec<MatchOutcome> = sources
        .par_iter()
        .map(|source| {
            let match_id = source.match_id().to_string();
            let result = source
                .load()
                .map_err(MatchError::from)
                .and_then(|telemetry| aggregate_match(&telemetry, registry));
            match result {
                Ok(rows) => MatchOutcome::Success { match_id, rows },
                Err(reason) => MatchOutcome::Failure { match_id, reason },
            }
        })
        .collect();

    let mut batch = BatchResult::default();
    for outcome in outcomes {
        match outcome {
            MatchOutcome::Success { match_id, rows } => {
                debug!("Aggregated {} rows for match {match_id}", rows.len());
                batch.rows.extend(rows);
                batch.succeeded.push(match_id);
            }
            MatchOutcome::Failure { match_id, reason } => {
                error!("Failed to aggregate match {match_id}: {reason}");
                batch.failures.push((match_id, reason));
            }
        }
    }
    info!(
        "Aggregated {} of {} matches into {} rows",
        batch.succeeded.len(),
        sources.len(),
        batch.rows.len()
    );
    batch
}
