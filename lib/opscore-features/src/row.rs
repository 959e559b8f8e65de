use crate::lane::{Lane, SupportRole};
use crate::metrics::minute_safe;
use serde::{Deserialize, Serialize};

/// One player's state at one minute of one match.
///
/// Rows are produced once by the aggregation pass and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MinuteFeatureRow {
    pub match_id: String,
    pub minute: i64,
    pub participant_id: i32,
    pub puuid: String,
    pub team_id: i32,
    pub champion: String,
    pub lane: Lane,
    pub support_role: SupportRole,
    pub duration_min: i64,
    pub win: bool,
    /// Gold earned over the whole match; what the predictors are fit against.
    pub target_gold: i64,

    // Instantaneous, from the participant frame
    pub cs: i64,
    pub jungle_cs: i64,
    pub xp: i64,
    pub level: i64,
    pub total_gold: i64,
    pub current_gold: i64,

    // Change since the previous frame
    pub kills_minute: i64,
    pub deaths_minute: i64,
    pub assists_minute: i64,

    // Cumulative since the start of the match
    pub kills_accum: i64,
    pub deaths_accum: i64,
    pub assists_accum: i64,
    pub dmg_champ_accum: f64,
    pub dmg_taken_accum: f64,
    pub heal_accum: f64,
    pub cc_time_accum: f64,
    pub ward_place_accum: i64,
    pub ward_kill_accum: i64,
    pub roam_ka_accum: i64,
    pub gank_ka_accum: i64,
    pub obj_takes_accum: i64,
    pub team_kills: i64,

    // End-of-game counters, repeated on every minute
    pub turret_plates_taken: i64,
    pub turret_takedowns_accum: i64,
    pub solo_kills_accum: i64,
    pub split_push_time: f64,
    pub total_time_dead: i64,
    pub team_damage_percent: f64,
    pub turret_damage_total: f64,

    // Derived
    pub dpm: f64,
    pub cspm: f64,
    pub turret_dpm: f64,
    pub heal_per_min: f64,
    pub cc_per_min: f64,
    pub kills_per_min: f64,
    pub kill_participation: f64,
    pub dmg_taken_per_death: f64,
    pub dmg_dealt_per_death: f64,
    pub dmg_taken_per_kill: f64,
}

impl MinuteFeatureRow {
    pub fn minute_safe(&self) -> f64 {
        minute_safe(self.minute)
    }
}

macro_rules! feature_columns {
    ($($name:ident),* $(,)?) => {
        /// Numeric columns a predictor may be fed, by name.
        ///
        /// Identifiers, the training target and raw gold are not columns.
        pub const FEATURE_COLUMNS: &[&str] = &[$(stringify!($name)),*];

        impl MinuteFeatureRow {
            /// Look up a numeric column by name.
            pub fn feature(&self, name: &str) -> Option<f64> {
                match name {
                    $(stringify!($name) => Some(self.$name as f64),)*
                    _ => None,
                }
            }
        }
    };
}

feature_columns!(
    cs,
    jungle_cs,
    xp,
    level,
    kills_minute,
    deaths_minute,
    assists_minute,
    kills_accum,
    deaths_accum,
    assists_accum,
    dmg_champ_accum,
    dmg_taken_accum,
    heal_accum,
    cc_time_accum,
    ward_place_accum,
    ward_kill_accum,
    roam_ka_accum,
    gank_ka_accum,
    obj_takes_accum,
    team_kills,
    turret_plates_taken,
    turret_takedowns_accum,
    solo_kills_accum,
    split_push_time,
    total_time_dead,
    team_damage_percent,
    turret_damage_total,
    dpm,
    cspm,
    turret_dpm,
    heal_per_min,
    cc_per_min,
    kills_per_min,
    kill_participation,
    dmg_taken_per_death,
    dmg_dealt_per_death,
    dmg_taken_per_kill,
);

pub fn is_feature_column(name: &str) -> bool {
    FEATURE_COLUMNS.contains(&name)
}
