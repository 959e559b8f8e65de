use opscore_features::{Lane, MinuteFeatureRow, Phase, SupportRole};
use opscore_scoring::ScoredRow;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::query_builder::Separated;
use sqlx::Sqlite;

use crate::error::Error;

macro_rules! minute_feature_record {
    ($($field:ident: $ty:ty),* $(,)?) => {
        /// A `minute_features` row. Lane, role and phase are stored by name.
        #[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
        pub struct MinuteFeatureRecord {
            $(pub $field: $ty,)*
        }

        impl MinuteFeatureRecord {
            pub const COLUMNS: &'static [&'static str] = &[$(stringify!($field)),*];

            pub(crate) fn push_binds<'args>(self, values: &mut Separated<'_, 'args, Sqlite, &'static str>) {
                $(values.push_bind(self.$field);)*
            }
        }

        impl From<&MinuteFeatureRow> for MinuteFeatureRecord {
            fn from(row: &MinuteFeatureRow) -> Self {
                Self {
                    $($field: minute_feature_record!(@to row.$field, $field),)*
                }
            }
        }

        impl TryFrom<MinuteFeatureRecord> for MinuteFeatureRow {
            type Error = Error;

            fn try_from(record: MinuteFeatureRecord) -> Result<Self, Self::Error> {
                Ok(Self {
                    $($field: minute_feature_record!(@from record.$field, $field),)*
                })
            }
        }
    };

    (@to $value:expr, lane) => { $value.to_string() };
    (@to $value:expr, support_role) => { $value.to_string() };
    (@to $value:expr, $field:ident) => { $value.clone() };

    (@from $value:expr, lane) => { parse::<Lane>("lane", $value)? };
    (@from $value:expr, support_role) => { parse::<SupportRole>("support_role", $value)? };
    (@from $value:expr, $field:ident) => { $value };
}

minute_feature_record!(
    match_id: String,
    minute: i64,
    participant_id: i32,
    puuid: String,
    team_id: i32,
    champion: String,
    lane: String,
    support_role: String,
    duration_min: i64,
    win: bool,
    target_gold: i64,
    cs: i64,
    jungle_cs: i64,
    xp: i64,
    level: i64,
    total_gold: i64,
    current_gold: i64,
    kills_minute: i64,
    deaths_minute: i64,
    assists_minute: i64,
    kills_accum: i64,
    deaths_accum: i64,
    assists_accum: i64,
    dmg_champ_accum: f64,
    dmg_taken_accum: f64,
    heal_accum: f64,
    cc_time_accum: f64,
    ward_place_accum: i64,
    ward_kill_accum: i64,
    roam_ka_accum: i64,
    gank_ka_accum: i64,
    obj_takes_accum: i64,
    team_kills: i64,
    turret_plates_taken: i64,
    turret_takedowns_accum: i64,
    solo_kills_accum: i64,
    split_push_time: f64,
    total_time_dead: i64,
    team_damage_percent: f64,
    turret_damage_total: f64,
    dpm: f64,
    cspm: f64,
    turret_dpm: f64,
    heal_per_min: f64,
    cc_per_min: f64,
    kills_per_min: f64,
    kill_participation: f64,
    dmg_taken_per_death: f64,
    dmg_dealt_per_death: f64,
    dmg_taken_per_kill: f64,
);

fn parse<T: std::str::FromStr>(column: &'static str, value: String) -> Result<T, Error> {
    value
        .parse()
        .map_err(|_| Error::InvalidColumn { column, value })
}

/// A `scored_rows` row joined with its minute features.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ScoredRecord {
    #[sqlx(flatten)]
    pub features: MinuteFeatureRecord,
    pub phase: String,
    pub model_score: f64,
    pub manual_score: f64,
    pub op_score: f64,
    pub final_score_norm: f64,
}

impl TryFrom<ScoredRecord> for ScoredRow {
    type Error = Error;

    fn try_from(record: ScoredRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            row: record.features.try_into()?,
            phase: parse::<Phase>("phase", record.phase)?,
            model_score: record.model_score,
            manual_score: record.manual_score,
            op_score: record.op_score,
            final_score_norm: record.final_score_norm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trips_domain_row() {
        let row = MinuteFeatureRow {
            match_id: "NA1_1".into(),
            minute: 12,
            participant_id: 5,
            lane: Lane::Support,
            support_role: SupportRole::Enchanter,
            heal_per_min: 42.5,
            win: true,
            ..Default::default()
        };
        let record = MinuteFeatureRecord::from(&row);
        assert_eq!(record.lane, "SUPPORT");
        assert_eq!(record.support_role, "Enchanter");
        assert_eq!(MinuteFeatureRow::try_from(record).unwrap(), row);
    }

    #[test]
    fn unknown_lane_name_is_rejected() {
        let mut record = MinuteFeatureRecord::from(&MinuteFeatureRow::default());
        record.lane = "BOT".into();
        assert!(matches!(
            MinuteFeatureRow::try_from(record),
            Err(Error::InvalidColumn { column: "lane", .. })
        ));
    }

    #[test]
    fn columns_follow_struct_order() {
        assert_eq!(MinuteFeatureRecord::COLUMNS.len(), 50);
        assert_eq!(MinuteFeatureRecord::COLUMNS[0], "match_id");
        assert_eq!(MinuteFeatureRecord::COLUMNS[49], "dmg_taken_per_kill");
    }
}
