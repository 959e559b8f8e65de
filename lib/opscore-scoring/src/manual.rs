//! Hand-tuned heuristic score, blended with the model score.

use opscore_features::{Lane, MinuteFeatureRow, Phase, SupportRole};

/// Heuristic score for one row in the given phase.
///
/// Rows with an unscored lane get the common terms only when called
/// directly; the scoring engine never calls this for them.
pub fn manual_score(row: &MinuteFeatureRow, phase: Phase) -> f64 {
    common_terms(row) + lane_terms(row, phase)
}

fn common_terms(row: &MinuteFeatureRow) -> f64 {
    let minutes = row.minute_safe();
    0.5 * row.kills_per_min + 0.25 * (row.assists_accum as f64 / minutes)
        - 0.5 * (row.deaths_accum as f64 / minutes)
        + 0.015 * row.dpm
        + 0.5 * ((row.ward_place_accum + row.ward_kill_accum) as f64 / minutes)
}

fn lane_terms(row: &MinuteFeatureRow, phase: Phase) -> f64 {
    let minutes = row.minute_safe();
    match (row.lane, phase) {
        (Lane::Top, Phase::Early) => {
            0.5 * (row.solo_kills_accum as f64 / minutes) + 0.05 * row.turret_plates_taken as f64
        }
        (Lane::Top, Phase::Late) if row.split_push_time > 0.0 => 0.5,
        (Lane::Top, Phase::End) => 0.015 * row.turret_dpm,

        (Lane::Mid, Phase::Early) => {
            0.5 * (row.roam_ka_accum as f64 / minutes) + 0.05 * row.turret_plates_taken as f64
        }
        (Lane::Mid, Phase::Late) => row.kill_participation,
        (Lane::Mid, Phase::End) => 0.002 * row.dpm,

        (Lane::Jungle, Phase::Early) => 0.5 * (row.gank_ka_accum as f64 / minutes),
        (Lane::Jungle, Phase::Late) => row.kill_participation,
        (Lane::Jungle, Phase::End) => row.obj_takes_accum as f64 / minutes,

        (Lane::Adc, Phase::Early) => 0.5 * row.cspm,
        (Lane::Adc, Phase::End) => 0.1 * (row.team_damage_percent * 100.0),

        (Lane::Support, Phase::Early) => 0.5 * (row.roam_ka_accum as f64 / minutes),
        (Lane::Support, Phase::End) => match row.support_role {
            SupportRole::Enchanter => 0.01 * row.heal_per_min,
            SupportRole::Tank => 2.0 * row.cc_per_min,
            SupportRole::Assassin => 2.0 * row.kills_per_min,
            SupportRole::Damage => 0.015 * row.dpm,
        },

        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn support(role: SupportRole) -> MinuteFeatureRow {
        MinuteFeatureRow {
            lane: Lane::Support,
            support_role: role,
            minute: 30,
            duration_min: 30,
            ..Default::default()
        }
    }

    #[test]
    fn tank_support_end_cc_term() {
        let row = MinuteFeatureRow {
            cc_per_min: 3.0,
            ..support(SupportRole::Tank)
        };
        assert_eq!(lane_terms(&row, Phase::End), 6.0);
        assert_eq!(manual_score(&row, Phase::End), 6.0);

        // Other roles ignore cc
        let row = MinuteFeatureRow {
            cc_per_min: 3.0,
            ..support(SupportRole::Enchanter)
        };
        assert_eq!(lane_terms(&row, Phase::End), 0.0);
    }

    #[test]
    fn common_terms_use_minute_safe() {
        let row = MinuteFeatureRow {
            lane: Lane::Adc,
            minute: 0,
            assists_accum: 4,
            deaths_accum: 2,
            ward_place_accum: 1,
            ward_kill_accum: 1,
            kills_per_min: 2.0,
            dpm: 100.0,
            ..Default::default()
        };
        // 1.0 + 1.0 - 1.0 + 1.5 + 1.0
        assert!((common_terms(&row) - 3.5).abs() < 1e-12);
    }

    #[test]
    fn top_split_push_bonus_is_flat() {
        let row = MinuteFeatureRow {
            lane: Lane::Top,
            minute: 20,
            split_push_time: 0.25,
            ..Default::default()
        };
        assert_eq!(lane_terms(&row, Phase::Late), 0.5);
        let row = MinuteFeatureRow {
            split_push_time: 0.0,
            ..row
        };
        assert_eq!(lane_terms(&row, Phase::Late), 0.0);
    }

    #[test]
    fn lane_phase_additions() {
        let row = MinuteFeatureRow {
            minute: 10,
            solo_kills_accum: 2,
            roam_ka_accum: 4,
            gank_ka_accum: 6,
            turret_plates_taken: 2,
            obj_takes_accum: 3,
            kill_participation: 0.6,
            cspm: 7.0,
            team_damage_percent: 0.3,
            dpm: 500.0,
            turret_dpm: 200.0,
            ..Default::default()
        };
        let with = |lane| MinuteFeatureRow {
            lane,
            ..row.clone()
        };
        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;

        assert!(close(lane_terms(&with(Lane::Top), Phase::Early), 0.1 + 0.1));
        assert!(close(lane_terms(&with(Lane::Top), Phase::End), 3.0));
        assert!(close(lane_terms(&with(Lane::Mid), Phase::Early), 0.2 + 0.1));
        assert!(close(lane_terms(&with(Lane::Mid), Phase::Late), 0.6));
        assert!(close(lane_terms(&with(Lane::Mid), Phase::End), 1.0));
        assert!(close(lane_terms(&with(Lane::Jungle), Phase::Early), 0.3));
        assert!(close(lane_terms(&with(Lane::Jungle), Phase::Late), 0.6));
        assert!(close(lane_terms(&with(Lane::Jungle), Phase::End), 0.3));
        assert!(close(lane_terms(&with(Lane::Adc), Phase::Early), 3.5));
        assert!(close(lane_terms(&with(Lane::Adc), Phase::Late), 0.0));
        assert!(close(lane_terms(&with(Lane::Adc), Phase::End), 3.0));
        assert!(close(lane_terms(&with(Lane::Support), Phase::Early), 0.2));
        assert!(close(lane_terms(&with(Lane::Support), Phase::Late), 0.0));
        assert!(close(lane_terms(&with(Lane::Unknown), Phase::Early), 0.0));
    }
}
