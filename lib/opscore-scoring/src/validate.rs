use opscore_features::ValidationReport;

use crate::engine::ScoredRow;

/// Below this spread of `op_score` the predictors are probably not telling
/// rows apart.
pub const MIN_OP_SCORE_RANGE: f64 = 0.1;

pub fn validate_scored_rows(rows: &[ScoredRow]) -> ValidationReport {
    let mut report = ValidationReport::default();
    if rows.is_empty() {
        report.warn("table is empty");
        return report;
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for scored in rows {
        if !scored.op_score.is_finite() {
            report.error(format!(
                "op_score is {} for match {} participant {} minute {}",
                scored.op_score, scored.row.match_id, scored.row.participant_id, scored.row.minute
            ));
            continue;
        }
        min = min.min(scored.op_score);
        max = max.max(scored.op_score);
    }

    if min.is_finite() && max - min < MIN_OP_SCORE_RANGE {
        report.warn(format!(
            "op_score range {:.4} is below {MIN_OP_SCORE_RANGE}",
            max - min
        ));
    }
    report
}
