use std::collections::BTreeMap;
use std::fmt;

use tracing::{error, warn};

use crate::lane::Lane;
use crate::phase::Phase;
use crate::row::{MinuteFeatureRow, FEATURE_COLUMNS};

/// Findings from checking a table. Errors mean the table should not be used;
/// warnings are logged and otherwise ignored.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Emit every finding through `tracing`.
    pub fn log(&self, table: &str) {
        for message in &self.errors {
            error!("{table}: {message}");
        }
        for message in &self.warnings {
            warn!("{table}: {message}");
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error(s), {} warning(s)",
            self.errors.len(),
            self.warnings.len()
        )
    }
}

/// Check the minute-feature table.
pub fn validate_minute_rows(rows: &[MinuteFeatureRow]) -> ValidationReport {
    let mut report = ValidationReport::default();
    if rows.is_empty() {
        report.warn("table is empty");
        return report;
    }

    let mut unknown_lane = 0usize;
    let mut players: BTreeMap<(&str, i32), PlayerTrack> = BTreeMap::new();
    for row in rows {
        for column in FEATURE_COLUMNS {
            if let Some(value) = row.feature(column) {
                if !value.is_finite() {
                    report.error(format!(
                        "{column} is {value} for match {} participant {} minute {}",
                        row.match_id, row.participant_id, row.minute
                    ));
                }
            }
        }
        if row.lane == Lane::Unknown {
            unknown_lane += 1;
        }

        let track = players
            .entry((row.match_id.as_str(), row.participant_id))
            .or_default();
        if track.last_minute.is_some_and(|last| row.minute <= last) {
            track.out_of_order += 1;
        }
        track.last_minute = Some(row.minute);
        if Phase::of_row(row) == Phase::End {
            track.end_rows += 1;
        }
    }

    if unknown_lane > 0 {
        report.warn(format!("{unknown_lane} row(s) have an UNKNOWN lane"));
    }
    for ((match_id, participant_id), track) in players {
        if track.end_rows != 1 {
            report.warn(format!(
                "match {match_id} participant {participant_id} has {} end-phase row(s)",
                track.end_rows
            ));
        }
        if track.out_of_order > 0 {
            report.warn(format!(
                "match {match_id} participant {participant_id} has {} minute(s) out of order",
                track.out_of_order
            ));
        }
    }
    report
}

#[derive(Debug, Default)]
struct PlayerTrack {
    last_minute: Option<i64>,
    end_rows: usize,
    out_of_order: usize,
}
