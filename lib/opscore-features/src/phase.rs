use crate::row::MinuteFeatureRow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::lane::UnknownVariant;

/// Minutes before this are always the early game.
pub const EARLY_PHASE_END: i64 = 15;

/// Coarse game phase of a single minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Early,
    Late,
    End,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Early, Phase::Late, Phase::End];

    /// Label a minute of a match lasting `duration_min` whole minutes.
    ///
    /// Early wins over end for matches shorter than [`EARLY_PHASE_END`], and
    /// minutes past the end (which well-formed data never produces) count as
    /// end.
    pub fn of(minute: i64, duration_min: i64) -> Phase {
        if minute < EARLY_PHASE_END {
            Phase::Early
        } else if minute < duration_min {
            Phase::Late
        } else {
            Phase::End
        }
    }

    pub fn of_row(row: &MinuteFeatureRow) -> Phase {
        Phase::of(row.minute, row.duration_min)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Early => "early",
            Phase::Late => "late",
            Phase::End => "end",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "early" => Ok(Phase::Early),
            "late" => Ok(Phase::Late),
            "end" => Ok(Phase::End),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}
