use crate::lane::{Lane, SupportRole};
use crate::phase::Phase;
use crate::row::MinuteFeatureRow;
use std::fmt;

/// Identifies one predictor artifact and one feature allow-list.
///
/// Supports are further split by [`SupportRole`]; every other lane ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentKey {
    pub lane: Lane,
    pub phase: Phase,
    pub role: Option<SupportRole>,
}

impl SegmentKey {
    /// Rows with an [`Lane::Unknown`] lane belong to no segment.
    pub fn new(lane: Lane, phase: Phase, role: SupportRole) -> Option<Self> {
        match lane {
            Lane::Unknown => None,
            Lane::Support => Some(Self {
                lane,
                phase,
                role: Some(role),
            }),
            _ => Some(Self {
                lane,
                phase,
                role: None,
            }),
        }
    }

    pub fn for_row(row: &MinuteFeatureRow) -> Option<Self> {
        Self::new(row.lane, Phase::of_row(row), row.support_role)
    }

    /// Every segment that can own an artifact.
    pub fn all() -> Vec<SegmentKey> {
        let mut keys = Vec::new();
        for phase in Phase::ALL {
            for lane in Lane::SCORED {
                if lane == Lane::Support {
                    keys.extend(
                        SupportRole::ALL
                            .into_iter()
                            .filter_map(|role| Self::new(lane, phase, role)),
                    );
                } else {
                    keys.extend(Self::new(lane, phase, SupportRole::default()));
                }
            }
        }
        keys
    }

    /// Artifact file name without its extension: `TOP_early`, `SUPPORT_Tank_end`.
    pub fn artifact_stem(&self) -> String {
        match self.role {
            Some(role) => format!("{}_{}_{}", self.lane, role, self.phase),
            None => format!("{}_{}", self.lane, self.phase),
        }
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.artifact_stem())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names() {
        let top = SegmentKey::new(Lane::Top, Phase::Early, SupportRole::Tank).unwrap();
        assert_eq!(top.artifact_stem(), "TOP_early");
        assert_eq!(top.role, None);

        let support = SegmentKey::new(Lane::Support, Phase::End, SupportRole::Tank).unwrap();
        assert_eq!(support.artifact_stem(), "SUPPORT_Tank_end");
    }

    #[test]
    fn unknown_lane_has_no_segment() {
        assert_eq!(SegmentKey::new(Lane::Unknown, Phase::Late, SupportRole::Damage), None);
    }

    #[test]
    fn twenty_four_segments() {
        let keys = SegmentKey::all();
        assert_eq!(keys.len(), 24);
        let mut stems: Vec<String> = keys.iter().map(SegmentKey::artifact_stem).collect();
        stems.sort();
        stems.dedup();
        assert_eq!(stems.len(), 24);
    }
}
