use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Normalized lane a player occupied for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Lane {
    Top,
    Jungle,
    Mid,
    Adc,
    Support,
    #[default]
    Unknown,
}

impl Lane {
    /// Lanes that own a feature allow-list and predictor artifacts.
    pub const SCORED: [Lane; 5] = [Lane::Top, Lane::Jungle, Lane::Mid, Lane::Adc, Lane::Support];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lane::Top => "TOP",
            Lane::Jungle => "JUNGLE",
            Lane::Mid => "MID",
            Lane::Adc => "ADC",
            Lane::Support => "SUPPORT",
            Lane::Unknown => "UNKNOWN",
        }
    }

    /// Resolve the lane from Riot's `teamPosition`, falling back to the
    /// `individualPosition` hint when the team position is missing or bogus.
    ///
    /// Riot reports both bottom-lane players as `BOTTOM` often enough that
    /// `BOTTOM` is always treated as the ADC.
    pub fn classify(team_position: &str, individual_position: Option<&str>) -> Lane {
        let hint = individual_position
            .map(str::trim)
            .unwrap_or_default()
            .to_uppercase();

        match team_position.trim().to_uppercase().as_str() {
            "TOP" => return Lane::Top,
            "MIDDLE" | "MID" => return Lane::Mid,
            "JUNGLE" => return Lane::Jungle,
            "INVALID" => {
                return match hint.as_str() {
                    "JUNGLE" => Lane::Jungle,
                    _ => Lane::Unknown,
                }
            }
            "BOTTOM" => return Lane::Adc,
            "SUPPORT" | "UTILITY" => return Lane::Support,
            _ => {}
        }

        match hint.as_str() {
            "JUNGLE" => Lane::Jungle,
            "SUPPORT" | "UTILITY" => Lane::Support,
            "BOTTOM" => Lane::Adc,
            _ => Lane::Unknown,
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lane {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TOP" => Ok(Lane::Top),
            "JUNGLE" => Ok(Lane::Jungle),
            "MID" => Ok(Lane::Mid),
            "ADC" => Ok(Lane::Adc),
            "SUPPORT" => Ok(Lane::Support),
            "UNKNOWN" => Ok(Lane::Unknown),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Play style of a support champion. Only meaningful for [`Lane::Support`],
/// but every row carries one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum SupportRole {
    Enchanter,
    Tank,
    Assassin,
    #[default]
    Damage,
}

impl SupportRole {
    pub const ALL: [SupportRole; 4] = [
        SupportRole::Enchanter,
        SupportRole::Tank,
        SupportRole::Assassin,
        SupportRole::Damage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SupportRole::Enchanter => "Enchanter",
            SupportRole::Tank => "Tank",
            SupportRole::Assassin => "Assassin",
            SupportRole::Damage => "Damage",
        }
    }
}

impl fmt::Display for SupportRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupportRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SupportRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized value: {0}")]
pub struct UnknownVariant(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn riot_positions_are_normalized() {
        assert_eq!(Lane::classify("TOP", None), Lane::Top);
        assert_eq!(Lane::classify("MIDDLE", None), Lane::Mid);
        assert_eq!(Lane::classify("JUNGLE", None), Lane::Jungle);
        assert_eq!(Lane::classify("BOTTOM", None), Lane::Adc);
        assert_eq!(Lane::classify("UTILITY", None), Lane::Support);
        assert_eq!(Lane::classify("SUPPORT", None), Lane::Support);
    }

    #[test]
    fn bottom_ignores_support_hint() {
        assert_eq!(Lane::classify("BOTTOM", Some("UTILITY")), Lane::Adc);
    }

    #[test]
    fn invalid_position_only_trusts_jungle_hint() {
        assert_eq!(Lane::classify("INVALID", Some("JUNGLE")), Lane::Jungle);
        assert_eq!(Lane::classify("INVALID", Some("UTILITY")), Lane::Unknown);
        assert_eq!(Lane::classify("INVALID", None), Lane::Unknown);
    }

    #[test]
    fn empty_position_falls_back_to_hint() {
        assert_eq!(Lane::classify("", Some("JUNGLE")), Lane::Jungle);
        assert_eq!(Lane::classify("", Some("UTILITY")), Lane::Support);
        assert_eq!(Lane::classify("NONE", Some("BOTTOM")), Lane::Adc);
        assert_eq!(Lane::classify("", Some("TOP")), Lane::Unknown);
        assert_eq!(Lane::classify("", None), Lane::Unknown);
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(Lane::classify("middle", None), Lane::Mid);
        assert_eq!(Lane::classify("", Some("jungle")), Lane::Jungle);
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for lane in Lane::SCORED.into_iter().chain([Lane::Unknown]) {
            assert_eq!(lane.to_string().parse::<Lane>(), Ok(lane));
        }
        for role in SupportRole::ALL {
            assert_eq!(role.to_string().parse::<SupportRole>(), Ok(role));
        }
        assert!("MIDDLE".parse::<Lane>().is_err());
    }
}
