use crate::error::RegistryError;
use crate::lane::{Lane, SupportRole};
use crate::phase::Phase;
use crate::row::is_feature_column;
use crate::segment::SegmentKey;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const DEFAULT_REGISTRY_TOML: &str = include_str!("../registry.toml");

lazy_static::lazy_static! {
    static ref DEFAULT_REGISTRY: FeatureRegistry = FeatureRegistry::from_toml_str(DEFAULT_REGISTRY_TOML)
        .expect("Embedded registry should be valid");
}

#[derive(Debug, Deserialize)]
struct RegistryDocument {
    version: u32,
    support_roles: HashMap<SupportRole, Vec<String>>,
    support_end: HashMap<SupportRole, String>,
    lanes: HashMap<Lane, LaneFeatures>,
}

#[derive(Debug, Deserialize, Default)]
struct LaneFeatures {
    base: Vec<String>,
    #[serde(default)]
    early: Vec<String>,
    #[serde(default)]
    late: Vec<String>,
    #[serde(default)]
    end: Vec<String>,
}

impl LaneFeatures {
    fn phase(&self, phase: Phase) -> &[String] {
        match phase {
            Phase::Early => &self.early,
            Phase::Late => &self.late,
            Phase::End => &self.end,
        }
    }
}

/// Which features each segment's predictor is fed, in which order, plus the
/// support champion table.
///
/// Training and scoring must both resolve allow-lists through the same
/// instance; see [`FeatureRegistry::global`].
#[derive(Debug)]
pub struct FeatureRegistry {
    version: u32,
    champion_roles: HashMap<String, SupportRole>,
    support_end: HashMap<SupportRole, String>,
    lanes: HashMap<Lane, LaneFeatures>,
}

impl FeatureRegistry {
    /// The registry compiled into this crate, parsed on first use.
    pub fn global() -> &'static FeatureRegistry {
        &DEFAULT_REGISTRY
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, RegistryError> {
        let document: RegistryDocument = toml::from_str(contents)?;

        for lane in Lane::SCORED {
            let features = document
                .lanes
                .get(&lane)
                .ok_or_else(|| RegistryError::MissingSection(format!("lanes.{lane}")))?;
            check_features(&format!("lanes.{lane}.base"), &features.base)?;
            for phase in Phase::ALL {
                check_features(&format!("lanes.{lane}.{phase}"), features.phase(phase))?;
            }
        }
        for role in SupportRole::ALL {
            let feature = document
                .support_end
                .get(&role)
                .ok_or_else(|| RegistryError::MissingSection(format!("support_end.{role}")))?;
            check_features(&format!("support_end.{role}"), std::slice::from_ref(feature))?;
        }

        let mut champion_roles = HashMap::new();
        for (role, champions) in &document.support_roles {
            for champion in champions {
                if let Some(first) = champion_roles.insert(champion.to_lowercase(), *role) {
                    if first != *role {
                        return Err(RegistryError::DuplicateChampion {
                            champion: champion.clone(),
                            first: first.to_string(),
                            second: role.to_string(),
                        });
                    }
                }
            }
        }

        Ok(Self {
            version: document.version,
            champion_roles,
            support_end: document.support_end,
            lanes: document.lanes,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Support play style of a champion, by Riot's `championName`. Unlisted
    /// champions are [`SupportRole::Damage`].
    pub fn support_role(&self, champion_name: &str) -> SupportRole {
        self.champion_roles
            .get(&champion_name.to_lowercase())
            .copied()
            .unwrap_or_default()
    }

    /// The ordered allow-list for a segment.
    ///
    /// End-phase supports get the single feature for their role. Everything
    /// else gets the lane's base list followed by its phase list, without
    /// repeats.
    pub fn features_for(&self, key: &SegmentKey) -> Vec<&str> {
        if key.lane == Lane::Support && key.phase == Phase::End {
            let role = key.role.unwrap_or_default();
            return self
                .support_end
                .get(&role)
                .map(|feature| vec![feature.as_str()])
                .unwrap_or_default();
        }

        let Some(lane) = self.lanes.get(&key.lane) else {
            return Vec::new();
        };
        let mut features: Vec<&str> = Vec::new();
        for feature in lane.base.iter().chain(lane.phase(key.phase)) {
            if is_feature_column(feature) && !features.contains(&feature.as_str()) {
                features.push(feature);
            }
        }
        features
    }
}

fn check_features(section: &str, features: &[String]) -> Result<(), RegistryError> {
    match features.iter().find(|feature| !is_feature_column(feature)) {
        Some(feature) => Err(RegistryError::UnknownFeature {
            section: section.to_string(),
            feature: feature.clone(),
        }),
        None => Ok(()),
    }
}
