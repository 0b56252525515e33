use std::{
    collections::{BTreeSet, HashMap},
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    classifier::{HazardRule, Thresholds, ZonePolicy},
    engine::{Engine, EngineBuilder, EngineSettings},
    error::ZoneError,
    generator::Variation,
    reading::ZoneProfile,
    sync::Synchronizer,
    systems::{AggregateSystem, GenerationSystem, SyncSystem},
    world::{Dashboard, DistrictRecord},
    zones::{DistrictId, PartitionError, ZoneEntry, ZoneId, ZoneTable},
};

fn default_tick_interval_ms() -> u64 {
    5_000
}

fn default_simulate() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default)]
    pub ticks: Option<u64>,
    /// Generate local readings for zones no external feed drives.
    #[serde(default = "default_simulate")]
    pub simulate: bool,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub thresholds: Thresholds,
    #[serde(default)]
    pub variation: Variation,
    pub zones: Vec<ScenarioZone>,
    pub districts: Vec<DistrictRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioZone {
    pub id: ZoneId,
    pub name: String,
    pub districts: Vec<DistrictId>,
    pub baseline: ZoneProfile,
    #[serde(default)]
    pub earthquake: HazardRule,
    #[serde(default)]
    pub flood: HazardRule,
}

impl ScenarioZone {
    pub fn policy(&self) -> ZonePolicy {
        ZonePolicy {
            earthquake: self.earthquake,
            flood: self.flood,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("scenario must define at least one zone")]
    NoZones,

    #[error("district {0} defined more than once")]
    DuplicateDistrict(DistrictId),

    #[error("zone '{zone}' lists district {district}, which the district source does not provide")]
    MissingDistrict { zone: ZoneId, district: DistrictId },

    #[error("{name} must be a finite, non-negative number (got {value})")]
    InvalidNumber { name: String, value: f64 },

    #[error("zone '{zone}' baseline {field} is not finite")]
    InvalidBaseline { zone: ZoneId, field: &'static str },

    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error(transparent)]
    Zone(#[from] ZoneError),
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(text).context("Failed to parse scenario")?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Checks the zone partition against the district source and the numeric
    /// configuration.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.zones.is_empty() {
            return Err(ScenarioError::NoZones);
        }

        for (name, value) in self.thresholds.fields() {
            check_number(name, value)?;
        }
        for (name, value) in self.variation.fields() {
            check_number(&format!("variation.{name}"), value)?;
        }
        for zone in &self.zones {
            if let Some((field, _)) = zone
                .baseline
                .fields()
                .into_iter()
                .find(|(_, value)| !value.is_finite())
            {
                return Err(ScenarioError::InvalidBaseline {
                    zone: zone.id.clone(),
                    field,
                });
            }
        }

        let mut known = BTreeSet::new();
        for district in &self.districts {
            if !known.insert(district.id) {
                return Err(ScenarioError::DuplicateDistrict(district.id));
            }
        }

        let table = self.zone_table()?;
        for zone in &self.zones {
            if let Some(missing) = zone.districts.iter().find(|id| !known.contains(id)) {
                return Err(ScenarioError::MissingDistrict {
                    zone: zone.id.clone(),
                    district: *missing,
                });
            }
        }
        for district in &self.districts {
            table.zone_of(district.id)?;
        }
        Ok(())
    }

    pub fn zone_table(&self) -> Result<ZoneTable, PartitionError> {
        ZoneTable::new(
            self.zones
                .iter()
                .map(|zone| ZoneEntry {
                    id: zone.id.clone(),
                    name: zone.name.clone(),
                    districts: zone.districts.clone(),
                })
                .collect(),
        )
    }

    pub fn synchronizer(&self) -> Result<Synchronizer, ScenarioError> {
        let table = self.zone_table()?;
        let policies: HashMap<ZoneId, ZonePolicy> = self
            .zones
            .iter()
            .map(|zone| (zone.id.clone(), zone.policy()))
            .collect();
        Ok(Synchronizer::new(table, policies, self.thresholds))
    }

    /// Engine with the standard pipeline: generation, sync, aggregate.
    pub fn build_engine(&self, seed: Option<u64>) -> Result<Engine, ScenarioError> {
        let seed = seed.unwrap_or(self.seed);
        let settings = EngineSettings {
            scenario_name: self.name.clone(),
            seed,
        };
        Ok(EngineBuilder::new(settings, self.synchronizer()?)
            .with_system(GenerationSystem::new(
                self.profiles(),
                self.variation,
                self.simulate,
                seed,
            ))
            .with_system(SyncSystem::new())
            .with_system(AggregateSystem::new())
            .build())
    }

    pub fn build_dashboard(&self, synchronizer: &Synchronizer) -> Result<Dashboard, ScenarioError> {
        Ok(Dashboard::from_records(&self.districts, synchronizer.table())?)
    }

    /// Baselines in zone configuration order.
    pub fn profiles(&self) -> Vec<(ZoneId, ZoneProfile)> {
        self.zones
            .iter()
            .map(|zone| (zone.id.clone(), zone.baseline))
            .collect()
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or(12)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

fn check_number(name: &str, value: f64) -> Result<(), ScenarioError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ScenarioError::InvalidNumber {
            name: name.to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Combinator;

    const SMALL: &str = r#"
name: two_zones
seed: 3
thresholds:
  earthquake: { seismicity: 0.4, gas_concentration: 90 }
  flood: { total_rain: 45, max_rain_intensity: 15, humidity: 60 }
zones:
  - id: Zone 2
    name: Zone 2
    districts: [2, 1]
    earthquake: { enabled: true, combinator: all }
    baseline:
      temperature: 22
      humidity: 60
      average_wind_speed: 5
      max_wind_speed: 8
      max_rain_intensity: 8
      total_rain: 35
      seismicity: 0.6
      gas_concentration: 100
  - id: Zone 4
    name: Zone 4
    districts: [3]
    flood: { enabled: true }
    baseline:
      temperature: 21
      humidity: 70
      average_wind_speed: 4
      max_wind_speed: 7
      max_rain_intensity: 20
      total_rain: 60
      seismicity: 0.5
      gas_concentration: 100
districts:
  - { id: 1, name: "Lyon 1er Arrondissement" }
  - { id: 2, name: "Lyon 2e Arrondissement" }
  - { id: 3, name: "Lyon 3e Arrondissement" }
"#;

    #[test]
    fn parses_defaults_and_policies() {
        let scenario = Scenario::from_yaml(SMALL).unwrap();
        assert_eq!(scenario.tick_interval_ms, 5_000);
        assert!(scenario.simulate);
        assert_eq!(scenario.logging.level, "info");
        assert_eq!(scenario.variation, Variation::default());
        assert_eq!(scenario.ticks(None), 12);
        assert_eq!(scenario.ticks(Some(3)), 3);

        let zone2 = &scenario.zones[0];
        assert_eq!(zone2.earthquake.combinator, Combinator::All);
        assert!(!zone2.flood.enabled);
        assert_eq!(scenario.zones[1].flood.combinator, Combinator::Any);
    }

    #[test]
    fn builds_dashboard_from_district_source() {
        let scenario = Scenario::from_yaml(SMALL).unwrap();
        let sync = scenario.synchronizer().unwrap();
        let dashboard = scenario.build_dashboard(&sync).unwrap();
        assert_eq!(dashboard.districts().len(), 3);
        assert_eq!(
            dashboard.district(DistrictId(1)).unwrap().zone,
            ZoneId::from("Zone 2")
        );
    }

    #[test]
    fn orphan_district_fails_validation() {
        let text = SMALL.replace("districts: [3]", "districts: [4]");
        let mut scenario: Scenario = serde_yaml::from_str(&text).unwrap();
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::MissingDistrict { .. })
        ));

        scenario.districts.push(DistrictRecord {
            id: DistrictId(4),
            name: "Lyon 4e Arrondissement".into(),
        });
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::Zone(ZoneError::UnknownDistrict(DistrictId(3))))
        ));
    }

    #[test]
    fn negative_threshold_fails_validation() {
        let text = SMALL.replace("total_rain: 45", "total_rain: -1");
        let scenario: Scenario = serde_yaml::from_str(&text).unwrap();
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn overlapping_zones_fail_validation() {
        let text = SMALL.replace("districts: [3]", "districts: [3, 1]");
        let scenario: Scenario = serde_yaml::from_str(&text).unwrap();
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::Partition(PartitionError::SharedDistrict { .. }))
        ));
    }
}
