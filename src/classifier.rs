//! Threshold rules turning a zone reading into hazard categories.
//!
//! Which hazards a zone can report, and how its signals are combined, is
//! configuration: deployments have used both "any signal" and "all signals"
//! for earthquakes, and one pinned a zone to always report. All three are
//! expressible through [`HazardRule`].

use serde::{Deserialize, Serialize};

use crate::disaster::Disaster;
use crate::reading::Metrics;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarthquakeThresholds {
    pub seismicity: f64,
    pub gas_concentration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloodThresholds {
    pub total_rain: f64,
    pub max_rain_intensity: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub earthquake: EarthquakeThresholds,
    pub flood: FloodThresholds,
}

impl Thresholds {
    pub fn fields(&self) -> [(&'static str, f64); 5] {
        [
            ("earthquake.seismicity", self.earthquake.seismicity),
            ("earthquake.gas_concentration", self.earthquake.gas_concentration),
            ("flood.total_rain", self.flood.total_rain),
            ("flood.max_rain_intensity", self.flood.max_rain_intensity),
            ("flood.humidity", self.flood.humidity),
        ]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    /// At least one signal at or above its threshold.
    #[default]
    Any,
    /// Every signal at or above its threshold.
    All,
    /// Report regardless of the signals.
    Always,
}

impl Combinator {
    fn evaluate(self, signals: &[bool]) -> bool {
        match self {
            Combinator::Any => signals.iter().any(|&hit| hit),
            Combinator::All => signals.iter().all(|&hit| hit),
            Combinator::Always => true,
        }
    }
}

/// A hazard entry switches the hazard on unless it says `enabled: false`;
/// an omitted entry leaves it off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardRule {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub combinator: Combinator,
}

fn default_enabled() -> bool {
    true
}

impl HazardRule {
    pub fn any() -> Self {
        Self {
            enabled: true,
            combinator: Combinator::Any,
        }
    }

    pub fn all() -> Self {
        Self {
            enabled: true,
            combinator: Combinator::All,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }
}

/// Hazard eligibility of one zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZonePolicy {
    #[serde(default)]
    pub earthquake: HazardRule,
    #[serde(default)]
    pub flood: HazardRule,
}

/// Returns the triggered hazards in canonical order (earthquake before flood).
pub fn classify(metrics: &Metrics, policy: &ZonePolicy, thresholds: &Thresholds) -> Vec<Disaster> {
    let mut disasters = Vec::with_capacity(2);

    if policy.earthquake.enabled {
        let limits = &thresholds.earthquake;
        let signals = [
            metrics.seismicity >= limits.seismicity,
            metrics.gas_concentration >= limits.gas_concentration,
        ];
        if policy.earthquake.combinator.evaluate(&signals) {
            disasters.push(Disaster::Earthquake);
        }
    }

    if policy.flood.enabled {
        let limits = &thresholds.flood;
        let signals = [
            metrics.total_rain >= limits.total_rain,
            metrics.max_rain_intensity >= limits.max_rain_intensity,
            metrics.humidity >= limits.humidity,
        ];
        if policy.flood.combinator.evaluate(&signals) {
            disasters.push(Disaster::Flood);
        }
    }

    disasters
}
