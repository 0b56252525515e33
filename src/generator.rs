use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::reading::{round_tenth, Metrics, ZoneProfile, ZoneReading};
use crate::zones::ZoneId;

fn default_temperature_span() -> f64 {
    8.0
}

fn default_humidity_span() -> f64 {
    25.0
}

fn default_average_wind_span() -> f64 {
    5.0
}

fn default_max_wind_span() -> f64 {
    8.0
}

fn default_rain_intensity_span() -> f64 {
    15.0
}

fn default_total_rain_span() -> f64 {
    30.0
}

fn default_seismicity_span() -> f64 {
    0.8
}

fn default_gas_span() -> f64 {
    60.0
}

/// Full width of the symmetric perturbation applied to each metric: a span
/// of 8 moves the baseline by at most ±4.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    #[serde(default = "default_temperature_span")]
    pub temperature: f64,
    #[serde(default = "default_humidity_span")]
    pub humidity: f64,
    #[serde(default = "default_average_wind_span")]
    pub average_wind_speed: f64,
    #[serde(default = "default_max_wind_span")]
    pub max_wind_speed: f64,
    #[serde(default = "default_rain_intensity_span")]
    pub max_rain_intensity: f64,
    #[serde(default = "default_total_rain_span")]
    pub total_rain: f64,
    #[serde(default = "default_seismicity_span")]
    pub seismicity: f64,
    #[serde(default = "default_gas_span")]
    pub gas_concentration: f64,
}

impl Default for Variation {
    fn default() -> Self {
        Self {
            temperature: default_temperature_span(),
            humidity: default_humidity_span(),
            average_wind_speed: default_average_wind_span(),
            max_wind_speed: default_max_wind_span(),
            max_rain_intensity: default_rain_intensity_span(),
            total_rain: default_total_rain_span(),
            seismicity: default_seismicity_span(),
            gas_concentration: default_gas_span(),
        }
    }
}

impl Variation {
    pub fn fields(&self) -> [(&'static str, f64); 8] {
        [
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("average_wind_speed", self.average_wind_speed),
            ("max_wind_speed", self.max_wind_speed),
            ("max_rain_intensity", self.max_rain_intensity),
            ("total_rain", self.total_rain),
            ("seismicity", self.seismicity),
            ("gas_concentration", self.gas_concentration),
        ]
    }
}

fn perturb<R: Rng + ?Sized>(rng: &mut R, base: f64, span: f64) -> f64 {
    let offset = (rng.gen::<f64>() - 0.5) * span;
    round_tenth(base + offset)
}

/// Produces one synthetic reading around `profile`. Seismicity is not
/// clamped, so a wide span can push it outside [0, 1].
pub fn generate<R: Rng + ?Sized>(
    zone: &ZoneId,
    profile: &ZoneProfile,
    variation: &Variation,
    date: DateTime<Utc>,
    rng: &mut R,
) -> ZoneReading {
    let metrics = Metrics {
        temperature: perturb(rng, profile.temperature, variation.temperature),
        humidity: perturb(rng, profile.humidity, variation.humidity),
        average_wind_speed: perturb(rng, profile.average_wind_speed, variation.average_wind_speed),
        max_wind_speed: perturb(rng, profile.max_wind_speed, variation.max_wind_speed),
        max_rain_intensity: perturb(rng, profile.max_rain_intensity, variation.max_rain_intensity),
        total_rain: perturb(rng, profile.total_rain, variation.total_rain),
        seismicity: perturb(rng, profile.seismicity, variation.seismicity),
        gas_concentration: perturb(rng, profile.gas_concentration, variation.gas_concentration),
    };
    ZoneReading {
        date,
        zone: zone.clone(),
        metrics,
        disaster: Vec::new(),
    }
}
