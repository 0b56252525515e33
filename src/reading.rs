use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::disaster::Disaster;
use crate::error::ZoneError;
use crate::zones::ZoneId;

/// Environmental metrics shared by baseline profiles and readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub temperature: f64,
    pub humidity: f64,
    pub average_wind_speed: f64,
    pub max_wind_speed: f64,
    pub max_rain_intensity: f64,
    pub total_rain: f64,
    pub seismicity: f64,
    pub gas_concentration: f64,
}

/// Baseline a zone's simulated readings fluctuate around.
pub type ZoneProfile = Metrics;

impl Metrics {
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

/// One snapshot of a zone's metrics. The wire names follow the JSON records
/// the dashboard feed produces, where the zone is carried in `district`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneReading {
    pub date: DateTime<Utc>,
    #[serde(rename = "district", alias = "zone_id", alias = "zoneId")]
    pub zone: ZoneId,
    #[serde(flatten)]
    pub metrics: Metrics,
    #[serde(default, deserialize_with = "raw_disaster")]
    pub disaster: Vec<Disaster>,
}

impl ZoneReading {
    /// Boundary check run before a reading reaches the classifier.
    pub fn validate(&self) -> Result<(), ZoneError> {
        for (name, value) in self.metrics.fields() {
            if !value.is_finite() {
                return Err(ZoneError::malformed(
                    &self.zone,
                    format!("{name} is not a finite number"),
                ));
            }
        }
        Ok(())
    }
}

pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDisaster {
    Single(String),
    Many(Vec<String>),
}

/// Accepts `"none"`, a single category, or a list of categories, and returns
/// a sorted, deduplicated set.
fn raw_disaster<'de, D>(deserializer: D) -> Result<Vec<Disaster>, D::Error>
where
    D: Deserializer<'de>,
{
    let labels = match Option::<RawDisaster>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(RawDisaster::Single(label)) => vec![label],
        Some(RawDisaster::Many(labels)) => labels,
    };
    let mut categories = Vec::with_capacity(labels.len());
    for label in labels {
        match label.as_str() {
            "none" | "" => {}
            "earthquake" => categories.push(Disaster::Earthquake),
            "flood" => categories.push(Disaster::Flood),
            other => {
                return Err(serde::de::Error::custom(format!(
                    "unknown disaster category '{other}'"
                )))
            }
        }
    }
    categories.sort();
    categories.dedup();
    Ok(categories)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(disaster: &str) -> String {
        format!(
            r#"{{
                "date": "2025-03-14T09:00:00.000Z",
                "district": "Zone 3",
                "temperature": 23.4,
                "humidity": 74.1,
                "average_wind_speed": 6.2,
                "max_wind_speed": 9.9,
                "max_rain_intensity": 13.0,
                "total_rain": 50.5,
                "seismicity": 0.6,
                "gas_concentration": 118.3,
                "disaster": {disaster}
            }}"#
        )
    }

    #[test]
    fn decodes_single_list_and_none_shapes() {
        let none: ZoneReading = serde_json::from_str(&record("\"none\"")).unwrap();
        assert!(none.disaster.is_empty());
        assert_eq!(none.zone, ZoneId::from("Zone 3"));

        let single: ZoneReading = serde_json::from_str(&record("\"flood\"")).unwrap();
        assert_eq!(single.disaster, vec![Disaster::Flood]);

        let many: ZoneReading =
            serde_json::from_str(&record(r#"["flood", "earthquake", "flood"]"#)).unwrap();
        assert_eq!(many.disaster, vec![Disaster::Earthquake, Disaster::Flood]);
    }

    #[test]
    fn rejects_unknown_category() {
        let result = serde_json::from_str::<ZoneReading>(&record("\"tsunami\""));
        assert!(result.is_err());
    }

    #[test]
    fn validate_flags_non_finite_metrics() {
        let mut reading: ZoneReading = serde_json::from_str(&record("\"none\"")).unwrap();
        assert!(reading.validate().is_ok());
        reading.metrics.total_rain = f64::NAN;
        assert!(matches!(
            reading.validate(),
            Err(ZoneError::MalformedReading { .. })
        ));
    }

    #[test]
    fn rounds_to_one_decimal() {
        assert_eq!(round_tenth(12.345), 12.3);
        assert_eq!(round_tenth(-0.06), -0.1);
    }
}
