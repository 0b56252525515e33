//! External "latest reading per zone" snapshots.
//!
//! The remote store serves a JSON array of `{ "lastEntry": <reading>, "_id": .. }`
//! records. Records are decoded one by one so a bad record is reported against
//! its zone instead of as an anonymous JSON error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ZoneError;
use crate::reading::ZoneReading;
use crate::zones::ZoneId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedRecord {
    #[serde(rename = "lastEntry")]
    pub last_entry: ZoneReading,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("feed must be a JSON array of records")]
    NotAList,

    #[error(transparent)]
    Zone(#[from] ZoneError),
}

/// Decodes a snapshot into one reading per zone. When a zone appears more
/// than once the later record wins.
pub fn parse_snapshot(json: &str) -> Result<Vec<ZoneReading>, FeedError> {
    let Value::Array(records) = serde_json::from_str::<Value>(json)? else {
        return Err(FeedError::NotAList);
    };

    let mut readings: Vec<ZoneReading> = Vec::with_capacity(records.len());
    for record in records {
        let reading = decode_record(record)?;
        reading.validate()?;
        match readings.iter_mut().find(|known| known.zone == reading.zone) {
            Some(known) => *known = reading,
            None => readings.push(reading),
        }
    }
    Ok(readings)
}

fn decode_record(record: Value) -> Result<ZoneReading, ZoneError> {
    let zone = record
        .get("lastEntry")
        .and_then(|entry| entry.get("district"))
        .and_then(Value::as_str)
        .map(ZoneId::from)
        .unwrap_or_else(|| ZoneId::from("<unknown>"));
    serde_json::from_value::<FeedRecord>(record)
        .map(|record| record.last_entry)
        .map_err(|err| ZoneError::malformed(&zone, err.to_string()))
}

/// Renders readings in the same record shape the feed delivers.
pub fn to_records<'a>(readings: impl IntoIterator<Item = &'a ZoneReading>) -> Vec<FeedRecord> {
    readings
        .into_iter()
        .map(|reading| FeedRecord {
            last_entry: reading.clone(),
            id: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disaster::Disaster;

    const SNAPSHOT: &str = r#"[
        {
            "_id": "6650a1",
            "lastEntry": {
                "date": "2025-03-14T09:00:00.000Z",
                "district": "Zone 2",
                "temperature": 21.7, "humidity": 58.2,
                "average_wind_speed": 4.4, "max_wind_speed": 9.1,
                "max_rain_intensity": 7.5, "total_rain": 31.0,
                "seismicity": 0.7, "gas_concentration": 104.2,
                "disaster": "earthquake"
            }
        },
        {
            "_id": "6650a2",
            "lastEntry": {
                "date": "2025-03-14T09:00:00.000Z",
                "district": "Zone 4",
                "temperature": 20.9, "humidity": 71.0,
                "average_wind_speed": 3.2, "max_wind_speed": 6.0,
                "max_rain_intensity": 22.3, "total_rain": 64.8,
                "seismicity": 0.4, "gas_concentration": 98.0,
                "disaster": ["flood"]
            }
        }
    ]"#;

    #[test]
    fn parses_last_entry_records() {
        let readings = parse_snapshot(SNAPSHOT).unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].zone, ZoneId::from("Zone 2"));
        assert_eq!(readings[0].disaster, vec![Disaster::Earthquake]);
        assert_eq!(readings[1].metrics.total_rain, 64.8);
    }

    #[test]
    fn later_record_for_same_zone_wins() {
        let doubled = format!(
            "[{}, {}]",
            r#"{"lastEntry": {"date": "2025-03-14T09:00:00Z", "district": "Zone 3",
                "temperature": 1, "humidity": 1, "average_wind_speed": 1, "max_wind_speed": 1,
                "max_rain_intensity": 1, "total_rain": 1, "seismicity": 0.1,
                "gas_concentration": 1}}"#,
            r#"{"lastEntry": {"date": "2025-03-14T09:05:00Z", "district": "Zone 3",
                "temperature": 2, "humidity": 2, "average_wind_speed": 2, "max_wind_speed": 2,
                "max_rain_intensity": 2, "total_rain": 2, "seismicity": 0.2,
                "gas_concentration": 2}}"#
        );
        let readings = parse_snapshot(&doubled).unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].metrics.temperature, 2.0);
    }

    #[test]
    fn missing_field_is_reported_against_its_zone() {
        let broken = r#"[{"lastEntry": {"date": "2025-03-14T09:00:00Z", "district": "Zone 4",
            "temperature": 20.0}}]"#;
        match parse_snapshot(broken) {
            Err(FeedError::Zone(ZoneError::MalformedReading { zone, .. })) => {
                assert_eq!(zone, ZoneId::from("Zone 4"));
            }
            other => panic!("expected malformed reading, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_array_payloads() {
        assert!(matches!(parse_snapshot("{}"), Err(FeedError::NotAList)));
        assert!(matches!(parse_snapshot("not json"), Err(FeedError::Json(_))));
    }

    #[test]
    fn exported_records_parse_back() {
        let readings = parse_snapshot(SNAPSHOT).unwrap();
        let json = serde_json::to_string(&to_records(&readings)).unwrap();
        assert_eq!(parse_snapshot(&json).unwrap(), readings);
    }
}
