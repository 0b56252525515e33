use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::disaster::DisasterType;
use crate::error::ZoneError;
use crate::reading::ZoneReading;
use crate::summary::{summarize, Summary};
use crate::zones::{DistrictId, ZoneId, ZoneTable};

/// District identity as delivered by the geographic data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictRecord {
    pub id: DistrictId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    pub id: DistrictId,
    pub name: String,
    pub zone: ZoneId,
    #[serde(rename = "disaster")]
    pub disaster_type: DisasterType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingSource {
    Simulated,
    External,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingReading {
    pub reading: ZoneReading,
    pub source: ReadingSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedReading {
    pub zone: ZoneId,
    pub disaster_type: DisasterType,
    pub source: ReadingSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncFailure {
    pub zone: ZoneId,
    pub source: ReadingSource,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub scenario: String,
    pub tick: u64,
    pub updated_at: Option<DateTime<Utc>>,
    pub summary: Summary,
    pub districts: Vec<District>,
    pub readings: Vec<ZoneReading>,
    pub sources: BTreeMap<ZoneId, ReadingSource>,
}

/// Current state of the dashboard: the district collection plus the latest
/// reading per zone. Only the sync step writes districts and readings.
pub struct Dashboard {
    tick: u64,
    updated_at: Option<DateTime<Utc>>,
    pub(crate) districts: Vec<District>,
    pub(crate) readings: BTreeMap<ZoneId, ZoneReading>,
    pub(crate) sources: BTreeMap<ZoneId, ReadingSource>,
    pub(crate) feed: BTreeMap<ZoneId, ZoneReading>,
    pub(crate) external_zones: BTreeSet<ZoneId>,
    pub(crate) pending: Vec<PendingReading>,
    pub(crate) applied: Vec<AppliedReading>,
    pub(crate) failures: Vec<SyncFailure>,
    pub(crate) summary: Summary,
}

impl Dashboard {
    /// Assigns every district its owning zone. A district outside the
    /// partition is rejected rather than parked in a placeholder zone.
    pub fn from_records(records: &[DistrictRecord], table: &ZoneTable) -> Result<Self, ZoneError> {
        let mut districts = Vec::with_capacity(records.len());
        for record in records {
            let zone = table.zone_of(record.id)?;
            districts.push(District {
                id: record.id,
                name: record.name.clone(),
                zone: zone.clone(),
                disaster_type: DisasterType::None,
            });
        }
        Ok(Self::new(districts))
    }

    pub fn new(mut districts: Vec<District>) -> Self {
        districts.sort_by_key(|district| district.id);
        let summary = summarize(&districts);
        Self {
            tick: 0,
            updated_at: None,
            districts,
            readings: BTreeMap::new(),
            sources: BTreeMap::new(),
            feed: BTreeMap::new(),
            external_zones: BTreeSet::new(),
            pending: Vec::new(),
            applied: Vec::new(),
            failures: Vec::new(),
            summary,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub(crate) fn begin_tick(&mut self) {
        self.applied.clear();
        self.failures.clear();
        self.pending.clear();
    }

    pub(crate) fn advance_time(&mut self, now: DateTime<Utc>) {
        self.tick += 1;
        self.updated_at = Some(now);
    }

    pub fn districts(&self) -> &[District] {
        &self.districts
    }

    pub fn district(&self, id: DistrictId) -> Option<&District> {
        self.districts
            .binary_search_by_key(&id, |district| district.id)
            .ok()
            .map(|index| &self.districts[index])
    }

    pub fn reading(&self, zone: &ZoneId) -> Option<&ZoneReading> {
        self.readings.get(zone)
    }

    pub fn readings(&self) -> impl Iterator<Item = &ZoneReading> {
        self.readings.values()
    }

    pub fn source(&self, zone: &ZoneId) -> Option<ReadingSource> {
        self.sources.get(zone).copied()
    }

    /// Zones whose state is driven by the external feed.
    pub fn is_external(&self, zone: &ZoneId) -> bool {
        self.external_zones.contains(zone)
    }

    pub fn queued_feed(&self) -> usize {
        self.feed.len()
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    pub fn applied(&self) -> &[AppliedReading] {
        &self.applied
    }

    pub fn failures(&self) -> &[SyncFailure] {
        &self.failures
    }

    /// Display type shared by a zone's districts.
    pub fn zone_disaster(&self, zone: &ZoneId) -> DisasterType {
        self.districts
            .iter()
            .find(|district| &district.zone == zone)
            .map(|district| district.disaster_type)
            .unwrap_or_default()
    }

    pub fn snapshot(&self, scenario: &str) -> DashboardSnapshot {
        DashboardSnapshot {
            scenario: scenario.to_string(),
            tick: self.tick,
            updated_at: self.updated_at,
            summary: self.summary,
            districts: self.districts.clone(),
            readings: self.readings.values().cloned().collect(),
            sources: self.sources.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::ZoneEntry;

    fn table() -> ZoneTable {
        ZoneTable::new(vec![
            ZoneEntry {
                id: ZoneId::from("Zone 2"),
                name: "Zone 2".into(),
                districts: vec![DistrictId(9), DistrictId(5)],
            },
            ZoneEntry {
                id: ZoneId::from("Zone 4"),
                name: "Zone 4".into(),
                districts: vec![DistrictId(3)],
            },
        ])
        .unwrap()
    }

    fn record(id: u32) -> DistrictRecord {
        DistrictRecord {
            id: DistrictId(id),
            name: format!("Lyon {id}e Arrondissement"),
        }
    }

    #[test]
    fn districts_are_sorted_and_zoned() {
        let dashboard =
            Dashboard::from_records(&[record(9), record(3), record(5)], &table()).unwrap();
        let ids: Vec<u32> = dashboard.districts().iter().map(|d| d.id.raw()).collect();
        assert_eq!(ids, vec![3, 5, 9]);
        assert_eq!(
            dashboard.district(DistrictId(9)).unwrap().zone,
            ZoneId::from("Zone 2")
        );
        assert!(dashboard
            .districts()
            .iter()
            .all(|d| d.disaster_type == DisasterType::None));
        assert_eq!(dashboard.summary().total, 3);
    }

    #[test]
    fn unzoned_district_is_rejected() {
        let result = Dashboard::from_records(&[record(9), record(12)], &table());
        assert!(matches!(
            result,
            Err(ZoneError::UnknownDistrict(DistrictId(12)))
        ));
    }

    #[test]
    fn district_serializes_with_dashboard_field_names() {
        let dashboard = Dashboard::from_records(&[record(3)], &table()).unwrap();
        let json = serde_json::to_value(&dashboard.districts()[0]).unwrap();
        assert_eq!(json["disaster"], "none");
        assert_eq!(json["zone"], "Zone 4");
        assert_eq!(json["id"], 3);
    }
}
