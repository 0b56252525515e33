//! Static partition of districts into zones.
//!
//! The table is built once from the scenario and never mutated. Every
//! district belongs to exactly one zone, and both lookup directions are
//! backed by the same data so they cannot disagree.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ZoneError;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistrictId(pub u32);

impl DistrictId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DistrictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneEntry {
    pub id: ZoneId,
    pub name: String,
    pub districts: Vec<DistrictId>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PartitionError {
    #[error("zone '{0}' defined more than once")]
    DuplicateZone(ZoneId),

    #[error("zone '{0}' has no districts")]
    EmptyZone(ZoneId),

    #[error("district {district} is claimed by both '{first}' and '{second}'")]
    SharedDistrict {
        district: DistrictId,
        first: ZoneId,
        second: ZoneId,
    },
}

#[derive(Debug, Clone)]
pub struct ZoneTable {
    zones: Vec<ZoneEntry>,
    index: HashMap<ZoneId, usize>,
    owners: BTreeMap<DistrictId, ZoneId>,
}

impl ZoneTable {
    /// Builds the table, rejecting anything that is not a partition.
    pub fn new(zones: Vec<ZoneEntry>) -> Result<Self, PartitionError> {
        let mut index = HashMap::with_capacity(zones.len());
        let mut owners = BTreeMap::new();
        for (position, zone) in zones.iter().enumerate() {
            if index.insert(zone.id.clone(), position).is_some() {
                return Err(PartitionError::DuplicateZone(zone.id.clone()));
            }
            if zone.districts.is_empty() {
                return Err(PartitionError::EmptyZone(zone.id.clone()));
            }
            for district in &zone.districts {
                if let Some(first) = owners.insert(*district, zone.id.clone()) {
                    return Err(PartitionError::SharedDistrict {
                        district: *district,
                        first,
                        second: zone.id.clone(),
                    });
                }
            }
        }
        Ok(Self {
            zones,
            index,
            owners,
        })
    }

    pub fn zone_of(&self, district: DistrictId) -> Result<&ZoneId, ZoneError> {
        self.owners
            .get(&district)
            .ok_or(ZoneError::UnknownDistrict(district))
    }

    pub fn districts_of(&self, zone: &ZoneId) -> Result<&[DistrictId], ZoneError> {
        self.entry(zone).map(|entry| entry.districts.as_slice())
    }

    pub fn entry(&self, zone: &ZoneId) -> Result<&ZoneEntry, ZoneError> {
        self.index
            .get(zone)
            .map(|&position| &self.zones[position])
            .ok_or_else(|| ZoneError::UnknownZone(zone.clone()))
    }

    /// Zones in configuration order.
    pub fn zones(&self) -> &[ZoneEntry] {
        &self.zones
    }

    /// Every district id covered by the partition, ascending.
    pub fn district_ids(&self) -> impl Iterator<Item = DistrictId> + '_ {
        self.owners.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, districts: &[u32]) -> ZoneEntry {
        ZoneEntry {
            id: ZoneId::from(id),
            name: id.to_string(),
            districts: districts.iter().copied().map(DistrictId).collect(),
        }
    }

    fn lyon() -> ZoneTable {
        ZoneTable::new(vec![
            entry("Zone 2", &[9, 5]),
            entry("Zone 3", &[4, 1, 2]),
            entry("Zone 4", &[3, 6, 7, 8]),
        ])
        .unwrap()
    }

    #[test]
    fn every_district_round_trips_through_its_zone() {
        let table = lyon();
        let ids: Vec<_> = table.district_ids().collect();
        assert_eq!(ids.len(), 9);
        for id in ids {
            let zone = table.zone_of(id).unwrap();
            assert!(table.districts_of(zone).unwrap().contains(&id));
        }
    }

    #[test]
    fn districts_keep_configured_order() {
        let table = lyon();
        let members = table.districts_of(&ZoneId::from("Zone 3")).unwrap();
        assert_eq!(members, &[DistrictId(4), DistrictId(1), DistrictId(2)]);
    }

    #[test]
    fn unknown_lookups_fail() {
        let table = lyon();
        assert_eq!(
            table.zone_of(DistrictId(42)),
            Err(ZoneError::UnknownDistrict(DistrictId(42)))
        );
        assert_eq!(
            table.districts_of(&ZoneId::from("Zone 9")),
            Err(ZoneError::UnknownZone(ZoneId::from("Zone 9")))
        );
    }

    #[test]
    fn overlapping_zones_are_rejected() {
        let err = ZoneTable::new(vec![entry("Zone 2", &[1, 2]), entry("Zone 3", &[2, 3])])
            .unwrap_err();
        assert_eq!(
            err,
            PartitionError::SharedDistrict {
                district: DistrictId(2),
                first: ZoneId::from("Zone 2"),
                second: ZoneId::from("Zone 3"),
            }
        );
    }

    #[test]
    fn duplicate_and_empty_zones_are_rejected() {
        assert!(matches!(
            ZoneTable::new(vec![entry("Zone 2", &[1]), entry("Zone 2", &[2])]),
            Err(PartitionError::DuplicateZone(_))
        ));
        assert!(matches!(
            ZoneTable::new(vec![entry("Zone 2", &[])]),
            Err(PartitionError::EmptyZone(_))
        ));
    }
}
