//! Fans a zone reading out to the districts of that zone.

use std::collections::HashMap;

use crate::classifier::{classify, Thresholds, ZonePolicy};
use crate::disaster::{normalize, Disaster, DisasterType};
use crate::error::ZoneError;
use crate::reading::ZoneReading;
use crate::summary::summarize;
use crate::world::{AppliedReading, Dashboard, District, ReadingSource};
use crate::zones::{ZoneId, ZoneTable};

/// Immutable rules shared by every tick: the zone partition, each zone's
/// hazard policy and the global thresholds.
#[derive(Debug, Clone)]
pub struct Synchronizer {
    table: ZoneTable,
    policies: HashMap<ZoneId, ZonePolicy>,
    thresholds: Thresholds,
}

impl Synchronizer {
    /// Zones without an entry in `policies` are eligible for no hazard.
    pub fn new(
        table: ZoneTable,
        policies: HashMap<ZoneId, ZonePolicy>,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            table,
            policies,
            thresholds,
        }
    }

    pub fn table(&self) -> &ZoneTable {
        &self.table
    }

    pub fn policy(&self, zone: &ZoneId) -> ZonePolicy {
        self.policies.get(zone).copied().unwrap_or_default()
    }

    /// Boundary check for readings entering the pipeline.
    pub fn check(&self, reading: &ZoneReading) -> Result<(), ZoneError> {
        reading.validate()?;
        self.table.entry(&reading.zone)?;
        Ok(())
    }

    pub fn classify(&self, reading: &ZoneReading) -> Result<Vec<Disaster>, ZoneError> {
        self.check(reading)?;
        Ok(classify(
            &reading.metrics,
            &self.policy(&reading.zone),
            &self.thresholds,
        ))
    }

    pub fn disaster_type(&self, reading: &ZoneReading) -> Result<DisasterType, ZoneError> {
        self.classify(reading).map(|categories| normalize(&categories))
    }

    /// Returns a new collection in which every district of the reading's zone
    /// carries the reading's display type. On error nothing is produced, so
    /// the caller's collection stays as it was.
    pub fn apply_reading(
        &self,
        reading: &ZoneReading,
        districts: &[District],
    ) -> Result<Vec<District>, ZoneError> {
        let disaster_type = self.disaster_type(reading)?;
        Ok(fan_out(&reading.zone, disaster_type, districts))
    }

    /// Applies a reading to the dashboard in place. The new district
    /// collection, the latest reading and the summary are swapped in together
    /// only once the whole update has succeeded.
    pub fn commit(
        &self,
        dashboard: &mut Dashboard,
        reading: ZoneReading,
        source: ReadingSource,
    ) -> Result<DisasterType, ZoneError> {
        let categories = self.classify(&reading)?;
        let disaster_type = normalize(&categories);
        let districts = fan_out(&reading.zone, disaster_type, &dashboard.districts);

        let zone = reading.zone.clone();
        dashboard.summary = summarize(&districts);
        dashboard.districts = districts;
        dashboard.readings.insert(
            zone.clone(),
            ZoneReading {
                disaster: categories,
                ..reading
            },
        );
        dashboard.sources.insert(zone.clone(), source);
        dashboard.applied.push(AppliedReading {
            zone,
            disaster_type,
            source,
        });
        Ok(disaster_type)
    }
}

fn fan_out(zone: &ZoneId, disaster_type: DisasterType, districts: &[District]) -> Vec<District> {
    districts
        .iter()
        .map(|district| {
            if &district.zone == zone {
                District {
                    disaster_type,
                    ..district.clone()
                }
            } else {
                district.clone()
            }
        })
        .collect()
}
