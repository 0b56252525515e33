use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    generator::{generate, Variation},
    reading::ZoneProfile,
    rng::{RngManager, StreamRng},
    world::{Dashboard, PendingReading, ReadingSource},
    zones::ZoneId,
};

/// Fills the tick's inbox. Queued external readings go first; a zone that
/// has ever received one is no longer simulated. Each zone draws from its
/// own stream, so one zone going external leaves the others' values alone.
pub struct GenerationSystem {
    profiles: Vec<(ZoneId, ZoneProfile)>,
    variation: Variation,
    simulate: bool,
    streams: RngManager,
}

impl GenerationSystem {
    pub fn new(
        profiles: Vec<(ZoneId, ZoneProfile)>,
        variation: Variation,
        simulate: bool,
        seed: u64,
    ) -> Self {
        Self {
            profiles,
            variation,
            simulate,
            streams: RngManager::new(seed),
        }
    }
}

impl System for GenerationSystem {
    fn name(&self) -> &str {
        "generation"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        dashboard: &mut Dashboard,
        _rng: &mut StreamRng<'_>,
    ) -> Result<()> {
        let external = std::mem::take(&mut dashboard.feed);
        for (zone, reading) in external {
            dashboard.external_zones.insert(zone);
            dashboard.pending.push(PendingReading {
                reading,
                source: ReadingSource::External,
            });
        }

        if !self.simulate {
            return Ok(());
        }
        for (zone, profile) in &self.profiles {
            if dashboard.is_external(zone) {
                continue;
            }
            let mut rng = self.streams.stream(zone.as_str());
            let reading = generate(zone, profile, &self.variation, ctx.now, &mut rng);
            dashboard.pending.push(PendingReading {
                reading,
                source: ReadingSource::Simulated,
            });
        }
        Ok(())
    }
}
