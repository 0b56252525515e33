use anyhow::Result;
use tracing::{debug, warn};

use crate::{
    engine::{System, SystemContext},
    rng::StreamRng,
    world::{Dashboard, PendingReading, SyncFailure},
};

/// The only writer of district state. A reading that fails is logged and
/// recorded; the districts keep their previous state.
pub struct SyncSystem;

impl SyncSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SyncSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for SyncSystem {
    fn name(&self) -> &str {
        "sync"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        dashboard: &mut Dashboard,
        _rng: &mut StreamRng<'_>,
    ) -> Result<()> {
        let pending = std::mem::take(&mut dashboard.pending);
        for PendingReading { reading, source } in pending {
            let zone = reading.zone.clone();
            match ctx.synchronizer.commit(dashboard, reading, source) {
                Ok(disaster_type) => debug!(
                    tick = ctx.tick,
                    zone = %zone,
                    disaster_type = %disaster_type,
                    ?source,
                    "reading applied"
                ),
                Err(err) => {
                    warn!(
                        tick = ctx.tick,
                        zone = %zone,
                        ?source,
                        error = %err,
                        "reading rejected, keeping previous district state"
                    );
                    dashboard.failures.push(SyncFailure {
                        zone,
                        source,
                        error: err.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
