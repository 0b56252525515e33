use anyhow::Result;
use tracing::info;

use crate::{
    engine::{System, SystemContext},
    rng::StreamRng,
    summary::{summarize, Summary},
    world::Dashboard,
};

/// Recomputes the headline counts and reports when they move.
pub struct AggregateSystem {
    last: Option<Summary>,
}

impl AggregateSystem {
    pub fn new() -> Self {
        Self { last: None }
    }
}

impl Default for AggregateSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for AggregateSystem {
    fn name(&self) -> &str {
        "aggregate"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        dashboard: &mut Dashboard,
        _rng: &mut StreamRng<'_>,
    ) -> Result<()> {
        let summary = summarize(&dashboard.districts);
        dashboard.summary = summary;
        if self.last != Some(summary) {
            info!(
                scenario = ctx.scenario_name,
                tick = ctx.tick,
                affected = summary.affected,
                earthquake_active = summary.earthquake_active,
                flood_active = summary.flood_active,
                total = summary.total,
                "district summary changed"
            );
            self.last = Some(summary);
        }
        Ok(())
    }
}
