use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{
    error::ZoneError,
    reading::ZoneReading,
    rng::{RngManager, StreamRng},
    summary::Summary,
    sync::Synchronizer,
    world::{AppliedReading, Dashboard, DashboardSnapshot, SyncFailure},
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    synchronizer: Synchronizer,
    systems: Vec<Box<dyn System + Send>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings, synchronizer: Synchronizer) -> Self {
        Self {
            settings,
            synchronizer,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + Send + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + Send + 'static) {
        self.systems.push(Box::new(system));
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            synchronizer: self.synchronizer,
            settings: self.settings,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TickSummary {
    pub tick: u64,
    pub summary: Summary,
    pub applied: Vec<AppliedReading>,
    pub failures: Vec<SyncFailure>,
}

/// Runs the systems in registration order once per tick. The engine never
/// owns the dashboard: callers hand it in, which keeps one writer per tick.
pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System + Send>>,
    synchronizer: Synchronizer,
    settings: EngineSettings,
}

impl Engine {
    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    pub fn synchronizer(&self) -> &Synchronizer {
        &self.synchronizer
    }

    pub fn tick(&mut self, dashboard: &mut Dashboard, now: DateTime<Utc>) -> Result<TickSummary> {
        dashboard.begin_tick();
        let ctx = SystemContext {
            tick: dashboard.tick() + 1,
            now,
            scenario_name: &self.settings.scenario_name,
            synchronizer: &self.synchronizer,
        };
        for system in &mut self.systems {
            let mut rng_stream = self.rng.stream(system.name());
            system.run(&ctx, dashboard, &mut rng_stream)?;
        }
        dashboard.advance_time(now);
        debug!(
            tick = dashboard.tick(),
            applied = dashboard.applied().len(),
            failed = dashboard.failures().len(),
            "tick complete"
        );
        Ok(TickSummary {
            tick: dashboard.tick(),
            summary: dashboard.summary(),
            applied: dashboard.applied().to_vec(),
            failures: dashboard.failures().to_vec(),
        })
    }

    pub fn run(&mut self, dashboard: &mut Dashboard, ticks: u64) -> Result<()> {
        self.run_with_hook(dashboard, ticks, |_| {})
    }

    pub fn run_with_hook<F>(
        &mut self,
        dashboard: &mut Dashboard,
        ticks: u64,
        mut hook: F,
    ) -> Result<()>
    where
        F: FnMut(DashboardSnapshot),
    {
        for _ in 0..ticks {
            self.tick(dashboard, Utc::now())?;
            hook(dashboard.snapshot(&self.settings.scenario_name));
        }
        Ok(())
    }

    /// Queues an external snapshot for the next tick. The batch is checked as
    /// a whole first: one malformed reading or unknown zone rejects all of it.
    pub fn ingest_feed(
        &self,
        dashboard: &mut Dashboard,
        readings: Vec<ZoneReading>,
    ) -> Result<usize, ZoneError> {
        for reading in &readings {
            self.synchronizer.check(reading)?;
        }
        let accepted = readings.len();
        for reading in readings {
            dashboard.feed.insert(reading.zone.clone(), reading);
        }
        info!(accepted, "external feed queued");
        Ok(accepted)
    }
}

pub struct SystemContext<'a> {
    pub tick: u64,
    pub now: DateTime<Utc>,
    pub scenario_name: &'a str,
    pub synchronizer: &'a Synchronizer,
}

pub trait System {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        dashboard: &mut Dashboard,
        rng: &mut StreamRng<'_>,
    ) -> Result<()>;
}
