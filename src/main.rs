use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use zonewatch::{
    engine::Engine,
    feed::parse_snapshot,
    scenario::{Scenario, ScenarioLoader},
    web::{self, AppState, WebServerConfig},
    world::Dashboard,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Zone disaster monitoring pipeline")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// Path to the scenario YAML file
    #[arg(long, global = true, default_value = "scenarios/lyon.yaml")]
    scenario: PathBuf,

    /// Override the scenario seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// External `[{lastEntry: ...}]` snapshot applied on the first tick
    #[arg(long, global = true)]
    feed: Option<PathBuf>,

    /// Log filter (RUST_LOG takes precedence; defaults to the scenario level)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a fixed number of ticks and print the final district state
    Run {
        /// Override tick count (uses scenario default when omitted)
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Serve the dashboard API and tick on a timer
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8080)]
        port: u16,

        /// Override the scenario tick interval
        #[arg(long)]
        tick_interval_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.common.scenario)?;
    init_logging(cli.common.log_level.as_deref().unwrap_or(&scenario.logging.level));

    info!(
        scenario = %scenario.name,
        seed = cli.common.seed.unwrap_or(scenario.seed),
        zones = scenario.zones.len(),
        districts = scenario.districts.len(),
        "scenario loaded"
    );

    let (engine, dashboard) = prepare(&scenario, &cli.common)?;

    match cli.command {
        Command::Run { ticks } => run_headless(engine, dashboard, scenario.ticks(ticks)),
        Command::Serve {
            host,
            port,
            tick_interval_ms,
        } => {
            let tick_interval = tick_interval_ms
                .map(|ms| Duration::from_millis(ms.max(1)))
                .unwrap_or_else(|| scenario.tick_interval());
            let state = Arc::new(AppState::new(engine, dashboard, tick_interval));
            web::run(state, WebServerConfig { host, port }).await
        }
    }
}

fn init_logging(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(true)
        .init();
}

fn prepare(scenario: &Scenario, args: &CommonArgs) -> Result<(Engine, Dashboard)> {
    let engine = scenario.build_engine(args.seed)?;
    let mut dashboard = scenario.build_dashboard(engine.synchronizer())?;

    if let Some(path) = &args.feed {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read feed {}", path.display()))?;
        let readings = parse_snapshot(&text)
            .with_context(|| format!("Failed to parse feed {}", path.display()))?;
        engine
            .ingest_feed(&mut dashboard, readings)
            .with_context(|| format!("Feed {} rejected", path.display()))?;
    }
    Ok((engine, dashboard))
}

fn run_headless(mut engine: Engine, mut dashboard: Dashboard, ticks: u64) -> Result<()> {
    engine.run_with_hook(&mut dashboard, ticks, |frame| {
        info!(
            tick = frame.tick,
            affected = frame.summary.affected,
            earthquake_active = frame.summary.earthquake_active,
            flood_active = frame.summary.flood_active,
            "frame"
        );
    })?;

    for failure in dashboard.failures() {
        warn!(zone = %failure.zone, error = %failure.error, "last tick failure");
    }
    for district in dashboard.districts() {
        println!(
            "{:>3}  {:<28} {:<8} {}",
            district.id.raw(),
            district.name,
            district.zone.as_str(),
            district.disaster_type
        );
    }
    let summary = dashboard.summary();
    println!(
        "Scenario '{}' completed {} ticks: {}/{} districts affected ({} earthquake, {} flood)",
        engine.scenario_name(),
        ticks,
        summary.affected,
        summary.total,
        summary.earthquake_active,
        summary.flood_active
    );
    Ok(())
}
