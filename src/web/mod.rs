mod error;

use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tokio::{
    net::TcpListener,
    sync::broadcast,
    time::{interval, MissedTickBehavior},
};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{info, warn};

use crate::{
    classifier::ZonePolicy,
    disaster::DisasterType,
    engine::Engine,
    feed::{parse_snapshot, to_records, FeedRecord},
    reading::ZoneReading,
    summary::Summary,
    world::{Dashboard, DashboardSnapshot, District, ReadingSource},
    zones::{DistrictId, ZoneId},
};

pub use error::ApiError;

/// Engine and dashboard live behind one lock: ticks and feed pushes are
/// serialized, so there is never more than one writer.
pub struct Session {
    pub engine: Engine,
    pub dashboard: Dashboard,
}

pub struct AppState {
    session: Mutex<Session>,
    broadcaster: broadcast::Sender<String>,
    tick_interval: Duration,
}

impl AppState {
    pub fn new(engine: Engine, dashboard: Dashboard, tick_interval: Duration) -> Self {
        let (broadcaster, _) = broadcast::channel::<String>(64);
        Self {
            session: Mutex::new(Session { engine, dashboard }),
            broadcaster,
            tick_interval,
        }
    }

    /// Runs one tick and publishes the resulting frame to SSE subscribers.
    pub fn tick(&self) -> Result<DashboardSnapshot> {
        let frame = {
            let mut guard = self.session.lock().expect("session lock poisoned");
            let Session { engine, dashboard } = &mut *guard;
            engine.tick(dashboard, Utc::now())?;
            dashboard.snapshot(engine.scenario_name())
        };
        if let Ok(payload) = serde_json::to_string(&frame) {
            let _ = self.broadcaster.send(payload);
        }
        Ok(frame)
    }

    fn read<T>(&self, view: impl FnOnce(&Session) -> T) -> T {
        let guard = self.session.lock().expect("session lock poisoned");
        view(&guard)
    }
}

pub struct WebServerConfig {
    pub host: String,
    pub port: u16,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/state", get(latest_state))
        .route("/api/data", get(latest_data))
        .route("/api/districts", get(districts))
        .route("/api/districts/:id", get(district))
        .route("/api/zones", get(zones))
        .route("/api/summary", get(summary))
        .route("/api/feed", axum::routing::post(push_feed))
        .route("/api/events", get(stream_events))
        .with_state(state)
}

pub async fn run(state: Arc<AppState>, config: WebServerConfig) -> Result<()> {
    let ticker_state = state.clone();
    let ticker = tokio::spawn(async move {
        let mut timer = interval(ticker_state.tick_interval);
        // A tick that could not start on time is dropped, not queued.
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            timer.tick().await;
            if let Err(err) = ticker_state.tick() {
                warn!(error = %err, "tick failed, waiting for the next one");
            }
        }
    });

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid address {}:{}", config.host, config.port))?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "zonewatch dashboard API listening");

    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;
    ticker.abort();
    served?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down, tick timer stopped");
}

#[derive(Serialize)]
pub struct StateEnvelope {
    pub scenario: String,
    pub tick_interval_ms: u64,
    pub queued_feed: usize,
    pub frame: DashboardSnapshot,
}

async fn latest_state(State(state): State<Arc<AppState>>) -> Json<StateEnvelope> {
    let tick_interval_ms = state.tick_interval.as_millis() as u64;
    Json(state.read(|session| StateEnvelope {
        scenario: session.engine.scenario_name().to_string(),
        tick_interval_ms,
        queued_feed: session.dashboard.queued_feed(),
        frame: session.dashboard.snapshot(session.engine.scenario_name()),
    }))
}

async fn latest_data(State(state): State<Arc<AppState>>) -> Json<Vec<FeedRecord>> {
    Json(state.read(|session| to_records(session.dashboard.readings())))
}

async fn districts(State(state): State<Arc<AppState>>) -> Json<Vec<District>> {
    Json(state.read(|session| session.dashboard.districts().to_vec()))
}

async fn district(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<District>, ApiError> {
    state
        .read(|session| session.dashboard.district(DistrictId(id)).cloned())
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("district {id}")))
}

async fn summary(State(state): State<Arc<AppState>>) -> Json<Summary> {
    Json(state.read(|session| session.dashboard.summary()))
}

#[derive(Debug, Serialize)]
pub struct ZoneView {
    pub id: ZoneId,
    pub name: String,
    pub districts: Vec<DistrictId>,
    pub disaster: DisasterType,
    pub policy: ZonePolicy,
    pub source: Option<ReadingSource>,
    pub reading: Option<ZoneReading>,
}

async fn zones(State(state): State<Arc<AppState>>) -> Json<Vec<ZoneView>> {
    Json(state.read(|session| {
        let sync = session.engine.synchronizer();
        let dashboard = &session.dashboard;
        sync.table()
            .zones()
            .iter()
            .map(|zone| ZoneView {
                id: zone.id.clone(),
                name: zone.name.clone(),
                districts: zone.districts.clone(),
                disaster: dashboard.zone_disaster(&zone.id),
                policy: sync.policy(&zone.id),
                source: dashboard.source(&zone.id),
                reading: dashboard.reading(&zone.id).cloned(),
            })
            .collect()
    }))
}

#[derive(Debug, Serialize)]
pub struct FeedAccepted {
    pub accepted: usize,
}

async fn push_feed(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<(StatusCode, Json<FeedAccepted>), ApiError> {
    let readings = parse_snapshot(&body)?;
    let mut guard = state.session.lock().expect("session lock poisoned");
    let Session { engine, dashboard } = &mut *guard;
    let accepted = engine.ingest_feed(dashboard, readings)?;
    Ok((StatusCode::ACCEPTED, Json(FeedAccepted { accepted })))
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
