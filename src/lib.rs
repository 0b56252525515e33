pub mod classifier;
pub mod disaster;
pub mod engine;
pub mod error;
pub mod feed;
pub mod generator;
pub mod reading;
pub mod rng;
pub mod scenario;
pub mod summary;
pub mod sync;
pub mod systems;
pub mod web;
pub mod world;
pub mod zones;

pub use disaster::{normalize, Disaster, DisasterType};
pub use engine::{Engine, EngineBuilder, EngineSettings, TickSummary};
pub use error::ZoneError;
pub use scenario::{Scenario, ScenarioLoader};
pub use summary::{summarize, Summary};
pub use sync::Synchronizer;
