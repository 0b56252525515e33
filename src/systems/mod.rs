mod aggregate;
mod generation;
mod synchronize;

pub use aggregate::AggregateSystem;
pub use generation::GenerationSystem;
pub use synchronize::SyncSystem;
