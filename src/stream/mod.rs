//! Metric stream publishing

pub mod generators;
pub mod registry;

pub use generators::{DashboardRegistry, SharedRng, dashboard_registry, shared_rng};
pub use registry::{DEFAULT_TICK_INTERVAL, Generator, Handler, StreamRegistry};
