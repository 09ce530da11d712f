//! Core types, configuration and logging shared by the streams and models

pub mod config;
pub mod error;
pub mod log;
pub mod metric;

// Re-export main types for cleaner imports
pub use error::{ModelError, StreamError};
pub use metric::{ChartPoint, MetricPayload, MetricSample, MetricStream, PricingPerformance};
