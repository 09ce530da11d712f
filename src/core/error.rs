//! Typed errors surfaced by the stream registry and the decision models.

use thiserror::Error;

/// Lookup and update failures on the model state tables.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Invalid {field} for {id}: {reason}")]
    InvalidUpdate {
        id: String,
        field: &'static str,
        reason: &'static str,
    },
}

/// Subscription failures on the metric stream registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("No generator registered for stream: {0}")]
    UnknownStream(String),

    #[error("Stream timers require a running Tokio runtime")]
    NoRuntime,
}
