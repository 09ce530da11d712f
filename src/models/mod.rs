//! Heuristic decision models over small in-memory state tables

pub mod churn;
pub mod forecast;
pub mod pricing;

pub use churn::{ChurnModel, ChurnRisk, CustomerFeatures, FeatureUpdate};
pub use forecast::{ForecastModel, ForecastResult, SeasonalFactor};
pub use pricing::{MarketState, MarketUpdate, PricingModel, PricingRecommendation};
