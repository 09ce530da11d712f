//! Dashboard metric streams and the payloads they publish

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricStream {
    Revenue,
    Customers,
    ChurnRate,
    AiAccuracy,
    DemandTrend,
    PricingPerformance,
}

impl MetricStream {
    pub const ALL: [MetricStream; 6] = [
        MetricStream::Revenue,
        MetricStream::Customers,
        MetricStream::ChurnRate,
        MetricStream::AiAccuracy,
        MetricStream::DemandTrend,
        MetricStream::PricingPerformance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricStream::Revenue => "revenue",
            MetricStream::Customers => "customers",
            MetricStream::ChurnRate => "churnRate",
            MetricStream::AiAccuracy => "aiAccuracy",
            MetricStream::DemandTrend => "demandTrend",
            MetricStream::PricingPerformance => "pricingPerformance",
        }
    }
}

impl Display for MetricStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for MetricStream {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept both the dashboard names and kebab/snake spellings.
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "revenue" => Ok(MetricStream::Revenue),
            "customers" => Ok(MetricStream::Customers),
            "churnrate" => Ok(MetricStream::ChurnRate),
            "aiaccuracy" => Ok(MetricStream::AiAccuracy),
            "demandtrend" => Ok(MetricStream::DemandTrend),
            "pricingperformance" => Ok(MetricStream::PricingPerformance),
            _ => Err(anyhow::anyhow!("Invalid metric stream: {}", s)),
        }
    }
}

/// A single scalar reading with its relative change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl ChartPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
            predicted: None,
            confidence: None,
        }
    }
}

/// Aggregate performance of the pricing engine, all values in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingPerformance {
    pub revenue: f64,
    pub conversion: f64,
    pub optimization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum MetricPayload {
    Sample(MetricSample),
    Chart(Vec<ChartPoint>),
    Performance(PricingPerformance),
}
