//! Churn risk scoring over per-customer feature vectors.
use crate::core::error::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

const USAGE_WEIGHT: f64 = 0.30;
const SUPPORT_WEIGHT: f64 = 0.25;
const CONTRACT_WEIGHT: f64 = 0.25;
const ENGAGEMENT_WEIGHT: f64 = 0.20;

/// Days of remaining contract below which renewal counts as at risk.
const CONTRACT_HORIZON_DAYS: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CustomerFeatures {
    /// Share of the platform actually used, in [0, 1].
    pub usage: f64,
    pub support_tickets: u32,
    pub contract_days: i64,
    /// Engagement score in [0, 1].
    pub engagement: f64,
}

/// Partial feature update; `None` fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureUpdate {
    #[serde(default)]
    pub usage: Option<f64>,
    #[serde(default)]
    pub support_tickets: Option<u32>,
    #[serde(default)]
    pub contract_days: Option<i64>,
    #[serde(default)]
    pub engagement: Option<f64>,
}

impl FeatureUpdate {
    fn validate(&self, customer_id: &str) -> Result<(), ModelError> {
        let out_of_range = |v: Option<f64>| v.is_some_and(|v| !(0.0..=1.0).contains(&v));
        let field = if out_of_range(self.usage) {
            "usage"
        } else if out_of_range(self.engagement) {
            "engagement"
        } else {
            return Ok(());
        };
        Err(ModelError::InvalidUpdate {
            id: customer_id.to_string(),
            field,
            reason: "must be between 0 and 1",
        })
    }
}

impl CustomerFeatures {
    /// Whether `usage` and `engagement` both lie in [0, 1].
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.usage) && (0.0..=1.0).contains(&self.engagement)
    }

    fn merge(&mut self, update: &FeatureUpdate) {
        if let Some(v) = update.usage {
            self.usage = v;
        }
        if let Some(v) = update.support_tickets {
            self.support_tickets = v;
        }
        if let Some(v) = update.contract_days {
            self.contract_days = v;
        }
        if let Some(v) = update.engagement {
            self.engagement = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnRisk {
    pub customer_id: String,
    pub risk_score: u8,
    pub factors: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub retention_probability: u8,
}

pub fn default_customers() -> BTreeMap<String, CustomerFeatures> {
    let seed = [
        ("CUST001", 0.3, 5, 30, 0.2),
        ("CUST002", 0.1, 2, 15, 0.1),
        ("CUST003", 0.6, 3, 45, 0.4),
        ("CUST004", 0.8, 1, 120, 0.7),
        ("CUST005", 0.9, 0, 200, 0.9),
    ];
    seed.into_iter()
        .map(|(id, usage, support_tickets, contract_days, engagement)| {
            (
                id.to_string(),
                CustomerFeatures {
                    usage,
                    support_tickets,
                    contract_days,
                    engagement,
                },
            )
        })
        .collect()
}

/// Weighted sum of the four churn indicators, scaled to 0..=100.
fn weighted_risk(features: &CustomerFeatures) -> u8 {
    let usage_score = (1.0 - features.usage) * USAGE_WEIGHT;
    let support_score = (features.support_tickets as f64 / 10.0).min(1.0) * SUPPORT_WEIGHT;
    let contract_score = ((CONTRACT_HORIZON_DAYS - features.contract_days as f64)
        / CONTRACT_HORIZON_DAYS)
        .max(0.0)
        * CONTRACT_WEIGHT;
    let engagement_score = (1.0 - features.engagement) * ENGAGEMENT_WEIGHT;

    let total = usage_score + support_score + contract_score + engagement_score;
    (total * 100.0).round().clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone)]
pub struct ChurnModel {
    customers: BTreeMap<String, CustomerFeatures>,
}

impl ChurnModel {
    pub fn new() -> Self {
        Self::with_customers(default_customers())
    }

    pub fn with_customers(customers: BTreeMap<String, CustomerFeatures>) -> Self {
        Self { customers }
    }

    pub fn customer_ids(&self) -> Vec<String> {
        self.customers.keys().cloned().collect()
    }

    pub fn features(&self, customer_id: &str) -> Option<&CustomerFeatures> {
        self.customers.get(customer_id)
    }

    pub fn predict_churn_risk(&self, customer_id: &str) -> Result<ChurnRisk, ModelError> {
        let features = self
            .customers
            .get(customer_id)
            .ok_or_else(|| ModelError::CustomerNotFound(customer_id.to_string()))?;

        let risk_score = weighted_risk(features);

        let mut factors = Vec::new();
        if features.usage < 0.5 {
            factors.push("Low platform usage".to_string());
        }
        if features.support_tickets > 3 {
            factors.push("High support ticket volume".to_string());
        }
        if (features.contract_days as f64) < CONTRACT_HORIZON_DAYS {
            factors.push("Contract expiring soon".to_string());
        }
        if features.engagement < 0.4 {
            factors.push("Low engagement score".to_string());
        }

        let mut recommended_actions = Vec::new();
        if risk_score > 70 {
            recommended_actions.push("Immediate personal outreach".to_string());
            recommended_actions.push("Offer retention discount".to_string());
        }
        if features.usage < 0.3 {
            recommended_actions.push("Schedule product training".to_string());
        }
        if features.support_tickets > 2 {
            recommended_actions.push("Escalate to success manager".to_string());
        }

        let retention_probability = 90u8.saturating_sub(risk_score).max(10);

        debug!(customer_id, risk_score, "Predicted churn risk");
        Ok(ChurnRisk {
            customer_id: customer_id.to_string(),
            risk_score,
            factors,
            recommended_actions,
            retention_probability,
        })
    }

    /// Scores every id in order. The first unknown id fails the whole batch.
    pub fn batch_predict<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<ChurnRisk>, ModelError> {
        ids.iter()
            .map(|id| self.predict_churn_risk(id.as_ref()))
            .collect()
    }

    /// Merges the supplied fields into an existing customer's features.
    /// Unknown customers are rejected, as on the read path, and so are
    /// `usage` or `engagement` values outside [0, 1].
    pub fn update_customer_features(
        &mut self,
        customer_id: &str,
        update: FeatureUpdate,
    ) -> Result<(), ModelError> {
        let features = self
            .customers
            .get_mut(customer_id)
            .ok_or_else(|| ModelError::CustomerNotFound(customer_id.to_string()))?;
        update.validate(customer_id)?;
        features.merge(&update);
        debug!(customer_id, ?update, "Updated customer features");
        Ok(())
    }
}

impl Default for ChurnModel {
    fn default() -> Self {
        Self::new()
    }
}
