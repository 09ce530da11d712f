//! Dynamic pricing heuristic driven by per-product market conditions.
use crate::core::error::ModelError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Monthly unit volume used to turn a price delta into an impact estimate.
const MONTHLY_VOLUME: f64 = 450.0;

/// Market factors for one product. `demand`, `competition` and `seasonality`
/// are multipliers around 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    pub base_price: f64,
    pub demand: f64,
    pub competition: f64,
    pub seasonality: f64,
    pub elasticity: f64,
}

/// Partial market update; `None` fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketUpdate {
    #[serde(default)]
    pub base_price: Option<f64>,
    #[serde(default)]
    pub demand: Option<f64>,
    #[serde(default)]
    pub competition: Option<f64>,
    #[serde(default)]
    pub seasonality: Option<f64>,
    #[serde(default)]
    pub elasticity: Option<f64>,
}

impl MarketUpdate {
    fn validate(&self, product_id: &str) -> Result<(), ModelError> {
        if self
            .base_price
            .is_some_and(|price| !price.is_finite() || price <= 0.0)
        {
            return Err(ModelError::InvalidUpdate {
                id: product_id.to_string(),
                field: "base_price",
                reason: "must be a positive price",
            });
        }
        Ok(())
    }
}

impl MarketState {
    fn merge(&mut self, update: &MarketUpdate) {
        if let Some(v) = update.base_price {
            self.base_price = v;
        }
        if let Some(v) = update.demand {
            self.demand = v;
        }
        if let Some(v) = update.competition {
            self.competition = v;
        }
        if let Some(v) = update.seasonality {
            self.seasonality = v;
        }
        if let Some(v) = update.elasticity {
            self.elasticity = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRecommendation {
    pub product_id: String,
    pub current_price: f64,
    pub recommended_price: f64,
    pub confidence: f64,
    pub expected_impact: f64,
    pub factors: Vec<String>,
}

pub fn default_markets() -> BTreeMap<String, MarketState> {
    BTreeMap::from([
        (
            "premium-plan".to_string(),
            MarketState {
                base_price: 99.0,
                demand: 0.85,
                competition: 0.72,
                seasonality: 1.08,
                elasticity: -0.8,
            },
        ),
        (
            "basic-plan".to_string(),
            MarketState {
                base_price: 29.0,
                demand: 1.15,
                competition: 0.95,
                seasonality: 0.93,
                elasticity: -1.2,
            },
        ),
        (
            "enterprise-plan".to_string(),
            MarketState {
                base_price: 299.0,
                demand: 0.78,
                competition: 0.65,
                seasonality: 1.12,
                elasticity: -0.6,
            },
        ),
    ])
}

#[derive(Debug, Clone)]
pub struct PricingModel {
    markets: BTreeMap<String, MarketState>,
}

impl PricingModel {
    pub fn new() -> Self {
        Self::with_markets(default_markets())
    }

    pub fn with_markets(markets: BTreeMap<String, MarketState>) -> Self {
        Self { markets }
    }

    pub fn product_ids(&self) -> Vec<String> {
        self.markets.keys().cloned().collect()
    }

    pub fn market_state(&self, product_id: &str) -> Option<&MarketState> {
        self.markets.get(product_id)
    }

    /// Computes a price recommendation from the product's current market state.
    pub fn calculate_optimal_price(
        &self,
        product_id: &str,
    ) -> Result<PricingRecommendation, ModelError> {
        let state = self
            .markets
            .get(product_id)
            .ok_or_else(|| ModelError::ProductNotFound(product_id.to_string()))?;

        let adjustment = (state.demand - 1.0) * 0.15
            + (1.0 - state.competition) * 0.10
            + (state.seasonality - 1.0) * 0.12;
        let recommended_price = (state.base_price * (1.0 + adjustment)).round();
        let confidence = (75.0 + adjustment.abs() * 100.0).min(95.0).clamp(0.0, 100.0);
        let expected_impact = (recommended_price - state.base_price) * MONTHLY_VOLUME;

        let mut factors = Vec::new();
        if state.demand > 1.05 {
            factors.push("High demand detected".to_string());
        }
        if state.competition < 0.8 {
            factors.push("Limited competition".to_string());
        }
        if state.seasonality > 1.05 {
            factors.push("Seasonal uptrend".to_string());
        }
        if state.demand < 0.95 {
            factors.push("Demand softening".to_string());
        }
        if state.competition > 0.9 {
            factors.push("Competitive pressure".to_string());
        }

        debug!(
            product_id,
            adjustment, recommended_price, confidence, "Calculated optimal price"
        );
        Ok(PricingRecommendation {
            product_id: product_id.to_string(),
            current_price: state.base_price,
            recommended_price,
            confidence,
            expected_impact,
            factors,
        })
    }

    /// Merges the supplied fields into an existing product's market state.
    ///
    /// Unknown products are rejected the same way reads are; the table never
    /// grows through updates. A non-positive `base_price` is rejected and
    /// leaves the state untouched.
    pub fn update_market_conditions(
        &mut self,
        product_id: &str,
        update: MarketUpdate,
    ) -> Result<(), ModelError> {
        let state = self
            .markets
            .get_mut(product_id)
            .ok_or_else(|| ModelError::ProductNotFound(product_id.to_string()))?;
        update.validate(product_id)?;
        state.merge(&update);
        debug!(product_id, ?update, "Updated market conditions");
        Ok(())
    }

    /// Simulates a market refresh: redraws demand, competition and
    /// seasonality for every product, then recomputes the recommendations.
    pub fn simulate_market_shift<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<Vec<PricingRecommendation>, ModelError> {
        let products = self.product_ids();
        for product_id in &products {
            let update = MarketUpdate {
                demand: Some(rng.gen_range(0.8..1.2)),
                competition: Some(rng.gen_range(0.6..1.0)),
                seasonality: Some(rng.gen_range(0.9..1.1)),
                ..Default::default()
            };
            self.update_market_conditions(product_id, update)?;
        }
        debug!(products = products.len(), "Simulated market shift");

        products
            .iter()
            .map(|id| self.calculate_optimal_price(id))
            .collect()
    }
}

impl Default for PricingModel {
    fn default() -> Self {
        Self::new()
    }
}
