pub mod cli;
pub mod core;
pub mod models;
pub mod stream;

use crate::cli::ui::OutputFormat;
use crate::core::config::AppConfig;
use crate::core::error::ModelError;
use crate::core::metric::MetricStream;
use crate::models::{ChurnModel, ForecastModel, PricingModel, PricingRecommendation};
use crate::stream::{DashboardRegistry, SharedRng, dashboard_registry, shared_rng};
use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;
use tracing::{debug, info};

pub enum AppCommand {
    Pricing {
        products: Vec<String>,
        refresh: bool,
    },
    Forecast {
        product: Option<String>,
        periods: Option<usize>,
    },
    Churn {
        customers: Vec<String>,
    },
    Watch {
        streams: Vec<MetricStream>,
        ticks: Option<usize>,
    },
    History {
        periods: usize,
        horizon: usize,
    },
}

/// One isolated simulation: the three models plus the RNGs feeding market
/// refreshes and the metric streams. Instances share no state with each other.
pub struct Simulation {
    pub pricing: PricingModel,
    pub forecast: ForecastModel,
    pub churn: ChurnModel,
    pricing_rng: StdRng,
    stream_rng: SharedRng,
    tick_interval: Duration,
}

impl Simulation {
    pub fn from_config(config: &AppConfig) -> Self {
        // Forecast noise, market refreshes and stream samples draw from
        // separate sequences so that one never shifts another.
        let (forecast_rng, pricing_rng, stream_rng) = match config.seed {
            Some(seed) => (
                StdRng::seed_from_u64(seed),
                StdRng::seed_from_u64(seed.wrapping_add(2)),
                shared_rng(Some(seed.wrapping_add(1))),
            ),
            None => (
                StdRng::from_entropy(),
                StdRng::from_entropy(),
                shared_rng(None),
            ),
        };

        Self {
            pricing: PricingModel::with_markets(config.markets.clone()),
            forecast: ForecastModel::with_history(config.history.clone(), forecast_rng),
            churn: ChurnModel::with_customers(config.customers.clone()),
            pricing_rng,
            stream_rng,
            tick_interval: config.tick_interval(),
        }
    }

    /// A fresh registry serving the dashboard streams of this simulation.
    pub fn registry(&self) -> DashboardRegistry {
        dashboard_registry(self.tick_interval, &self.stream_rng)
    }

    pub fn stream_rng(&self) -> &SharedRng {
        &self.stream_rng
    }

    /// Redraws market conditions from this simulation's pricing sequence.
    pub fn refresh_markets(&mut self) -> Result<Vec<PricingRecommendation>, ModelError> {
        self.pricing.simulate_market_shift(&mut self.pricing_rng)
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    info!("Pulse simulator starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let mut simulation = Simulation::from_config(&config);

    match command {
        AppCommand::Pricing { products, refresh } => {
            let refresh_rng = refresh.then_some(&mut simulation.pricing_rng);
            cli::pricing::run(&mut simulation.pricing, &products, refresh_rng, format)
        }
        AppCommand::Forecast { product, periods } => cli::forecast::run(
            &mut simulation.forecast,
            product.as_deref(),
            periods.unwrap_or(config.forecast_periods),
            format,
        ),
        AppCommand::Churn { customers } => cli::churn::run(&simulation.churn, &customers, format),
        AppCommand::Watch { streams, ticks } => {
            let registry = simulation.registry();
            cli::watch::run(&registry, &streams, ticks, format).await
        }
        AppCommand::History { periods, horizon } => {
            cli::history::run(simulation.stream_rng(), periods, horizon, format)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeatureUpdate, MarketUpdate};

    #[test]
    fn test_simulations_are_isolated() {
        let mut first = Simulation::default();
        let second = Simulation::default();

        first
            .pricing
            .update_market_conditions(
                "premium-plan",
                MarketUpdate {
                    base_price: Some(120.0),
                    ..Default::default()
                },
            )
            .unwrap();
        first
            .churn
            .update_customer_features(
                "CUST005",
                FeatureUpdate {
                    usage: Some(0.0),
                    ..Default::default()
                },
            )
            .unwrap();

        let changed = first.pricing.calculate_optimal_price("premium-plan").unwrap();
        let untouched = second.pricing.calculate_optimal_price("premium-plan").unwrap();
        assert_eq!(changed.current_price, 120.0);
        assert_eq!(untouched.current_price, 99.0);
        assert_ne!(
            first.churn.predict_churn_risk("CUST005").unwrap(),
            second.churn.predict_churn_risk("CUST005").unwrap()
        );
    }

    #[test]
    fn test_seeded_simulations_forecast_identically() {
        let config = AppConfig {
            seed: Some(99),
            ..AppConfig::default()
        };
        let mut first = Simulation::from_config(&config);
        let mut second = Simulation::from_config(&config);

        assert_eq!(
            first.forecast.generate_forecast("Basic Plan", 6),
            second.forecast.generate_forecast("Basic Plan", 6)
        );
    }

    #[test]
    fn test_seeded_market_refresh_leaves_forecast_sequence_alone() {
        let config = AppConfig {
            seed: Some(21),
            ..AppConfig::default()
        };
        let mut refreshed = Simulation::from_config(&config);
        let mut untouched = Simulation::from_config(&config);

        let first = refreshed.refresh_markets().unwrap();
        let replay = Simulation::from_config(&config).refresh_markets().unwrap();
        assert_eq!(first, replay);
        assert_ne!(
            refreshed.pricing.market_state("premium-plan"),
            untouched.pricing.market_state("premium-plan")
        );
        assert_eq!(
            refreshed.forecast.generate_forecast("Basic Plan", 4),
            untouched.forecast.generate_forecast("Basic Plan", 4)
        );
    }

    #[test]
    fn test_configured_tables_replace_seed_data() {
        let config: AppConfig = serde_yaml::from_str(
            r#"
markets:
  solo-plan: { base_price: 10.0, demand: 1.0, competition: 1.0, seasonality: 1.0, elasticity: -1.0 }
"#,
        )
        .unwrap();
        let simulation = Simulation::from_config(&config);

        assert_eq!(simulation.pricing.product_ids(), vec!["solo-plan"]);
        assert_eq!(
            simulation.pricing.calculate_optimal_price("premium-plan"),
            Err(ModelError::ProductNotFound("premium-plan".to_string()))
        );
        assert_eq!(simulation.churn.customer_ids().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_uses_configured_interval() {
        let config = AppConfig {
            tick_interval_secs: 2,
            ..AppConfig::default()
        };
        let simulation = Simulation::from_config(&config);

        assert_eq!(simulation.registry().period(), Duration::from_secs(2));
    }
}
