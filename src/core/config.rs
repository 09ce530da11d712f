use crate::models::churn::{CustomerFeatures, default_customers};
use crate::models::forecast::default_history;
use crate::models::pricing::{MarketState, default_markets};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

fn default_tick_interval_secs() -> u64 {
    5
}

fn default_forecast_periods() -> usize {
    6
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Seconds between two samples of a metric stream.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// Fixed RNG seed; fresh entropy is used when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_forecast_periods")]
    pub forecast_periods: usize,
    #[serde(default = "default_markets")]
    pub markets: BTreeMap<String, MarketState>,
    #[serde(default = "default_history")]
    pub history: BTreeMap<String, Vec<f64>>,
    #[serde(default = "default_customers")]
    pub customers: BTreeMap<String, CustomerFeatures>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            tick_interval_secs: default_tick_interval_secs(),
            seed: None,
            forecast_periods: default_forecast_periods(),
            markets: default_markets(),
            history: default_history(),
            customers: default_customers(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "pulse", "pulse")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.tick_interval_secs == 0 {
            anyhow::bail!("tick_interval_secs must be greater than zero");
        }
        if let Some((id, _)) = self.markets.iter().find(|(_, m)| m.base_price <= 0.0) {
            anyhow::bail!("Market {id} must have a positive base_price");
        }
        if let Some((id, _)) = self.customers.iter().find(|(_, c)| !c.is_valid()) {
            anyhow::bail!("Customer {id} must have usage and engagement between 0 and 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
tick_interval_secs: 2
seed: 42
forecast_periods: 8
markets:
  solo-plan:
    base_price: 19.0
    demand: 1.1
    competition: 0.85
    seasonality: 1.0
    elasticity: -1.0
history:
  Solo Plan: [10, 12, 14, 15]
customers:
  ACME:
    usage: 0.4
    support_tickets: 4
    contract_days: 20
    engagement: 0.3
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.tick_interval(), Duration::from_secs(2));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.forecast_periods, 8);
        assert_eq!(config.markets.len(), 1);
        assert_eq!(config.markets["solo-plan"].base_price, 19.0);
        assert_eq!(config.history["Solo Plan"], vec![10.0, 12.0, 14.0, 15.0]);
        assert_eq!(config.customers["ACME"].support_tickets, 4);
    }

    #[test]
    fn test_omitted_fields_use_builtin_tables() {
        let config: AppConfig = serde_yaml::from_str("seed: 7\n").unwrap();

        assert_eq!(config.tick_interval_secs, 5);
        assert_eq!(config.forecast_periods, 6);
        assert_eq!(config.markets.len(), 3);
        assert!(config.markets.contains_key("premium-plan"));
        assert_eq!(config.history.len(), 4);
        assert_eq!(config.customers.len(), 5);
    }

    #[test]
    fn test_load_from_path_rejects_zero_interval() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tick_interval_secs: 0").unwrap();

        let err = AppConfig::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("tick_interval_secs"));
    }

    #[test]
    fn test_load_from_path_rejects_out_of_range_customer() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "customers:\n  ACME: {{ usage: 1.4, support_tickets: 0, contract_days: 90, engagement: 0.5 }}"
        )
        .unwrap();

        let err = AppConfig::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("Customer ACME"));
    }

    #[test]
    fn test_load_from_missing_path_fails_with_context() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("absent.yaml");

        let err = AppConfig::load_from_path(&missing).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
