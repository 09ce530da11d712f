//! Demand forecasting from a linear trend and a quarterly seasonal index.
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Length of the repeating seasonal cycle, in periods.
pub const SEASONAL_PERIOD: usize = 4;

/// Number of trailing samples returned alongside a forecast.
const HISTORY_WINDOW: usize = 12;

/// Half-width of the uniform noise applied to each projected value.
const NOISE_AMPLITUDE: f64 = 0.025;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalFactor {
    pub factor: String,
    pub impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub product: String,
    pub historical: Vec<f64>,
    pub predicted: Vec<f64>,
    pub confidence: f64,
    pub seasonal_factors: Vec<SeasonalFactor>,
}

pub fn default_history() -> BTreeMap<String, Vec<f64>> {
    let series: [(&str, [f64; 12]); 4] = [
        (
            "Premium Plan",
            [
                1100.0, 1150.0, 1200.0, 1180.0, 1220.0, 1250.0, 1280.0, 1320.0, 1350.0, 1380.0,
                1400.0, 1420.0,
            ],
        ),
        (
            "Basic Plan",
            [
                3200.0, 3250.0, 3300.0, 3280.0, 3320.0, 3400.0, 3450.0, 3500.0, 3520.0, 3580.0,
                3600.0, 3650.0,
            ],
        ),
        (
            "Enterprise Plan",
            [
                150.0, 155.0, 160.0, 165.0, 170.0, 180.0, 185.0, 190.0, 195.0, 200.0, 205.0, 210.0,
            ],
        ),
        (
            "Starter Plan",
            [
                2200.0, 2150.0, 2100.0, 2080.0, 2050.0, 2100.0, 2080.0, 2000.0, 1980.0, 1960.0,
                1950.0, 1940.0,
            ],
        ),
    ];
    series
        .into_iter()
        .map(|(name, values)| (name.to_string(), values.to_vec()))
        .collect()
}

fn seasonal_factors() -> Vec<SeasonalFactor> {
    [
        ("Holiday Season", 0.25),
        ("Back-to-School", 0.18),
        ("Summer Slowdown", -0.15),
        ("Year-End Budget", 0.30),
    ]
    .into_iter()
    .map(|(factor, impact)| SeasonalFactor {
        factor: factor.to_string(),
        impact,
    })
    .collect()
}

/// Least-squares slope of `data` against its indices. Zero for fewer than
/// two points.
pub fn linear_trend(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let n = data.len() as f64;
    let sum_x = n * (n - 1.0) / 2.0;
    let sum_y: f64 = data.iter().sum();
    let sum_xy: f64 = data.iter().enumerate().map(|(x, y)| x as f64 * y).sum();
    let sum_x2: f64 = (0..data.len()).map(|x| (x * x) as f64).sum();

    (n * sum_xy - sum_x * sum_y) / (n * sum_x2 - sum_x * sum_x)
}

/// Multiplicative index for each phase of the seasonal cycle: the phase mean
/// over the overall mean. Phases without samples, or a zero overall mean,
/// get a neutral 1.0.
pub fn seasonal_indices(data: &[f64]) -> [f64; SEASONAL_PERIOD] {
    let mut indices = [1.0; SEASONAL_PERIOD];
    if data.is_empty() {
        return indices;
    }
    let overall = data.iter().sum::<f64>() / data.len() as f64;
    if overall == 0.0 {
        return indices;
    }

    for (phase, index) in indices.iter_mut().enumerate() {
        let values: Vec<f64> = data
            .iter()
            .skip(phase)
            .step_by(SEASONAL_PERIOD)
            .copied()
            .collect();
        if !values.is_empty() {
            let avg = values.iter().sum::<f64>() / values.len() as f64;
            *index = avg / overall;
        }
    }
    indices
}

/// Overall confidence for a forecast spanning `periods` steps.
pub fn forecast_confidence(periods: usize) -> f64 {
    (95.0 - periods as f64 * 2.0).max(75.0)
}

pub struct ForecastModel<R: Rng = StdRng> {
    history: BTreeMap<String, Vec<f64>>,
    rng: R,
}

impl ForecastModel<StdRng> {
    /// Default history, with forecast noise drawn from a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> ForecastModel<R> {
    pub fn new(rng: R) -> Self {
        Self::with_history(default_history(), rng)
    }

    pub fn with_history(history: BTreeMap<String, Vec<f64>>, rng: R) -> Self {
        Self { history, rng }
    }

    pub fn products(&self) -> Vec<String> {
        self.history.keys().cloned().collect()
    }

    pub fn history(&self, product: &str) -> Option<&[f64]> {
        self.history.get(product).map(Vec::as_slice)
    }

    /// Projects `periods` future values for `product`.
    ///
    /// A product without history is forecast from an empty series: flat at
    /// zero with neutral seasonality.
    pub fn generate_forecast(&mut self, product: &str, periods: usize) -> ForecastResult {
        let historical = self
            .history
            .get(product)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if historical.is_empty() {
            debug!(product, "No history for product, forecasting from empty series");
        }

        let trend = linear_trend(historical);
        let seasonality = seasonal_indices(historical);
        let last = historical.last().copied().unwrap_or(0.0);

        let predicted: Vec<f64> = (1..=periods)
            .map(|i| {
                let trend_component = last + trend * i as f64;
                let seasonal_component = seasonality[i % SEASONAL_PERIOD];
                let noise = self.rng.gen_range(-NOISE_AMPLITUDE..=NOISE_AMPLITUDE);
                (trend_component * seasonal_component * (1.0 + noise)).round()
            })
            .collect();

        let confidence = forecast_confidence(periods);
        let start = historical.len().saturating_sub(HISTORY_WINDOW);
        debug!(product, periods, trend, confidence, "Generated forecast");

        ForecastResult {
            product: product.to_string(),
            historical: historical[start..].to_vec(),
            predicted,
            confidence,
            seasonal_factors: seasonal_factors(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_trend() {
        assert_eq!(linear_trend(&[]), 0.0);
        assert_eq!(linear_trend(&[42.0]), 0.0);
        assert!((linear_trend(&[1.0, 2.0, 3.0, 4.0]) - 1.0).abs() < 1e-12);
        assert!((linear_trend(&[10.0, 8.0, 6.0]) + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_seasonal_indices() {
        let indices = seasonal_indices(&[1.0, 2.0, 3.0, 4.0, 1.0, 2.0, 3.0, 4.0]);
        let expected = [0.4, 0.8, 1.2, 1.6];
        for (actual, expected) in indices.iter().zip(expected) {
            assert!((actual - expected).abs() < 1e-12);
        }

        // Two samples only cover the first two phases.
        let partial = seasonal_indices(&[2.0, 6.0]);
        assert_eq!(partial, [0.5, 1.5, 1.0, 1.0]);

        assert_eq!(seasonal_indices(&[]), [1.0; SEASONAL_PERIOD]);
        assert_eq!(seasonal_indices(&[0.0, 0.0]), [1.0; SEASONAL_PERIOD]);
    }

    #[test]
    fn test_premium_plan_forecast_shape() {
        let mut model = ForecastModel::seeded(7);
        let forecast = model.generate_forecast("Premium Plan", 6);

        assert_eq!(forecast.product, "Premium Plan");
        assert_eq!(forecast.predicted.len(), 6);
        assert_eq!(forecast.confidence, 83.0);
        assert_eq!(forecast.historical.len(), 12);
        assert_eq!(forecast.historical.last(), Some(&1420.0));
        assert_eq!(forecast.seasonal_factors.len(), 4);
        assert_eq!(forecast.seasonal_factors[0].factor, "Holiday Season");
    }

    #[test]
    fn test_predictions_stay_within_noise_band() {
        let mut model = ForecastModel::seeded(11);
        let history = model.history("Basic Plan").unwrap().to_vec();
        let trend = linear_trend(&history);
        let seasonality = seasonal_indices(&history);
        let last = *history.last().unwrap();

        let forecast = model.generate_forecast("Basic Plan", 8);
        for (offset, value) in forecast.predicted.iter().enumerate() {
            let i = offset + 1;
            let base = (last + trend * i as f64) * seasonality[i % SEASONAL_PERIOD];
            let tolerance = base.abs() * NOISE_AMPLITUDE + 1.0;
            assert!(
                (value - base).abs() <= tolerance,
                "period {i}: {value} not within {tolerance} of {base}"
            );
        }
    }

    #[test]
    fn test_same_seed_gives_same_forecast() {
        let first = ForecastModel::seeded(42).generate_forecast("Starter Plan", 6);
        let second = ForecastModel::seeded(42).generate_forecast("Starter Plan", 6);
        assert_eq!(first, second);
    }

    #[test]
    fn test_confidence_decreases_with_horizon() {
        assert_eq!(forecast_confidence(0), 95.0);
        assert_eq!(forecast_confidence(6), 83.0);
        assert_eq!(forecast_confidence(10), 75.0);
        assert_eq!(forecast_confidence(24), 75.0);
    }

    #[test]
    fn test_unknown_product_forecasts_from_empty_series() {
        let mut model = ForecastModel::seeded(1);
        let forecast = model.generate_forecast("Mystery Plan", 3);

        assert!(forecast.historical.is_empty());
        assert_eq!(forecast.predicted, vec![0.0, 0.0, 0.0]);
        assert_eq!(forecast.confidence, 89.0);
    }

    #[test]
    fn test_historical_keeps_last_twelve() {
        let series: Vec<f64> = (1..=20).map(f64::from).collect();
        let history = BTreeMap::from([("Long".to_string(), series)]);
        let mut model = ForecastModel::with_history(history, StdRng::seed_from_u64(3));

        let forecast = model.generate_forecast("Long", 2);
        assert_eq!(forecast.historical.len(), 12);
        assert_eq!(forecast.historical[0], 9.0);
        assert_eq!(forecast.historical[11], 20.0);
    }
}
