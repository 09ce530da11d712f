//! Sample generators for the dashboard metric streams.
//!
//! Every generator draws from a shared, seedable RNG so a fixed seed replays
//! the same sequence of samples.

use super::registry::{Generator, StreamRegistry};
use crate::core::metric::{
    ChartPoint, MetricPayload, MetricSample, MetricStream, PricingPerformance,
};
use crate::models::forecast::linear_trend;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

pub type SharedRng = Arc<Mutex<StdRng>>;

pub type DashboardRegistry = StreamRegistry<MetricStream, MetricPayload>;

const DEMAND_PRODUCTS: [(&str, f64); 4] = [
    ("Premium Plan", 1420.0),
    ("Basic Plan", 3650.0),
    ("Enterprise Plan", 210.0),
    ("Starter Plan", 1950.0),
];

/// Builds the RNG shared by the generators, from `seed` when given and from
/// OS entropy otherwise.
pub fn shared_rng(seed: Option<u64>) -> SharedRng {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Arc::new(Mutex::new(rng))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Uniform draw centred on zero, in [-0.5, 0.5).
fn centred<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(-0.5..0.5)
}

fn unit<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(0.0..1.0)
}

pub fn revenue<R: Rng + ?Sized>(rng: &mut R) -> MetricSample {
    let base = 12_400_000.0;
    let value = (base * (1.0 + centred(rng) * 0.02)).round();
    // Slight positive bias on the reported change.
    let change = (unit(rng) - 0.3) * 0.3;
    MetricSample {
        timestamp: Utc::now(),
        value,
        change: round_to(change, 3),
    }
}

pub fn customers<R: Rng + ?Sized>(rng: &mut R) -> MetricSample {
    let base = 48_392.0;
    let value = (base * (1.0 + centred(rng) * 0.01)).round();
    let change = (unit(rng) - 0.2) * 0.15;
    MetricSample {
        timestamp: Utc::now(),
        value,
        change: round_to(change, 3),
    }
}

pub fn churn_rate<R: Rng + ?Sized>(rng: &mut R) -> MetricSample {
    let value = (3.2 + centred(rng) * 0.1).max(0.0);
    let change = (unit(rng) - 0.6) * 0.2;
    MetricSample {
        timestamp: Utc::now(),
        value: round_to(value, 1),
        change: round_to(change, 1),
    }
}

pub fn ai_accuracy<R: Rng + ?Sized>(rng: &mut R) -> MetricSample {
    let value = (94.7 + centred(rng) * 0.5).clamp(85.0, 99.9);
    let change = (unit(rng) - 0.3) * 0.05;
    MetricSample {
        timestamp: Utc::now(),
        value: round_to(value, 1),
        change: round_to(change, 1),
    }
}

pub fn demand_trend<R: Rng + ?Sized>(rng: &mut R) -> Vec<ChartPoint> {
    DEMAND_PRODUCTS
        .iter()
        .map(|(product, base)| {
            let value = (base * (1.0 + centred(rng) * 0.1)).round();
            let predicted = (value * (1.0 + (unit(rng) - 0.3) * 0.2)).round();
            ChartPoint {
                label: product.to_string(),
                value,
                predicted: Some(predicted),
                confidence: Some((85.0 + unit(rng) * 10.0).round()),
            }
        })
        .collect()
}

pub fn pricing_performance<R: Rng + ?Sized>(rng: &mut R) -> PricingPerformance {
    PricingPerformance {
        revenue: round_to(20.0 + unit(rng) * 10.0, 1),
        conversion: round_to(85.0 + unit(rng) * 10.0, 1),
        optimization: round_to(10.0 + unit(rng) * 15.0, 1),
    }
}

/// Monthly revenue history with an upward trend, one sine seasonal cycle
/// over the window and some noise.
pub fn historical_series<R: Rng + ?Sized>(rng: &mut R, periods: usize) -> Vec<ChartPoint> {
    let base = 1_000_000.0;
    (0..periods)
        .map(|i| {
            let trend = i as f64 * 50_000.0;
            let seasonal = ((i as f64 / periods as f64) * 2.0 * PI).sin() * 100_000.0;
            let noise = centred(rng) * 50_000.0;
            let value = (base + trend + seasonal + noise).round();
            ChartPoint::new(format!("Month {}", i + 1), value)
        })
        .collect()
}

/// Extends `historical` by `periods` trend-following points whose confidence
/// drops three points per step, down to 70.
pub fn forecast_series<R: Rng + ?Sized>(
    rng: &mut R,
    historical: &[ChartPoint],
    periods: usize,
) -> Vec<ChartPoint> {
    let values: Vec<f64> = historical.iter().map(|p| p.value).collect();
    let last = values.last().copied().unwrap_or(0.0);
    let trend = linear_trend(&values);

    (1..=periods)
        .map(|i| {
            let trend_value = last + trend * i as f64;
            let variation = centred(rng) * 0.1 * trend_value;
            ChartPoint {
                label: format!("Forecast {i}"),
                value: (trend_value + variation).round(),
                predicted: None,
                confidence: Some((95.0 - i as f64 * 3.0).max(70.0)),
            }
        })
        .collect()
}

fn generator_for(stream: MetricStream, rng: SharedRng) -> Generator<MetricPayload> {
    Arc::new(move || {
        let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
        let rng = &mut *rng;
        match stream {
            MetricStream::Revenue => MetricPayload::Sample(revenue(rng)),
            MetricStream::Customers => MetricPayload::Sample(customers(rng)),
            MetricStream::ChurnRate => MetricPayload::Sample(churn_rate(rng)),
            MetricStream::AiAccuracy => MetricPayload::Sample(ai_accuracy(rng)),
            MetricStream::DemandTrend => MetricPayload::Chart(demand_trend(rng)),
            MetricStream::PricingPerformance => {
                MetricPayload::Performance(pricing_performance(rng))
            }
        }
    })
}

pub fn dashboard_generators(rng: &SharedRng) -> HashMap<MetricStream, Generator<MetricPayload>> {
    MetricStream::ALL
        .into_iter()
        .map(|stream| (stream, generator_for(stream, Arc::clone(rng))))
        .collect()
}

/// Registry serving all six dashboard streams.
pub fn dashboard_registry(period: Duration, rng: &SharedRng) -> DashboardRegistry {
    StreamRegistry::new(period, dashboard_generators(rng))
}
