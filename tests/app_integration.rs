use pulse::cli::ui::OutputFormat;
use pulse::core::metric::{MetricPayload, MetricStream};
use pulse::stream::Handler;
use pulse::{AppCommand, Simulation};
use std::fs;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    fs::write(config_file.path(), contents).expect("Failed to write config file");
    config_file
}

#[test_log::test(tokio::test)]
async fn test_pricing_command_with_config() {
    let config_file = write_config(
        r#"
seed: 3
markets:
  team-plan:
    base_price: 49.0
    demand: 1.1
    competition: 0.95
    seasonality: 1.0
    elasticity: -1.0
"#,
    );

    let result = pulse::run_command(
        AppCommand::Pricing {
            products: vec!["team-plan".to_string()],
            refresh: false,
        },
        Some(config_file.path().to_str().unwrap()),
        OutputFormat::Table,
    )
    .await;
    assert!(result.is_ok(), "Pricing failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_pricing_refresh_with_seeded_config() {
    let config_file = write_config("seed: 12\n");

    let result = pulse::run_command(
        AppCommand::Pricing {
            products: vec![],
            refresh: true,
        },
        Some(config_file.path().to_str().unwrap()),
        OutputFormat::Json,
    )
    .await;
    assert!(result.is_ok(), "Refresh failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_unknown_customer_surfaces_not_found() {
    let config_file = write_config("seed: 1\n");

    let result = pulse::run_command(
        AppCommand::Churn {
            customers: vec!["CUST001".to_string(), "CUST404".to_string()],
        },
        Some(config_file.path().to_str().unwrap()),
        OutputFormat::Json,
    )
    .await;

    let err = result.expect_err("batch with an unknown customer should fail");
    info!(%err, "Churn batch rejected");
    assert_eq!(err.to_string(), "Customer not found: CUST404");
}

#[test_log::test(tokio::test)]
async fn test_forecast_and_history_commands() {
    let config_file = write_config("seed: 5\nforecast_periods: 3\n");
    let path = config_file.path().to_str().unwrap();

    let forecast = pulse::run_command(
        AppCommand::Forecast {
            product: Some("Premium Plan".to_string()),
            periods: None,
        },
        Some(path),
        OutputFormat::Json,
    )
    .await;
    assert!(forecast.is_ok(), "Forecast failed with: {:?}", forecast.err());

    let history = pulse::run_command(
        AppCommand::History {
            periods: 12,
            horizon: 6,
        },
        Some(path),
        OutputFormat::Table,
    )
    .await;
    assert!(history.is_ok(), "History failed with: {:?}", history.err());
}

#[test_log::test(tokio::test)]
async fn test_invalid_config_is_reported() {
    let config_file = write_config("tick_interval_secs: [not, a, number]\n");

    let result = pulse::run_command(
        AppCommand::Pricing {
            products: vec![],
            refresh: false,
        },
        Some(config_file.path().to_str().unwrap()),
        OutputFormat::Table,
    )
    .await;

    let err = result.expect_err("malformed config should fail");
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_watch_command_terminates() {
    let config_file = write_config("seed: 8\ntick_interval_secs: 1\n");

    let result = pulse::run_command(
        AppCommand::Watch {
            streams: vec![MetricStream::Customers, MetricStream::PricingPerformance],
            ticks: Some(3),
        },
        Some(config_file.path().to_str().unwrap()),
        OutputFormat::Table,
    )
    .await;
    assert!(result.is_ok(), "Watch failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_watch_rejects_zero_tick_limit() {
    let config_file = write_config("seed: 8\n");

    let result = pulse::run_command(
        AppCommand::Watch {
            streams: vec![MetricStream::Revenue],
            ticks: Some(0),
        },
        Some(config_file.path().to_str().unwrap()),
        OutputFormat::Table,
    )
    .await;
    assert!(result.is_err());
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_two_dashboards_share_one_registry() {
    let simulation = Simulation::default();
    let registry = simulation.registry();
    let first_seen = Arc::new(Mutex::new(0usize));
    let second_seen = Arc::new(Mutex::new(0usize));

    let make_handler = |seen: Arc<Mutex<usize>>| -> Handler<MetricPayload> {
        Arc::new(move |payload: &MetricPayload| {
            assert!(matches!(payload, MetricPayload::Sample(_)));
            *seen.lock().unwrap() += 1;
            Ok(())
        })
    };
    let first = make_handler(Arc::clone(&first_seen));
    let second = make_handler(Arc::clone(&second_seen));

    registry
        .subscribe(MetricStream::Revenue, Arc::clone(&first))
        .unwrap();
    registry
        .subscribe(MetricStream::Revenue, Arc::clone(&second))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5_001)).await;

    assert_eq!(*first_seen.lock().unwrap(), 2);
    assert_eq!(*second_seen.lock().unwrap(), 1);

    registry.unsubscribe(&MetricStream::Revenue, &first);
    assert!(registry.is_active(&MetricStream::Revenue));
    registry.unsubscribe(&MetricStream::Revenue, &second);
    assert!(!registry.is_active(&MetricStream::Revenue));

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(*first_seen.lock().unwrap(), 2);
    assert_eq!(*second_seen.lock().unwrap(), 1);
}
