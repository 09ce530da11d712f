use super::ui::{self, OutputFormat};
use crate::core::metric::{MetricPayload, MetricStream};
use crate::stream::{DashboardRegistry, Handler};
use anyhow::{Context, Result, anyhow, ensure};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Subscribes to `streams` and prints every sample until each stream has
/// delivered `ticks` samples, or until Ctrl-C when `ticks` is `None`.
/// Repeated streams are watched once.
pub async fn run(
    registry: &DashboardRegistry,
    streams: &[MetricStream],
    ticks: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    ensure!(ticks != Some(0), "Tick limit must be at least 1");

    let streams: BTreeSet<MetricStream> = if streams.is_empty() {
        MetricStream::ALL.into_iter().collect()
    } else {
        streams.iter().copied().collect()
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut handlers: HashMap<MetricStream, Handler<MetricPayload>> = HashMap::new();
    for stream in &streams {
        let stream = *stream;
        let tx = tx.clone();
        let handler: Handler<MetricPayload> = Arc::new(move |payload: &MetricPayload| {
            tx.send((stream, payload.clone()))
                .map_err(|_| anyhow!("Watch output closed"))
        });
        handlers.insert(stream, Arc::clone(&handler));
        registry
            .subscribe(stream, handler)
            .with_context(|| format!("Failed to subscribe to {stream}"))?;
    }
    drop(tx);
    info!(?streams, period = ?registry.period(), "Watching metric streams");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut seen: HashMap<MetricStream, usize> = HashMap::new();
    loop {
        let next = tokio::select! {
            next = rx.recv() => next,
            _ = &mut shutdown => None,
        };
        let Some((stream, payload)) = next else {
            break;
        };

        match format {
            OutputFormat::Json => {
                let line = serde_json::json!({ "stream": stream, "payload": payload });
                println!("{line}");
            }
            OutputFormat::Table => println!("{}", format_payload(stream, &payload)),
        }

        let count = seen.entry(stream).or_insert(0);
        *count += 1;
        if ticks.is_some_and(|limit| *count >= limit) {
            if let Some(handler) = handlers.remove(&stream) {
                registry.unsubscribe(&stream, &handler);
            }
            if handlers.is_empty() {
                break;
            }
        }
    }

    for (stream, handler) in handlers {
        registry.unsubscribe(&stream, &handler);
    }
    Ok(())
}

/// One-line rendering of a stream sample.
pub fn format_payload(stream: MetricStream, payload: &MetricPayload) -> String {
    let label = ui::style_text(&format!("{stream:<18}"), ui::StyleType::Label);
    let body = match payload {
        MetricPayload::Sample(sample) => {
            let change = format!("{:+}", sample.change);
            let change_style = if sample.change >= 0.0 {
                ui::StyleType::Positive
            } else {
                ui::StyleType::Negative
            };
            let time = sample.timestamp.format("%H:%M:%S").to_string();
            format!(
                "{} {} ({})",
                ui::style_text(&time, ui::StyleType::Subtle),
                sample.value,
                ui::style_text(&change, change_style)
            )
        }
        MetricPayload::Chart(points) => points
            .iter()
            .map(|p| match p.predicted {
                Some(predicted) => format!("{}={} (next {predicted})", p.label, p.value),
                None => format!("{}={}", p.label, p.value),
            })
            .collect::<Vec<_>>()
            .join(", "),
        MetricPayload::Performance(perf) => format!(
            "revenue +{}% conversion {}% optimization +{}%",
            perf.revenue, perf.conversion, perf.optimization
        ),
    };
    format!("{label} {body}")
}
