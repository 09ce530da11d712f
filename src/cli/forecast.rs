use super::ui::{self, OutputFormat};
use crate::models::forecast::{ForecastModel, ForecastResult};
use anyhow::Result;
use comfy_table::Cell;
use rand::Rng;

pub fn run<R: Rng>(
    model: &mut ForecastModel<R>,
    product: Option<&str>,
    periods: usize,
    format: OutputFormat,
) -> Result<()> {
    let products = match product {
        Some(product) => vec![product.to_string()],
        None => model.products(),
    };

    let forecasts: Vec<ForecastResult> = products
        .iter()
        .map(|product| model.generate_forecast(product, periods))
        .collect();

    match format {
        OutputFormat::Json => println!("{}", ui::to_json(&forecasts)?),
        OutputFormat::Table => {
            for forecast in &forecasts {
                println!("{}\n", display_forecast(forecast));
            }
        }
    }
    Ok(())
}

pub fn display_forecast(forecast: &ForecastResult) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Period"),
        ui::header_cell("Demand"),
        ui::header_cell("Kind"),
    ]);

    let history_len = forecast.historical.len();
    for (i, value) in forecast.historical.iter().enumerate() {
        table.add_row(vec![
            Cell::new(format!("T-{}", history_len - i)),
            ui::number_cell(format!("{value:.0}")),
            Cell::new(ui::style_text("actual", ui::StyleType::Subtle)),
        ]);
    }
    for (i, value) in forecast.predicted.iter().enumerate() {
        table.add_row(vec![
            Cell::new(format!("T+{}", i + 1)),
            ui::number_cell(format!("{value:.0}")),
            Cell::new("forecast"),
        ]);
    }

    let factors = forecast
        .seasonal_factors
        .iter()
        .map(|f| format!("{} {:+.0}%", f.factor, f.impact * 100.0))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Product: {}\n\n{}\n\n{}: {:.0}%\n{}: {}",
        ui::style_text(&forecast.product, ui::StyleType::Title),
        table,
        ui::style_text("Confidence", ui::StyleType::Label),
        forecast.confidence,
        ui::style_text("Seasonal factors", ui::StyleType::Label),
        factors
    )
}
