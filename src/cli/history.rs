use super::ui::{self, OutputFormat};
use crate::core::metric::ChartPoint;
use crate::stream::SharedRng;
use crate::stream::generators::{forecast_series, historical_series};
use anyhow::Result;
use comfy_table::Cell;
use std::sync::PoisonError;

pub fn run(rng: &SharedRng, periods: usize, horizon: usize, format: OutputFormat) -> Result<()> {
    let (history, forecast) = {
        let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
        let history = historical_series(&mut *rng, periods);
        let forecast = forecast_series(&mut *rng, &history, horizon);
        (history, forecast)
    };

    match format {
        OutputFormat::Json => {
            let series = serde_json::json!({ "historical": history, "forecast": forecast });
            println!("{}", ui::to_json(&series)?);
        }
        OutputFormat::Table => println!("{}", display_series(&history, &forecast)),
    }
    Ok(())
}

pub fn display_series(history: &[ChartPoint], forecast: &[ChartPoint]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Period"),
        ui::header_cell("Revenue"),
        ui::header_cell("Confidence (%)"),
    ]);

    for point in history.iter().chain(forecast) {
        table.add_row(vec![
            Cell::new(&point.label),
            ui::number_cell(format!("{:.0}", point.value)),
            ui::format_optional_cell(point.confidence, |c| format!("{c:.0}")),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Revenue history and forecast", ui::StyleType::Title),
        table
    )
}
