use super::ui::{self, OutputFormat};
use crate::models::pricing::{PricingModel, PricingRecommendation};
use anyhow::Result;
use comfy_table::Cell;
use rand::rngs::StdRng;
use tracing::info;

/// Prints recommendations for `products`. With `refresh`, market conditions
/// are first redrawn from the given RNG.
pub fn run(
    model: &mut PricingModel,
    products: &[String],
    refresh: Option<&mut StdRng>,
    format: OutputFormat,
) -> Result<()> {
    if let Some(rng) = refresh {
        model.simulate_market_shift(rng)?;
        info!("Refreshed market conditions");
    }

    let products = if products.is_empty() {
        model.product_ids()
    } else {
        products.to_vec()
    };

    let recommendations = products
        .iter()
        .map(|id| model.calculate_optimal_price(id))
        .collect::<Result<Vec<_>, _>>()?;

    match format {
        OutputFormat::Json => println!("{}", ui::to_json(&recommendations)?),
        OutputFormat::Table => println!("{}", display_recommendations(&recommendations)),
    }
    Ok(())
}

pub fn display_recommendations(recommendations: &[PricingRecommendation]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Product"),
        ui::header_cell("Current"),
        ui::header_cell("Recommended"),
        ui::header_cell("Confidence (%)"),
        ui::header_cell("Impact / month"),
        ui::header_cell("Factors"),
    ]);

    for rec in recommendations {
        table.add_row(vec![
            Cell::new(&rec.product_id),
            ui::number_cell(format!("{:.2}", rec.current_price)),
            ui::signed_cell(
                format!("{:.2}", rec.recommended_price),
                rec.recommended_price - rec.current_price,
            ),
            ui::number_cell(format!("{:.1}", rec.confidence)),
            ui::signed_cell(format!("{:+.0}", rec.expected_impact), rec.expected_impact),
            ui::list_cell(&rec.factors),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Pricing recommendations", ui::StyleType::Title),
        table
    )
}
