use super::ui::{self, OutputFormat};
use crate::models::churn::{ChurnModel, ChurnRisk};
use anyhow::Result;
use comfy_table::Cell;

pub fn run(model: &ChurnModel, customers: &[String], format: OutputFormat) -> Result<()> {
    let customers = if customers.is_empty() {
        model.customer_ids()
    } else {
        customers.to_vec()
    };

    let risks = model.batch_predict(&customers)?;

    match format {
        OutputFormat::Json => println!("{}", ui::to_json(&risks)?),
        OutputFormat::Table => println!("{}", display_risks(&risks)),
    }
    Ok(())
}

pub fn display_risks(risks: &[ChurnRisk]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Customer"),
        ui::header_cell("Risk"),
        ui::header_cell("Retention (%)"),
        ui::header_cell("Factors"),
        ui::header_cell("Recommended actions"),
    ]);

    for risk in risks {
        table.add_row(vec![
            Cell::new(&risk.customer_id),
            ui::risk_cell(risk.risk_score),
            ui::number_cell(risk.retention_probability.to_string()),
            ui::list_cell(&risk.factors),
            ui::list_cell(&risk.recommended_actions),
        ]);
    }

    let at_risk = risks.iter().filter(|r| r.risk_score > 70).count();
    let summary = format!("{at_risk} of {} customers at high risk", risks.len());
    let summary_style = if at_risk > 0 {
        ui::StyleType::Negative
    } else {
        ui::StyleType::Positive
    };

    format!(
        "{}\n\n{}\n\n{}",
        ui::style_text("Churn risk", ui::StyleType::Title),
        table,
        ui::style_text(&summary, summary_style)
    )
}
