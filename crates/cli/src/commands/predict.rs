//! `premium predict`

use anyhow::Result;
use colored::Colorize;

use crate::client::{ApiClient, PredictRequest};
use crate::output::{color_status, format_cost, print_json, print_warning, wrap, OutputFormat};

const ADVICE_WIDTH: usize = 72;

pub async fn predict(client: &ApiClient, request: PredictRequest, format: OutputFormat) -> Result<()> {
    let outcome = client.predict(&request).await?;

    match format {
        OutputFormat::Json => print_json(&outcome)?,
        OutputFormat::Table => {
            println!("{}", "Insurance Premium Estimate".bold());
            println!("{}", "=".repeat(50));
            println!(
                "Predicted Insurance Cost: {}",
                format_cost(outcome.predicted_cost).green().bold()
            );
            println!("Model:                    {}", outcome.model_version.cyan());
            println!();

            println!("{} ({})", "Advice".bold(), color_status(&outcome.advice_source));
            println!("{}", "-".repeat(50));
            for line in wrap(&outcome.advice_text, ADVICE_WIDTH) {
                println!("{}", line);
            }

            if outcome.advice_source == "fallback" {
                println!();
                print_warning("Generated advice was unavailable; showing rule-based guidance");
            }
        }
    }

    Ok(())
}
