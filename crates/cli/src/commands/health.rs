//! `premium health`

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::client::{ApiClient, HealthReport, Readiness};
use crate::output::{color_status, print_info, print_json, print_success, print_warning, OutputFormat};

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Checked")]
    checked_at: String,
}

#[derive(Serialize)]
struct HealthSummary {
    health: HealthReport,
    readiness: Readiness,
}

pub async fn health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;
    let readiness = client.readiness().await?;

    match format {
        OutputFormat::Json => print_json(&HealthSummary { health, readiness })?,
        OutputFormat::Table => {
            println!("{} {}", "Service status:".bold(), color_status(&health.status));

            if health.components.is_empty() {
                print_info("No components registered");
            } else {
                let rows: Vec<ComponentRow> = health
                    .components
                    .into_iter()
                    .map(|(name, component)| ComponentRow {
                        name,
                        status: color_status(&component.status),
                        message: component.message.unwrap_or_default(),
                        checked_at: component.checked_at,
                    })
                    .collect();
                println!("{}", Table::new(rows).with(Style::rounded()).to_string());
            }

            println!();
            if readiness.ready {
                print_success("Ready to serve predictions");
            } else {
                print_warning(&format!(
                    "Not ready: {}",
                    readiness.reason.as_deref().unwrap_or("unknown reason")
                ));
            }
        }
    }

    Ok(())
}
