//! Insurance Premium Predictor CLI
//!
//! Submits a profile to the prediction server and checks its health.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use client::PredictRequest;
use commands::{health, predict};

/// Insurance Premium Predictor CLI
#[derive(Parser)]
#[command(name = "premium")]
#[command(author, version, about = "CLI for the Insurance Premium Predictor", long_about = None)]
pub struct Cli {
    /// Server URL (can also be set via PREMIUM_API_URL env var)
    #[arg(long, env = "PREMIUM_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict an annual premium and get advice
    Predict(ProfileArgs),

    /// Show server health and readiness
    Health,
}

/// Values are sent as typed; the server validates them
#[derive(Args)]
pub struct ProfileArgs {
    /// Age in years
    #[arg(long)]
    pub age: String,

    /// "female" or "male"
    #[arg(long)]
    pub sex: String,

    /// Body mass index
    #[arg(long)]
    pub bmi: String,

    /// Number of dependent children
    #[arg(long)]
    pub children: String,

    /// "yes" or "no"
    #[arg(long)]
    pub smoker: String,

    /// SouthWest, SouthEast, NorthWest or NorthEast
    #[arg(long)]
    pub region: String,
}

impl From<ProfileArgs> for PredictRequest {
    fn from(args: ProfileArgs) -> Self {
        PredictRequest {
            age: args.age,
            sex: args.sex,
            bmi: args.bmi,
            children: args.children,
            smoker: args.smoker,
            region: args.region,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let api_url = config::Config::load()?.resolve_api_url(cli.api_url);
    let client = client::ApiClient::new(&api_url)?;

    match cli.command {
        Commands::Predict(args) => predict::predict(&client, args.into(), cli.format).await?,
        Commands::Health => health::health(&client, cli.format).await?,
    }

    Ok(())
}
