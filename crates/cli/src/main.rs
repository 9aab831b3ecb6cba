//! Heal CLI
//!
//! A command-line client for the Heal backend: next-period predictions,
//! landing summaries and server status.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{landing, predict, status};

const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Heal CLI
#[derive(Parser)]
#[command(name = "heal")]
#[command(author, version, about = "CLI for the Heal backend", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via HEAL_API_URL env var)
    #[arg(long, env = "HEAL_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict the next period start date for a screening
    Predict {
        /// User ID
        #[arg(long, short)]
        user: String,

        /// Screening ID
        #[arg(long, short)]
        screening: String,
    },

    /// Show the landing page summary for a user
    Landing {
        /// User ID
        #[arg(long, short)]
        user: String,
    },

    /// Show server health and readiness
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;

    // Flags and environment win over the config file
    let api_url = cli
        .api_url
        .or(config.api_url)
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let format = cli
        .format
        .or(config.default_format)
        .unwrap_or_default();

    let client = client::ApiClient::new(&api_url)?;

    match cli.command {
        Commands::Predict { user, screening } => {
            predict::predict_period(&client, &user, &screening, format).await?;
        }
        Commands::Landing { user } => {
            landing::show_landing(&client, &user, format).await?;
        }
        Commands::Status => {
            status::show_status(&client, format).await?;
        }
    }

    Ok(())
}
