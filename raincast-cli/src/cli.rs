use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use inquire::{DateSelect, Text};
use raincast_core::{ApiClient, Config};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "raincast", version, about = "Raincast prediction CLI")]
pub struct Cli {
    /// Base URL of the prediction service; overrides API_BASE and the saved config.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Save the prediction service base URL.
    Configure,

    /// Check that the service is up.
    Health,

    /// Predict whether it will rain exactly seven days after a date.
    Rain {
        /// Input date, YYYY-MM-DD; prompts interactively if absent.
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Predict the 3-day precipitation sum following a date.
    Precipitation {
        /// Input date, YYYY-MM-DD; prompts interactively if absent.
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Run both predictions for the same date.
    Both {
        /// Input date, YYYY-MM-DD; prompts interactively if absent.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config),
            Command::Health => {
                let client = client_from(&config, self.base_url.as_deref())?;
                let status = client.health().await?;
                print_json("Health", &status)
            }
            Command::Rain { date } => {
                let client = client_from(&config, self.base_url.as_deref())?;
                let date = pick_date(date)?;
                let response = client.rain(date).await?;
                print_json("Rain (+7d)", &serde_json::to_value(&response)?)
            }
            Command::Precipitation { date } => {
                let client = client_from(&config, self.base_url.as_deref())?;
                let date = pick_date(date)?;
                let response = client.precipitation(date).await?;
                print_json("3-day precipitation", &serde_json::to_value(&response)?)
            }
            Command::Both { date } => {
                let client = client_from(&config, self.base_url.as_deref())?;
                let date = pick_date(date)?;

                let rain = client.rain(date).await?;
                print_json("Rain (+7d)", &serde_json::to_value(&rain)?)?;

                let precip = client.precipitation(date).await?;
                print_json("3-day precipitation", &serde_json::to_value(&precip)?)
            }
        }
    }
}

fn client_from(config: &Config, flag: Option<&str>) -> Result<ApiClient> {
    ApiClient::new(config.resolve_api_base(flag))
}

/// Interactive date picker fallback for commands invoked without `--date`.
fn pick_date(date: Option<NaiveDate>) -> Result<NaiveDate> {
    match date {
        Some(date) => Ok(date),
        None => {
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
            DateSelect::new("Date")
                .with_starting_date(start)
                .prompt()
                .context("No date selected")
        }
    }
}

fn configure(mut config: Config) -> Result<()> {
    let current = config.resolve_api_base(None);

    let base = Text::new("Prediction service base URL:")
        .with_initial_value(&current)
        .prompt()
        .context("Configuration cancelled")?;

    config.set_api_base(base.trim().to_string());
    config.save()?;

    println!("Saved base URL to {}", Config::config_file_path()?.display());
    Ok(())
}

fn print_json(heading: &str, value: &serde_json::Value) -> Result<()> {
    println!("{heading}");
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
