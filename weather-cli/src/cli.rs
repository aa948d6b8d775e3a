use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use weatherstack_core::{Config, LookupState, Session, Tab, service_from_config};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherstack", version, about = "Weatherstack lookups that survive blocked plain-HTTP")]
pub struct Cli {
    /// Log fetch attempts and relay fallbacks.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the Weatherstack access key.
    Configure,

    /// Current conditions for a city.
    Current {
        /// City or place name.
        city: String,
    },

    /// Conditions for a city on a past date.
    Historical {
        city: String,

        /// Date as YYYY-MM-DD, today or earlier.
        #[arg(long)]
        date: NaiveDate,
    },

    /// Marine forecast (swell, water temperature, tides) near a city.
    Marine {
        city: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Current { city } => {
                let session = search(&city).await?;
                outcome(session.current(), render::current)
            }
            Command::Historical { city, date } => {
                let mut session = search(&city).await?;
                session.select_tab(Tab::Historical).await;
                session.lookup_historical(date).await;
                outcome(session.historical(), render::historical)
            }
            Command::Marine { city } => {
                let mut session = search(&city).await?;
                session.select_tab(Tab::Marine).await;
                outcome(session.marine(), render::marine)
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let key = Password::new("Weatherstack access key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Find it on your Weatherstack dashboard")
        .prompt()
        .context("Failed to read access key")?;

    if key.trim().is_empty() {
        bail!("Access key must not be empty");
    }

    config.set_access_key(key.trim().to_string());
    let path = config.save()?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}

/// Runs the search every other command starts from.
async fn search(city: &str) -> anyhow::Result<Session> {
    let config = Config::load()?;
    let service = service_from_config(&config)?;

    let mut session = Session::new(service);
    session.search(city).await;

    if let Some(msg) = session.current().error() {
        bail!("{msg}");
    }
    if let Some(location) = session.location() {
        tracing::info!(location = %location.display_name(), "resolved location");
    }

    Ok(session)
}

fn outcome<T>(state: &LookupState<T>, show: impl Fn(&T)) -> anyhow::Result<()> {
    match state {
        LookupState::Success(payload) => {
            show(payload);
            Ok(())
        }
        LookupState::Failed(msg) => bail!("{msg}"),
        LookupState::Idle | LookupState::Loading => bail!("Lookup did not complete"),
    }
}
