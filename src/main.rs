mod app;
mod availability;
mod booking;
mod cli;
mod commands;
mod config;
mod event;
mod logging;
mod ui;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use booking::client::BookingClient;

#[derive(Parser, Debug)]
#[command(name = "partyslots")]
#[command(about = "Free birthday-party slots at a glance")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/partyslots/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Party size to probe for, overriding the config
  #[arg(short, long, global = true)]
  party_size: Option<u32>,

  #[command(subcommand)]
  command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
  /// Check one slot against the live backend
  Check {
    /// Day, YYYY-MM-DD
    #[arg(short, long)]
    date: String,
    /// Start time, HH:MM
    #[arg(short, long)]
    time: String,
  },
  /// Probe a range of days and print a table
  Scan {
    /// First day, YYYY-MM-DD (default: today)
    #[arg(short, long)]
    from: Option<String>,
    /// Number of days
    #[arg(short, long, default_value_t = 7)]
    days: usize,
  },
  /// List holidays between two years
  Holidays {
    /// First year (default: this year)
    #[arg(short, long)]
    from: Option<i32>,
    /// Last year (default: same as --from)
    #[arg(short, long)]
    to: Option<i32>,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Override party size if specified on command line
  if let Some(party_size) = args.party_size {
    config.availability.party_size = party_size.max(1);
  }

  let client = BookingClient::new(&config)?;

  match args.command {
    None => {
      let _guard = logging::init_file(&config.logging)?;
      let host = client.host().to_string();
      let events = event::EventHandler::new(Duration::from_millis(250));
      let app = app::App::new(config, Arc::new(client), host, events.sender());
      app.run(events).await?;
    }
    Some(command) => {
      logging::init_stderr(&config.logging)?;
      let service = Arc::new(client);
      match command {
        CliCommand::Check { date, time } => cli::check(service, &config, &date, &time).await?,
        CliCommand::Scan { from, days } => {
          cli::scan(service, &config, from.as_deref(), days).await?
        }
        CliCommand::Holidays { from, to } => cli::holidays(service, from, to).await?,
      }
    }
  }

  Ok(())
}
