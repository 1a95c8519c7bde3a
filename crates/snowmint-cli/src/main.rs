//! `snowmint`: generate and decode time-ordered 64-bit IDs from the shell.

mod commands;
mod config;
mod telemetry;

use clap::Parser;
use config::{CliArgs, CliConfig, Command};
use telemetry::init_telemetry;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = CliConfig::try_from(args)?;

    init_telemetry()?;
    if cfg!(debug_assertions) {
        tracing::debug!("Starting snowmint with full config: {:#?}", config);
    }

    let mut out = commands::stdout();
    match &config.command {
        Command::Generate { count, threads } => {
            commands::generate(&config, *count, *threads, &mut out)?;
        }
        Command::Parse { ids } => commands::parse(&config, ids, &mut out)?,
        Command::MachineId => commands::machine_id(&mut out)?,
    }

    std::io::Write::flush(&mut out)?;
    Ok(())
}
