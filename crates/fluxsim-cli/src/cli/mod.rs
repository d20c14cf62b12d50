mod commands;
mod dispatch;
mod helpers;

use clap::Parser;
use fluxsim_core::domain::FluxError;
use std::path::PathBuf;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().collect();
    match parse_and_dispatch(args) {
        Ok(code) => code,
        Err(error) => {
            let flux_error = error.as_flux_error();
            eprintln!("{}", flux_error.diagnostic_line());
            eprintln!("{}", flux_error.fatal_exit_line());
            flux_error.exit_code()
        }
    }
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "fluxsim",
    version,
    about = "Cosmic-ray flux sky maps and staged detector simulation"
)]
struct Cli {
    /// Run configuration file (JSON); defaults are used when the default file is absent
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Synthesize per-particle sky maps from the angular flux table
    Maps(commands::MapsArgs),
    /// Run the simulation stage chain for each particle
    Simulate(commands::SimulateArgs),
    /// Compute event-to-rate weights from integrated flux summaries
    Weights(commands::WeightsArgs),
    /// Write a run configuration populated with defaults
    InitConfig(commands::InitConfigArgs),
}

fn dispatch_parsed(cli: Cli) -> Result<i32, CliError> {
    let config_path = cli.config.as_deref();
    match cli.command {
        CliCommand::Maps(args) => {
            commands::run_maps_command(&helpers::load_run_config(config_path)?, args)
        }
        CliCommand::Simulate(args) => {
            commands::run_simulate_command(&helpers::load_run_config(config_path)?, args)
        }
        CliCommand::Weights(args) => {
            commands::run_weights_command(&helpers::load_run_config(config_path)?, args)
        }
        CliCommand::InitConfig(args) => commands::run_init_config_command(config_path, args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(FluxError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<FluxError> for CliError {
    fn from(error: FluxError) -> Self {
        Self::Compute(error)
    }
}

impl CliError {
    fn as_flux_error(&self) -> FluxError {
        match self {
            Self::Usage(message) => FluxError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => FluxError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
