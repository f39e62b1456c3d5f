//! Scoutpost CLI -- container host management and image vulnerability reports
//!
//! Loads `scoutpost.toml` (falling back to defaults when the file does not
//! exist), initializes logging on stderr and dispatches to one handler per
//! subcommand. Reports are written to stdout as text or JSON.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use colored::Colorize;
use tracing::debug;

use scoutpost_core::config::GeneralConfig;

use cli::{Cli, Commands};
use error::CliError;
use output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("{} {err}", "error:".red().bold());
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);

    match cli.command {
        // `config` reports problems in the file itself, so it must not
        // require a loadable configuration to start.
        Commands::Config(args) => {
            let mut general = GeneralConfig::default();
            if let Some(level) = cli.log_level {
                general.log_level = level;
            }
            init_logging(&general)?;
            commands::config::execute(args, &cli.config, &writer).await
        }
        command => {
            let loaded = commands::load_config(&cli.config).await?;
            let mut config = loaded.config;
            if let Some(level) = cli.log_level {
                config.general.log_level = level;
                config.validate()?;
            }
            init_logging(&config.general)?;
            debug!(
                path = %cli.config.display(),
                from_file = loaded.from_file,
                "configuration loaded"
            );

            match command {
                Commands::Scan(args) => commands::scan::execute_scan(args, &config, &writer).await,
                Commands::Report(args) => {
                    commands::scan::execute_report(args, &config, &writer).await
                }
                Commands::Recommendations(args) => {
                    commands::scan::execute_recommendations(args, &config, &writer).await
                }
                Commands::Status => commands::status::execute(&config, &writer).await,
                Commands::Containers(args) => {
                    commands::containers::execute(args, &config, &writer).await
                }
                Commands::Images(args) => commands::images::execute(args, &config, &writer).await,
                Commands::Networks => commands::networks::execute(&config, &writer).await,
                Commands::Volumes => commands::volumes::execute(&config, &writer).await,
                Commands::Config(_) => unreachable!(),
            }
        }
    }
}

fn init_logging(general: &GeneralConfig) -> Result<(), CliError> {
    logging::init_tracing(general).map_err(|e| CliError::Config(e.to_string()))
}
