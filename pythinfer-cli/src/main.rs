mod cli;
mod commands;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::error::{CliResult, EXIT_ERROR, EXIT_SUCCESS};

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    std::process::exit(match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            EXIT_ERROR
        }
    });
}

fn run(cli: &Cli) -> CliResult<i32> {
    let config = cli.config.as_deref();
    match &cli.command {
        Commands::Create { folder } => {
            commands::create::run(folder.as_deref())?;
            Ok(EXIT_SUCCESS)
        }
        Commands::Merge => {
            commands::merge::run(config, cli.no_create)?;
            Ok(EXIT_SUCCESS)
        }
        Commands::Infer => commands::infer::run(config, cli.no_create),
        Commands::Query { query } => {
            commands::query::run(config, cli.no_create, query)?;
            Ok(EXIT_SUCCESS)
        }
    }
}
