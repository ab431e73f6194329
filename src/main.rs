//! Sitecheck CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sitecheck::cli::{Cli, CommandDispatcher};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` or `--verbose` sets level to DEBUG, `--quiet` to WARN
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(cli: &Cli) {
    let filter = if cli.debug || cli.verbose {
        EnvFilter::new("sitecheck=debug")
    } else if cli.quiet {
        EnvFilter::new("sitecheck=warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sitecheck=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    tracing::debug!("Sitecheck starting with args: {:?}", cli);

    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("sitecheck.yml"));

    let dispatcher = CommandDispatcher::new(config_path);

    match dispatcher.dispatch(&cli) {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}
