mod cli;
mod commands;
mod envelope;
mod error;
mod output;
mod session;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("error: {error}");
        std::process::exit(error.exit_code());
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Command::Reports(args) = &cli.command {
        if args.follow {
            return commands::follow_reports(&cli, args).await;
        }
    }

    let envelope = commands::run(&cli).await?;
    output::render(&envelope, cli.format, cli.pretty)
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
