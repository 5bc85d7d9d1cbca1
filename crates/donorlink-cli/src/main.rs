//! Donorlink CLI - Command-line interface
//!
//! This is the command-line adapter over the donorlink matching pipeline.

mod cli;
mod commands;
mod config_loader;
mod dry_run;
mod errors;
mod interactive;
mod output;
mod output_types;
mod progress;

use clap::Parser;
use cli::Cli;
use output::OutputWriter;

fn main() {
    // Logs go to stderr; keep them quiet by default so tables and JSON stay clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let output = OutputWriter::new(cli.json);

    if let Err(error) = commands::execute(cli, &output) {
        let cli_error = errors::from_anyhow(error);
        if output.is_json() {
            output.error(&cli_error);
        } else {
            cli_error.display();
        }
        std::process::exit(1);
    }
}
