//! lakeops CLI entry point.
//!
//! Handles argument parsing, logging setup and error display; everything
//! else lives in the library crate.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use lakeops::cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.execute() {
        Ok(()) => Ok(()),
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            std::process::exit(1);
        }
    }
}
