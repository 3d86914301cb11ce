//! Craftbook command-line tool.
//!
//! ```bash
//! craftbook basic Flour
//! craftbook recipe Bread -i Flour=2 -i Water=1
//! craftbook stock Flour 10
//! craftbook expand Bread=3
//! craftbook craftable Bread --check 4
//! ```

mod commands;
mod config;
mod persistence;
mod report;

use std::io;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Cli;

/// Main entry point.
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "craftbook=debug" } else { "craftbook=info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    debug!("Craftbook {}", env!("CARGO_PKG_VERSION"));

    let config_path = commands::config_path(&cli);
    commands::execute(cli, &config_path, &mut io::stdout().lock())
}
