//! CLI entry point for the gateware-sim binary.

use std::io;

use anyhow::Result;
use clap::Parser;
use gateware_cli::{run, Cli};
use gateware_core as _;
use serde as _;
use serde_json as _;
#[cfg(test)]
use tempfile as _;
use tracing as _;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    run(&Cli::parse(), &mut io::stdout().lock())
}
