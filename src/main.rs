//! apkhd - hyperdimensional malware classifier CLI

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // RUST_LOG wins over --log-level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(cli.workers)
        .build_global()
    {
        tracing::warn!("Could not size the worker pool: {}", e);
    }

    cli::run(cli)
}
