#![allow(unused_crate_dependencies)] // false positives because there is both a library and a binary

#[macro_use]
extern crate tracing;

use anyhow::Context as _;
use clap::Parser as _;
use cobolt_cli::config::{Cli, RunConfig};
use cobolt_cli::run::run;
use cobolt_core::CancelFlag;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = RunConfig::resolve(cli).context("configuration")?;

    setup_logging(config.log_file.as_deref()).context("unable to initialize logging")?;

    info!(version = env!("CARGO_PKG_VERSION"), "starting cobolt");

    let cancel = CancelFlag::new();

    match run(&config, &cancel) {
        Ok(_) => {
            info!("run completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("run failed: {e:#}");
            Err(e)
        }
    }
}

fn setup_logging(log_file: Option<&std::path::Path>) -> anyhow::Result<()> {
    use std::fs::OpenOptions;

    use tracing::metadata::LevelFilter;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("COBOLT_LOG")
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr);

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("couldn't open {}", path.display()))?;
            Some(tracing_subscriber::fmt::layer().compact().with_ansi(false).with_writer(file))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
