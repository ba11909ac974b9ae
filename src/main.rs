//! svgpack - package a web application into a single SVG document.

mod bundle;
mod cli;
mod collect;
mod compose;
mod config;
mod embed;
mod error;
mod logger;
mod manifest;
mod pipeline;
mod serve;
mod validate;

use std::sync::Arc;

use anyhow::{Result, bail};
use clap::{ColorChoice, Parser};

use cli::{Cli, Commands};
use config::PackConfig;
use pipeline::BuildCaches;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = PackConfig::load(&cli)?;

    match &cli.command {
        Commands::Build { .. } => build_once(&config),
        Commands::Serve { .. } => serve::run(Arc::new(config)),
    }
}

/// Run one packaging pass and report the outcome.
fn build_once(config: &PackConfig) -> Result<()> {
    let result = pipeline::build(config, &BuildCaches::default())?;

    for issue in &result.issues {
        log!("build"; "{issue}");
    }
    log!(
        "build";
        "{} -> {} bytes in {:.0?}",
        config.output_path().display(),
        result.byte_size,
        result.duration
    );

    if !result.success {
        let errors = result.issues.iter().filter(|i| i.is_error()).count();
        bail!("build failed with {errors} error(s)");
    }
    Ok(())
}
