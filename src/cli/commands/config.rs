//! Config command - print the effective controller configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::cli::commands::train::resolve_config;

#[derive(Parser, Debug)]
#[command(about = "Print the effective configuration as JSON")]
pub struct ConfigArgs {
    /// JSON configuration file to merge over the defaults
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

pub fn execute(args: ConfigArgs) -> Result<()> {
    let config = resolve_config(args.config.as_deref())?;
    config.validate().context("configuration is invalid")?;
    println!("{}", config.to_json_pretty()?);
    Ok(())
}
