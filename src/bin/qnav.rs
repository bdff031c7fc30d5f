//! qnav CLI - train a tabular Q-learning navigation controller headless
//!
//! The controller is normally driven by a render loop; this binary plays
//! that role so runs can be reproduced and summarised from a terminal.

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "qnav")]
#[command(version, about = "Tabular Q-learning point-mass navigation", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the controller for a number of ticks
    Train(Box<qnav::cli::commands::train::TrainArgs>),

    /// Print the effective configuration
    Config(qnav::cli::commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Train(args) => qnav::cli::commands::train::execute(*args),
        Commands::Config(args) => qnav::cli::commands::config::execute(args),
    }
}
