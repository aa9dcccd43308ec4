//! CLI argument parsing for the round-planner binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "round-planner", about = "Window-cleaning round scheduler and route optimizer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Plan visits over the horizon for one or more request files
    Schedule {
        /// Request JSON file; repeat to plan several requests concurrently
        #[arg(long = "input", short = 'i', required = true)]
        inputs: Vec<PathBuf>,
        /// Write `<stem>.schedule.json` here instead of printing to stdout
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Order a single list of stops without scheduling
    Route {
        #[arg(long, short = 'i')]
        input: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
}
