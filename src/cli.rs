use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ffplan")]
#[command(about = "Compile encode jobs into FFmpeg invocation plans", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile one job file and print its plans
    Plan {
        /// Path to a .toml or .json job file
        job: PathBuf,

        /// Print plans as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compile every job file under a directory
    Batch {
        /// Directory to scan (defaults to current directory)
        directory: Option<PathBuf>,

        /// Print reports as JSON
        #[arg(long)]
        json: bool,

        /// Worker threads (overrides config)
        #[arg(long)]
        workers: Option<u32>,
    },

    /// Show config status and location, or create default config if missing
    InitConfig,
}

pub fn parse() -> Cli {
    Cli::parse()
}
