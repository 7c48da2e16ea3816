use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "animatch")]
#[command(author, version, about = "Resolve local anime files to Bangumi episodes")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a single file to a catalogue episode
    Resolve {
        /// Media file to resolve
        #[arg(required = true)]
        file: PathBuf,

        /// Bangumi subject id of the series
        #[arg(short, long)]
        subject: Option<u64>,

        /// Bangumi subject id of the season
        #[arg(long)]
        season_subject: Option<u64>,

        /// Episode index already known for the file
        #[arg(short, long)]
        index: Option<f64>,

        /// Episode id from a previous resolution
        #[arg(long)]
        episode_id: Option<u64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve every video file under a directory
    Scan {
        /// Directory to walk
        #[arg(required = true)]
        dir: PathBuf,

        /// Bangumi subject id of the series
        #[arg(short, long)]
        subject: Option<u64>,

        /// Number of files resolved concurrently
        #[arg(long, default_value = "4")]
        concurrency: usize,

        /// Output as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Show the type, index and tokens read from a file name (no network)
    Classify {
        /// File name or path to classify
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
