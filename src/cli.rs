use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reelplay")]
#[command(author, version, about = "Replay digital-cinema packages as timed events")]
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
    /// Replay a package and print the events it produces
    Play {
        /// Package manifest to play
        #[arg(required = true)]
        manifest: PathBuf,

        /// Seek to this many seconds before playing
        #[arg(long)]
        seek: Option<f64>,

        /// Ask for a frame-exact seek
        #[arg(long)]
        accurate: bool,

        /// Stop after this many passes
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List the reels of a package and the assets it references
    Reels {
        /// Package manifest to inspect
        #[arg(required = true)]
        manifest: PathBuf,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },
}
