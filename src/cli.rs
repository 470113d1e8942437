use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mp4split")]
#[command(author, version, about = "Split fragmented MP4 files into init and media segments")]
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
    /// Split a fragmented MP4 file into segment files
    Split(SplitArgs),

    /// List the tracks and top-level boxes of a fragmented MP4 file
    Inspect {
        /// File to inspect
        #[arg(required = true)]
        input: PathBuf,

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

#[derive(Args, Debug, Default)]
pub struct SplitArgs {
    /// Fragmented MP4 file to split
    #[arg(required = true)]
    pub input: PathBuf,

    /// Directory to write segments into
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Keep only fragments of this track (repeatable; the first one starts segments)
    #[arg(long = "track-id", value_name = "ID")]
    pub track_ids: Vec<u32>,

    /// Keep the first audio track
    #[arg(long)]
    pub audio: bool,

    /// Keep the first video track
    #[arg(long)]
    pub video: bool,

    /// Only write the init segment
    #[arg(long)]
    pub init_only: bool,

    /// Init segment file name
    #[arg(long, value_name = "NAME")]
    pub init_segment: Option<String>,

    /// Media segment file name pattern ({track}, {number}, {number:04})
    #[arg(long, value_name = "PATTERN")]
    pub media_segment: Option<String>,

    /// Number of the first media segment
    #[arg(long, value_name = "N")]
    pub start_number: Option<u32>,

    /// Fail on undecodable trailing data
    #[arg(long)]
    pub strict: bool,
}
