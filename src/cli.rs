use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use wavtrim_media::ChunkId;

#[derive(Parser)]
#[command(name = "wavtrim")]
#[command(author, version, about = "Cut time ranges out of WAV files")]
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
    /// Cut the part between start and end out of a WAV file
    Trim {
        /// Input WAV file, - for standard input
        #[arg(short, long, required = true)]
        input: PathBuf,

        /// Output WAV file, - or omitted for standard output
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Start of the range in seconds (default: beginning)
        #[arg(long, value_parser = parse_seconds)]
        start: Option<Duration>,

        /// End of the range in seconds (default: end of file)
        #[arg(long, value_parser = parse_seconds)]
        end: Option<Duration>,
    },

    /// Show format, duration and INFO tags of a WAV file
    Info {
        /// File to inspect
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Append an INFO tag to a WAV file in place
    Tag {
        /// File to modify
        file: PathBuf,

        /// Four-character tag, e.g. INAM or IENG
        tag: ChunkId,

        /// Tag text
        text: String,
    },
}

/// Parse a non-negative number of seconds such as `3` or `2.5`.
fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .parse()
        .map_err(|_| format!("`{}` is not a number of seconds", s))?;
    Duration::try_from_secs_f64(secs)
        .map_err(|_| format!("`{}` is not a valid non-negative duration", s))
}
