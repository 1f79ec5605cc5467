use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "lectern",
    version,
    about = "Terminal scripture reader with dual-version split view.",
    long_about = None
)]
pub struct Cli {
    /// Print the recent-locations history
    #[clap(short = 'r', long)]
    pub history: bool,

    /// Dump the displayed chapter as plain text and exit
    #[clap(short, long)]
    pub dump: bool,

    /// Open a secondary version in a split pane
    #[clap(short, long, value_name = "FILE")]
    pub split: Option<PathBuf>,

    /// Jump to a reference, e.g. "John 3:16"
    #[clap(short, long, value_name = "REFERENCE")]
    pub go: Option<String>,

    /// Use a specific configuration file
    #[clap(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Primary version file (JSON)
    #[clap(name = "VERSION")]
    pub version_file: Option<PathBuf>,
}
