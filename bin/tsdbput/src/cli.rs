use std::path::PathBuf;

use clap::Parser;

/// Encodes JSON records as OpenTSDB `put` lines.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Cli {
    /// Path to a YAML or JSON configuration file.
    ///
    /// Settings can also be given as `TSDBPUT_`-prefixed environment variables, which take precedence.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Path to a file of newline-delimited JSON records. Reads from standard input when omitted.
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
}
