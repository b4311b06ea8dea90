//! Command-line front end for the OpenTSDB raw encoder.
//!
//! Reads newline-delimited JSON records from a file or standard input, and writes the encoded `put` lines to standard
//! output.
#![deny(warnings)]
#![deny(missing_docs)]

use clap::Parser as _;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{error, info};
use tsdbput_encoder::OpenTsdbRawConfiguration;
use tsdbput_env::HostnameResolver;
use tsdbput_error::{ErrorContext as _, GenericError};

mod cli;
use self::cli::Cli;

mod logging;
use self::logging::initialize_logging;

mod run;
use self::run::{load_configuration, process};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = initialize_logging() {
        eprintln!("FATAL: failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli).await {
        error!("{:?}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), GenericError> {
    let configuration = load_configuration(cli.config.as_deref())?;
    let encoder_config = OpenTsdbRawConfiguration::from_configuration(&configuration)?;
    let hostname_resolver = HostnameResolver::from_configuration(&configuration)?;

    let mut encoder = encoder_config.build(&hostname_resolver).await;

    let reader: Box<dyn AsyncBufRead + Unpin> = match cli.input.as_deref() {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_error_context(|| format!("Failed to open input file '{}'.", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let mut stdout = tokio::io::stdout();
    let summary = process(&mut encoder, reader, &mut stdout).await?;

    info!(
        records = summary.records,
        written = summary.written,
        suppressed = summary.suppressed,
        invalid = summary.invalid,
        failed = summary.failed,
        tracked_series = encoder.tracked_series(),
        "Finished encoding records."
    );

    Ok(())
}
