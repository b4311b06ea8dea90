use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, AsyncWrite, AsyncWriteExt as _};
use tracing::{debug, warn};
use tsdbput_config::{ConfigurationLoader, GenericConfiguration};
use tsdbput_encoder::OpenTsdbRawEncoder;
use tsdbput_error::{ErrorContext as _, GenericError};
use tsdbput_event::Record;

const ENV_PREFIX: &str = "tsdbput";

/// Counts of what happened to the records read from the input.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    /// Lines read from the input, blank lines excluded.
    pub records: u64,

    /// Records that produced output.
    pub written: u64,

    /// Records withheld as repeated values.
    pub suppressed: u64,

    /// Lines that could not be decoded as records.
    pub invalid: u64,

    /// Records that could not be encoded.
    pub failed: u64,
}

/// Loads the configuration from the optional file, overlaid with `TSDBPUT_`-prefixed environment variables.
pub fn load_configuration(path: Option<&Path>) -> Result<GenericConfiguration, GenericError> {
    let mut loader = ConfigurationLoader::default();
    if let Some(path) = path {
        loader = loader
            .from_file(path)
            .with_error_context(|| format!("Failed to load configuration from '{}'.", path.display()))?;
    }

    let loader = loader
        .from_environment(ENV_PREFIX)
        .error_context("Failed to load configuration from environment variables.")?;

    Ok(loader.into_generic())
}

/// Encodes every record read from `reader`, writing the output to `writer`.
///
/// Lines that can't be decoded (including lines that aren't valid UTF-8), and records that can't be encoded, are logged
/// and skipped.
///
/// # Errors
///
/// If reading from `reader` or writing to `writer` fails, an error is returned.
pub async fn process<R, W>(encoder: &mut OpenTsdbRawEncoder, mut reader: R, writer: &mut W) -> Result<Summary, GenericError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut summary = Summary::default();
    let mut line_number = 0u64;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .await
            .error_context("Failed to read input.")?;
        if n == 0 {
            break;
        }

        line_number += 1;
        if buf.trim_ascii().is_empty() {
            continue;
        }
        summary.records += 1;

        let record = match std::str::from_utf8(&buf) {
            Ok(line) => Record::from_json_line(line),
            Err(e) => {
                warn!(line_number, error = %e, "Skipping record that is not valid UTF-8.");
                summary.invalid += 1;
                continue;
            }
        };

        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!(line_number, error = %e, "Skipping invalid record.");
                summary.invalid += 1;
                continue;
            }
        };

        match encoder.encode(&record) {
            Ok(Some(output)) => {
                writer.write_all(&output).await.error_context("Failed to write output.")?;
                summary.written += 1;
            }
            Ok(None) => {
                debug!(line_number, "Record suppressed.");
                summary.suppressed += 1;
            }
            Err(e) => {
                warn!(line_number, error = %e, "Failed to encode record.");
                summary.failed += 1;
            }
        }
    }

    writer.flush().await.error_context("Failed to flush output.")?;

    Ok(summary)
}
