use snafu::Snafu;

/// A record decoding error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)), visibility(pub(crate)))]
pub enum RecordError {
    /// The input was empty or only whitespace.
    #[snafu(display("record is empty"))]
    Empty,

    /// The input was not a valid JSON record.
    #[snafu(display("invalid JSON record: {}", source))]
    InvalidJson {
        /// Underlying deserialization error.
        source: serde_json::Error,
    },
}
