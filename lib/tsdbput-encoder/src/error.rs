use snafu::Snafu;

/// Name of the field holding the metric name.
pub const METRIC_FIELD: &str = "Metric";

/// Name of the field holding the data point value.
pub const VALUE_FIELD: &str = "Value";

/// An encoding error.
///
/// Errors only ever concern a single record: the record produces no output, and the encoder is ready for the next one.
#[derive(Debug, Eq, PartialEq, Snafu)]
#[snafu(context(suffix(false)), visibility(pub(crate)))]
pub enum EncodeError {
    /// A mandatory field was not present in the record.
    #[snafu(display("Unable to find Field[{}] in message", field))]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },
}

impl EncodeError {
    /// Returns the name of the field the error relates to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field } => field,
        }
    }
}
