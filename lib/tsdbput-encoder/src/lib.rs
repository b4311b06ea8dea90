//! OpenTSDB raw protocol encoding.
//!
//! Turns [`Record`][tsdbput_event::Record]s into `put` lines for the OpenTSDB telnet-style protocol, with optional
//! per-series deduplication of repeated values.
#![deny(warnings)]
#![deny(missing_docs)]

mod config;
pub use self::config::OpenTsdbRawConfiguration;

pub mod dedupe;

mod encoder;
pub use self::encoder::OpenTsdbRawEncoder;

mod error;
pub use self::error::{EncodeError, METRIC_FIELD, VALUE_FIELD};

pub mod formatter;

mod telemetry;
