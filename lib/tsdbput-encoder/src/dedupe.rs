//! Per-series deduplication of repeated values.

use bytes::{BufMut as _, Bytes, BytesMut};
use tracing::trace;
use tsdbput_event::{time::seconds_to_nanos, FieldValue};

use crate::formatter::FormattedLine;

/// A hash map based on `hashbrown` using `foldhash` for hashing.
pub type FastHashMap<K, V> = hashbrown::HashMap<K, V, foldhash::quality::RandomState>;

struct SeriesState {
    last_line: Bytes,
    was_suppressed: bool,
    last_timestamp_nanos: i64,
    last_value: FieldValue,
}

/// Result of passing a line through the dedupe engine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DedupeOutcome {
    /// The line should be written as-is.
    Emit(Bytes),

    /// The line repeats the last value of its series within the window, and should not be written.
    Suppressed,

    /// The previously stored line of the series, followed by the current line.
    Flushed(Bytes),
}

impl DedupeOutcome {
    /// Consumes the outcome, returning the bytes to write, if any.
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            Self::Emit(bytes) | Self::Flushed(bytes) => Some(bytes),
            Self::Suppressed => None,
        }
    }
}

/// Per-series dedupe state.
///
/// Repeated values of a series are suppressed until either the window elapses or the value changes. When the value
/// changes after a suppression, the last suppressed line is written ahead of the new one so that the change is
/// anchored to the last point at which the old value was still observed.
///
/// State is kept for every series ever seen, and is never evicted.
pub struct DedupeEngine {
    window_nanos: i64,
    series: FastHashMap<String, SeriesState>,
}

impl DedupeEngine {
    /// Creates a new `DedupeEngine` with the given window, in seconds.
    pub fn new(window_secs: i64) -> Self {
        Self {
            window_nanos: seconds_to_nanos(window_secs),
            series: FastHashMap::default(),
        }
    }

    /// Returns the number of series currently tracked.
    pub fn tracked_series(&self) -> usize {
        self.series.len()
    }

    /// Decides what to write for the given line, and updates the state of its series.
    pub fn observe(&mut self, formatted: FormattedLine) -> DedupeOutcome {
        let FormattedLine {
            line,
            series_key,
            value,
            timestamp_nanos,
            ..
        } = formatted;
        let line = Bytes::from(line);

        let Some(state) = self.series.get_mut(&series_key) else {
            trace!(series = %series_key, "Tracking new series.");
            self.series.insert(
                series_key,
                SeriesState {
                    last_line: line.clone(),
                    was_suppressed: false,
                    last_timestamp_nanos: timestamp_nanos,
                    last_value: value,
                },
            );
            return DedupeOutcome::Emit(line);
        };

        let elapsed_nanos = timestamp_nanos.saturating_sub(state.last_timestamp_nanos);
        let within_window = elapsed_nanos < self.window_nanos;
        let value_changed = state.last_value != value;

        if !value_changed && within_window {
            trace!(series = %series_key, elapsed_nanos, "Suppressing repeated value.");
            state.last_line = line;
            state.was_suppressed = true;
            state.last_value = value;
            return DedupeOutcome::Suppressed;
        }

        let outcome = if value_changed && (state.was_suppressed || !within_window) {
            trace!(series = %series_key, elapsed_nanos, "Flushing last stored line ahead of changed value.");
            let mut buf = BytesMut::with_capacity(state.last_line.len() + line.len());
            buf.put_slice(&state.last_line);
            buf.put_slice(&line);
            DedupeOutcome::Flushed(buf.freeze())
        } else {
            DedupeOutcome::Emit(line.clone())
        };

        state.last_line = line;
        state.was_suppressed = false;
        state.last_timestamp_nanos = timestamp_nanos;
        state.last_value = value;

        outcome
    }
}
