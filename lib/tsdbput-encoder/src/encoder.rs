use bytes::Bytes;
use tracing::debug;
use tsdbput_event::Record;

use crate::{
    dedupe::{DedupeEngine, DedupeOutcome},
    formatter::LineFormatter,
    telemetry::Telemetry,
    EncodeError, OpenTsdbRawConfiguration,
};

/// OpenTSDB raw protocol encoder.
///
/// Encodes records as `put <metric> <unix_seconds> <value> [<key>=<value> ...]` lines, optionally deduplicating
/// repeated values per series. Each encoder owns its dedupe state, so deduplication never spans instances.
pub struct OpenTsdbRawEncoder {
    formatter: LineFormatter,
    dedupe: Option<DedupeEngine>,
    telemetry: Telemetry,
}

impl OpenTsdbRawEncoder {
    /// Creates a new `OpenTsdbRawEncoder` from the given configuration and an already-resolved hostname.
    pub fn from_parts(config: &OpenTsdbRawConfiguration, hostname: Option<String>) -> Self {
        let formatter = LineFormatter::new(config, hostname);

        let window_secs = config.dedupe_window_secs();
        let dedupe = (window_secs > 0).then(|| DedupeEngine::new(window_secs));

        debug!(
            hostname = formatter.hostname().unwrap_or("<none>"),
            dedupe_window_secs = window_secs,
            dedupe_enabled = dedupe.is_some(),
            "Created OpenTSDB raw encoder."
        );

        Self {
            formatter,
            dedupe,
            telemetry: Telemetry::new(),
        }
    }

    /// Returns the hostname used for the fallback `host` tag, if any.
    pub fn hostname(&self) -> Option<&str> {
        self.formatter.hostname()
    }

    /// Returns the number of series tracked for dedupe.
    ///
    /// Always zero when dedupe is disabled.
    pub fn tracked_series(&self) -> usize {
        self.dedupe.as_ref().map_or(0, DedupeEngine::tracked_series)
    }

    /// Encodes a single record.
    ///
    /// Returns the bytes to write, which may hold one or two lines, or `None` if the record was suppressed as a
    /// repeated value.
    ///
    /// # Errors
    ///
    /// If the record lacks a `Metric` or `Value` field, an error is returned, and the dedupe state is left untouched.
    pub fn encode(&mut self, record: &Record) -> Result<Option<Bytes>, EncodeError> {
        let formatted = match self.formatter.format(record) {
            Ok(formatted) => formatted,
            Err(e) => {
                self.telemetry.encode_failed(e.field());
                return Err(e);
            }
        };

        let Some(dedupe) = self.dedupe.as_mut() else {
            self.telemetry.record_encoded();
            return Ok(Some(Bytes::from(formatted.line)));
        };

        let outcome = dedupe.observe(formatted);
        self.telemetry.set_tracked_series(dedupe.tracked_series());

        match &outcome {
            DedupeOutcome::Emit(_) => self.telemetry.record_encoded(),
            DedupeOutcome::Suppressed => self.telemetry.record_suppressed(),
            DedupeOutcome::Flushed(_) => {
                self.telemetry.record_encoded();
                self.telemetry.record_flushed();
            }
        }

        Ok(outcome.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use metrics::{Key, Label};
    use metrics_util::{
        debugging::{DebugValue, DebuggingRecorder},
        CompositeKey, MetricKind,
    };
    use similar_asserts::assert_eq;
    use tsdbput_env::{hostname::MaybeStaticHostnameProvider, HostnameResolver};
    use tsdbput_event::FieldValue;

    use super::*;

    const T0: i64 = 1_500_000_000;

    fn encoder(window_secs: i64) -> OpenTsdbRawEncoder {
        let config = OpenTsdbRawConfiguration::default()
            .with_add_hostname_if_missing(false)
            .with_dedupe_window_secs(window_secs);
        OpenTsdbRawEncoder::from_parts(&config, None)
    }

    fn cpu(secs: i64, value: impl Into<FieldValue>) -> Record {
        Record::new(secs * 1_000_000_000)
            .with_field("Metric", "cpu")
            .with_field("Value", value)
    }

    fn encode(encoder: &mut OpenTsdbRawEncoder, record: &Record) -> Option<String> {
        encoder
            .encode(record)
            .unwrap()
            .map(|bytes| String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn put(secs: i64, value: &str) -> String {
        format!("put cpu {} {}\n", secs, value)
    }

    #[test]
    fn without_dedupe_every_record_is_written() {
        let mut encoder = encoder(0);

        for _ in 0..3 {
            assert_eq!(encode(&mut encoder, &cpu(T0, 1i64)), Some(put(T0, "1")));
        }
        assert_eq!(encoder.tracked_series(), 0);
    }

    #[test]
    fn negative_window_disables_dedupe() {
        let mut encoder = encoder(-5);

        assert_eq!(encode(&mut encoder, &cpu(T0, 1i64)), Some(put(T0, "1")));
        assert_eq!(encode(&mut encoder, &cpu(T0 + 1, 1i64)), Some(put(T0 + 1, "1")));
    }

    #[test]
    fn repeated_value_within_window_is_suppressed() {
        let mut encoder = encoder(60);

        assert_eq!(encode(&mut encoder, &cpu(T0, 1i64)), Some(put(T0, "1")));
        assert_eq!(encode(&mut encoder, &cpu(T0 + 10, 1i64)), None);
        assert_eq!(encoder.tracked_series(), 1);
    }

    #[test]
    fn changed_value_flushes_suppressed_line() {
        let mut encoder = encoder(60);

        assert_eq!(encode(&mut encoder, &cpu(T0, 1i64)), Some(put(T0, "1")));
        assert_eq!(encode(&mut encoder, &cpu(T0 + 3, 1i64)), None);
        assert_eq!(
            encode(&mut encoder, &cpu(T0 + 5, 2i64)),
            Some(put(T0 + 3, "1") + &put(T0 + 5, "2"))
        );

        // Only the newest line is kept after a flush.
        assert_eq!(encode(&mut encoder, &cpu(T0 + 6, 2i64)), None);
        assert_eq!(
            encode(&mut encoder, &cpu(T0 + 70, 3i64)),
            Some(put(T0 + 6, "2") + &put(T0 + 70, "3"))
        );
    }

    #[test]
    fn unchanged_value_at_window_boundary_is_written_alone() {
        let mut encoder = encoder(60);

        assert_eq!(encode(&mut encoder, &cpu(T0, 1i64)), Some(put(T0, "1")));
        assert_eq!(encode(&mut encoder, &cpu(T0 + 30, 1i64)), None);
        assert_eq!(encode(&mut encoder, &cpu(T0 + 59, 1i64)), None);
        assert_eq!(encode(&mut encoder, &cpu(T0 + 60, 1i64)), Some(put(T0 + 60, "1")));
        // The window restarted at T0+60.
        assert_eq!(encode(&mut encoder, &cpu(T0 + 61, 1i64)), None);
    }

    #[test]
    fn changed_value_within_window_without_suppression() {
        let mut encoder = encoder(60);

        assert_eq!(encode(&mut encoder, &cpu(T0, 1i64)), Some(put(T0, "1")));
        assert_eq!(encode(&mut encoder, &cpu(T0 + 10, 2i64)), Some(put(T0 + 10, "2")));
    }

    #[test]
    fn changed_value_after_window_rewrites_previous_line() {
        let mut encoder = encoder(60);

        assert_eq!(encode(&mut encoder, &cpu(T0, 1i64)), Some(put(T0, "1")));
        assert_eq!(
            encode(&mut encoder, &cpu(T0 + 60, 2i64)),
            Some(put(T0, "1") + &put(T0 + 60, "2"))
        );
    }

    #[test]
    fn series_are_split_by_field_tags() {
        let mut encoder = encoder(60);

        let a = cpu(T0, 1i64).with_field("core", 0i64);
        let b = cpu(T0, 1i64).with_field("core", 1i64);

        assert_eq!(
            encode(&mut encoder, &a),
            Some(format!("put cpu {} 1 core=0\n", T0))
        );
        assert_eq!(
            encode(&mut encoder, &b),
            Some(format!("put cpu {} 1 core=1\n", T0))
        );
        assert_eq!(encode(&mut encoder, &a), None);
        assert_eq!(encoder.tracked_series(), 2);
    }

    #[test]
    fn integer_and_float_values_differ() {
        let mut encoder = encoder(60);

        assert_eq!(encode(&mut encoder, &cpu(T0, 1i64)), Some(put(T0, "1")));
        assert_eq!(encode(&mut encoder, &cpu(T0 + 1, 1.0)), Some(put(T0 + 1, "1")));
        assert_eq!(encode(&mut encoder, &cpu(T0 + 2, 1.0)), None);
    }

    #[test]
    fn nan_is_never_suppressed() {
        let mut encoder = encoder(60);

        assert_eq!(encode(&mut encoder, &cpu(T0, f64::NAN)), Some(put(T0, "NaN")));
        assert_eq!(encode(&mut encoder, &cpu(T0 + 1, f64::NAN)), Some(put(T0 + 1, "NaN")));
    }

    #[test]
    fn failed_encode_leaves_state_untouched() {
        let mut encoder = encoder(60);

        assert_eq!(encode(&mut encoder, &cpu(T0, 1i64)), Some(put(T0, "1")));

        let no_value = Record::new((T0 + 1) * 1_000_000_000).with_field("Metric", "cpu");
        assert_eq!(
            encoder.encode(&no_value),
            Err(EncodeError::MissingField { field: "Value" })
        );
        assert_eq!(encoder.tracked_series(), 1);

        assert_eq!(encode(&mut encoder, &cpu(T0 + 2, 1i64)), None);
    }

    #[test]
    fn host_tag_fallback() {
        let config = OpenTsdbRawConfiguration::default().with_tag_name_prefix(";");
        let mut encoder = OpenTsdbRawEncoder::from_parts(&config, Some("h1".to_string()));
        assert_eq!(encoder.hostname(), Some("h1"));

        let record = Record::new(T0 * 1_000_000_000)
            .with_field("Metric", "cpu")
            .with_field("Value", 1i64);
        assert_eq!(
            encode(&mut encoder, &record),
            Some(format!("put cpu {} 1 host=h1\n", T0))
        );

        let record = Record::new(T0 * 1_000_000_000)
            .with_field("Metric", "cpu;host.web1")
            .with_field("Value", 1i64);
        assert_eq!(
            encode(&mut encoder, &record),
            Some(format!("put cpu {} 1 host=web1\n", T0))
        );
    }

    #[tokio::test]
    async fn build_resolves_hostname_once() {
        let resolver = HostnameResolver::empty()
            .with_provider("static", MaybeStaticHostnameProvider::new(Some("web7".to_string())));

        let encoder = OpenTsdbRawConfiguration::default().build(&resolver).await;
        assert_eq!(encoder.hostname(), Some("web7"));

        let encoder = OpenTsdbRawConfiguration::default()
            .with_add_hostname_if_missing(false)
            .build(&resolver)
            .await;
        assert_eq!(encoder.hostname(), None);

        let encoder = OpenTsdbRawConfiguration::default()
            .build(&HostnameResolver::empty())
            .await;
        assert_eq!(encoder.hostname(), None);
    }

    #[test]
    fn telemetry() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            let mut encoder = encoder(60);
            encoder.encode(&cpu(T0, 1i64)).unwrap();
            encoder.encode(&cpu(T0 + 1, 1i64)).unwrap();
            encoder.encode(&cpu(T0 + 2, 2i64)).unwrap();
            let _ = encoder.encode(&Record::new(0).with_field("Value", 1i64));
        });

        let snapshot = snapshotter.snapshot().into_hashmap();
        let value_of = |kind: MetricKind, key: Key| snapshot.get(&CompositeKey::new(kind, key)).map(|(_, _, v)| v);

        assert_eq!(
            value_of(MetricKind::Counter, Key::from_name("tsdbput_records_encoded_total")),
            Some(&DebugValue::Counter(2))
        );
        assert_eq!(
            value_of(MetricKind::Counter, Key::from_name("tsdbput_records_suppressed_total")),
            Some(&DebugValue::Counter(1))
        );
        assert_eq!(
            value_of(MetricKind::Counter, Key::from_name("tsdbput_records_flushed_total")),
            Some(&DebugValue::Counter(1))
        );
        assert_eq!(
            value_of(
                MetricKind::Counter,
                Key::from_parts("tsdbput_encode_errors_total", vec![Label::new("field", "Metric")])
            ),
            Some(&DebugValue::Counter(1))
        );
        assert!(matches!(
            value_of(MetricKind::Gauge, Key::from_name("tsdbput_dedupe_tracked_series")),
            Some(DebugValue::Gauge(v)) if v.into_inner() == 1.0
        ));
    }
}
