use metrics::{counter, gauge, Counter, Gauge};

use crate::error::{METRIC_FIELD, VALUE_FIELD};

#[derive(Clone)]
pub struct Telemetry {
    records_encoded: Counter,
    records_suppressed: Counter,
    records_flushed: Counter,
    missing_metric_field: Counter,
    missing_value_field: Counter,
    tracked_series: Gauge,
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            records_encoded: counter!("tsdbput_records_encoded_total"),
            records_suppressed: counter!("tsdbput_records_suppressed_total"),
            records_flushed: counter!("tsdbput_records_flushed_total"),
            missing_metric_field: counter!("tsdbput_encode_errors_total", "field" => METRIC_FIELD),
            missing_value_field: counter!("tsdbput_encode_errors_total", "field" => VALUE_FIELD),
            tracked_series: gauge!("tsdbput_dedupe_tracked_series"),
        }
    }

    pub fn record_encoded(&self) {
        self.records_encoded.increment(1);
    }

    pub fn record_suppressed(&self) {
        self.records_suppressed.increment(1);
    }

    pub fn record_flushed(&self) {
        self.records_flushed.increment(1);
    }

    pub fn encode_failed(&self, field: &str) {
        if field == METRIC_FIELD {
            self.missing_metric_field.increment(1);
        } else {
            self.missing_value_field.increment(1);
        }
    }

    pub fn set_tracked_series(&self, count: usize) {
        self.tracked_series.set(count as f64);
    }
}
