//! Rendering of records as `put` lines.

use std::{
    borrow::Cow,
    fmt::{Display, Write as _},
};

use snafu::OptionExt as _;
use tracing::trace;
use tsdbput_event::{
    time::{get_unix_timestamp_nanos, nanos_to_unix_seconds},
    FieldValue, Record,
};

use crate::{
    error::{MissingField, METRIC_FIELD, VALUE_FIELD},
    EncodeError, OpenTsdbRawConfiguration,
};

const HOST_TAG: &str = "host";

/// A record rendered as a single `put` line, along with what the dedupe engine needs to key and compare it.
#[derive(Clone, Debug, PartialEq)]
pub struct FormattedLine {
    /// The complete line, including the trailing newline.
    pub line: String,

    /// Series key: the raw metric field text, a colon, and the rendered field tags.
    pub series_key: String,

    /// Tags derived from record fields, each rendered as ` key=value`.
    pub field_tags: String,

    /// The data point value.
    pub value: FieldValue,

    /// Timestamp of the data point, in nanoseconds since the Unix epoch.
    pub timestamp_nanos: i64,
}

/// Renders records as OpenTSDB `put` lines.
///
/// The formatter is stateless: the same record (and the same clock reading, when not using record timestamps) always
/// renders the same line.
#[derive(Clone, Debug)]
pub struct LineFormatter {
    tag_name_prefix: String,
    tag_value_prefix: String,
    timestamp_from_record: bool,
    fields_to_tags: bool,
    hostname: Option<String>,
    clock: fn() -> i64,
}

impl LineFormatter {
    /// Creates a new `LineFormatter` from the given configuration.
    ///
    /// `hostname` is used for the fallback `host` tag, and is ignored if the configuration doesn't ask for one.
    pub fn new(config: &OpenTsdbRawConfiguration, hostname: Option<String>) -> Self {
        let hostname = hostname
            .filter(|hostname| !hostname.is_empty())
            .filter(|_| config.add_hostname_if_missing());

        Self {
            tag_name_prefix: config.tag_name_prefix().to_string(),
            tag_value_prefix: config.tag_value_prefix().to_string(),
            timestamp_from_record: config.timestamp_from_record(),
            fields_to_tags: config.fields_to_tags(),
            hostname,
            clock: get_unix_timestamp_nanos,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the hostname used for the fallback `host` tag, if any.
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// Formats the given record.
    ///
    /// # Errors
    ///
    /// If the record has no `Metric` or no `Value` field, an error is returned.
    pub fn format(&self, record: &Record) -> Result<FormattedLine, EncodeError> {
        let metric = record.field(METRIC_FIELD).context(MissingField { field: METRIC_FIELD })?;
        let metric = match metric {
            FieldValue::Text(s) => Cow::Borrowed(s.as_str()),
            other => Cow::Owned(other.to_string()),
        };

        let (metric_name, embedded_tags) = if self.tag_name_prefix.is_empty() {
            (metric.as_ref(), None)
        } else {
            let mut parts = metric.split(self.tag_name_prefix.as_str());
            (parts.next().unwrap_or_default(), Some(parts))
        };

        let mut line = String::with_capacity(64 + metric.len());
        line.push_str("put ");
        line.push_str(metric_name);
        line.push(' ');

        let timestamp_nanos = if self.timestamp_from_record {
            record.timestamp()
        } else {
            (self.clock)()
        };
        push_display(&mut line, nanos_to_unix_seconds(timestamp_nanos));
        line.push(' ');

        let value = record.field(VALUE_FIELD).context(MissingField { field: VALUE_FIELD })?;
        push_display(&mut line, value);

        let mut seen_host_tag = false;

        for segment in embedded_tags.into_iter().flatten() {
            match segment.split_once(self.tag_value_prefix.as_str()) {
                Some((key, value)) if !key.is_empty() && !value.is_empty() => {
                    seen_host_tag |= key.eq_ignore_ascii_case(HOST_TAG);
                    push_tag(&mut line, key, value);
                }
                _ => trace!(metric = %metric, segment, "Dropping malformed embedded tag."),
            }
        }

        let mut field_tags = String::new();
        if self.fields_to_tags {
            for field in record.fields() {
                let name = field.name();
                if !name.starts_with(self.tag_name_prefix.as_str()) || name == METRIC_FIELD || name == VALUE_FIELD {
                    continue;
                }

                // Every leading character found in the prefix is stripped, not just one copy of the prefix itself.
                let key = name.trim_start_matches(|c| self.tag_name_prefix.contains(c));
                seen_host_tag |= key.eq_ignore_ascii_case(HOST_TAG);
                push_tag(&mut field_tags, key, field.value());
            }
        }
        line.push_str(&field_tags);

        if !seen_host_tag {
            if let Some(hostname) = self.hostname.as_deref() {
                push_tag(&mut line, HOST_TAG, hostname);
            }
        }

        line.push('\n');

        let mut series_key = String::with_capacity(metric.len() + 1 + field_tags.len());
        series_key.push_str(&metric);
        series_key.push(':');
        series_key.push_str(&field_tags);

        Ok(FormattedLine {
            line,
            series_key,
            field_tags,
            value: value.clone(),
            timestamp_nanos,
        })
    }
}

fn push_tag(buf: &mut String, key: &str, value: impl Display) {
    buf.push(' ');
    buf.push_str(key);
    buf.push('=');
    push_display(buf, value);
}

fn push_display(buf: &mut String, value: impl Display) {
    // Writing into a `String` can't fail.
    let _ = write!(buf, "{}", value);
}
