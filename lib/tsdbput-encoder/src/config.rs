use serde::Deserialize;
use tracing::debug;
use tsdbput_config::GenericConfiguration;
use tsdbput_env::hostname::HostnameProvider;
use tsdbput_error::GenericError;

use crate::OpenTsdbRawEncoder;

const DEFAULT_TAG_VALUE_PREFIX: &str = ".";

const fn default_true() -> bool {
    true
}

/// OpenTSDB raw encoder configuration.
///
/// Keys match the options of the encoder as deployed:
///
/// - `tagname_prefix`: marks embedded tags inside the metric name, and selects which record fields become tags.
/// - `tagvalue_prefix`: separates an embedded tag's key from its value. Defaults to `.` when `tagname_prefix` is set.
/// - `ts_from_message`: use the record's timestamp rather than the current time. Defaults to `true`.
/// - `fields_to_tags`: turn record fields whose name starts with `tagname_prefix` into tags. Defaults to `true`.
/// - `add_hostname_if_missing`: add a `host` tag when no other source provided one. Defaults to `true`.
/// - `dedupe_window`: size of the dedupe window, in seconds. `0` (the default) disables dedupe.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct OpenTsdbRawConfiguration {
    #[serde(default, rename = "tagname_prefix")]
    tag_name_prefix: String,

    #[serde(default, rename = "tagvalue_prefix")]
    tag_value_prefix: String,

    #[serde(default = "default_true", rename = "ts_from_message")]
    timestamp_from_record: bool,

    #[serde(default = "default_true")]
    fields_to_tags: bool,

    #[serde(default = "default_true")]
    add_hostname_if_missing: bool,

    #[serde(default, rename = "dedupe_window")]
    dedupe_window_secs: i64,
}

impl Default for OpenTsdbRawConfiguration {
    fn default() -> Self {
        Self {
            tag_name_prefix: String::new(),
            tag_value_prefix: String::new(),
            timestamp_from_record: true,
            fields_to_tags: true,
            add_hostname_if_missing: true,
            dedupe_window_secs: 0,
        }
    }
}

impl OpenTsdbRawConfiguration {
    /// Creates a new `OpenTsdbRawConfiguration` from the given configuration.
    ///
    /// # Errors
    ///
    /// If any of the encoder keys hold a value of the wrong type, an error is returned.
    pub fn from_configuration(config: &GenericConfiguration) -> Result<Self, GenericError> {
        Ok(config.as_typed()?)
    }

    /// Sets the tag name prefix.
    pub fn with_tag_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tag_name_prefix = prefix.into();
        self
    }

    /// Sets the tag value prefix.
    pub fn with_tag_value_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tag_value_prefix = prefix.into();
        self
    }

    /// Sets whether the record's timestamp is used, as opposed to the current time.
    pub fn with_timestamp_from_record(mut self, enabled: bool) -> Self {
        self.timestamp_from_record = enabled;
        self
    }

    /// Sets whether prefixed record fields are turned into tags.
    pub fn with_fields_to_tags(mut self, enabled: bool) -> Self {
        self.fields_to_tags = enabled;
        self
    }

    /// Sets whether a `host` tag is added when none is otherwise present.
    pub fn with_add_hostname_if_missing(mut self, enabled: bool) -> Self {
        self.add_hostname_if_missing = enabled;
        self
    }

    /// Sets the dedupe window, in seconds.
    pub fn with_dedupe_window_secs(mut self, secs: i64) -> Self {
        self.dedupe_window_secs = secs;
        self
    }

    /// Returns the tag name prefix.
    pub fn tag_name_prefix(&self) -> &str {
        &self.tag_name_prefix
    }

    /// Returns the effective tag value prefix.
    ///
    /// Embedded tags can't be split without a value delimiter, so when a tag name prefix is set and no value prefix
    /// is, `.` is used.
    pub fn tag_value_prefix(&self) -> &str {
        if !self.tag_name_prefix.is_empty() && self.tag_value_prefix.is_empty() {
            DEFAULT_TAG_VALUE_PREFIX
        } else {
            &self.tag_value_prefix
        }
    }

    /// Returns `true` if the record's timestamp is used.
    pub const fn timestamp_from_record(&self) -> bool {
        self.timestamp_from_record
    }

    /// Returns `true` if prefixed record fields are turned into tags.
    pub const fn fields_to_tags(&self) -> bool {
        self.fields_to_tags
    }

    /// Returns `true` if a `host` tag is added when none is otherwise present.
    pub const fn add_hostname_if_missing(&self) -> bool {
        self.add_hostname_if_missing
    }

    /// Returns the dedupe window, in seconds.
    ///
    /// Dedupe is disabled when this is zero or negative.
    pub const fn dedupe_window_secs(&self) -> i64 {
        self.dedupe_window_secs
    }

    /// Builds an encoder from this configuration.
    ///
    /// The hostname is resolved once, here, and reused for every record the encoder handles. It is only queried when
    /// `add_hostname_if_missing` is enabled.
    pub async fn build<H>(&self, hostname_provider: &H) -> OpenTsdbRawEncoder
    where
        H: HostnameProvider + ?Sized,
    {
        let hostname = if self.add_hostname_if_missing {
            hostname_provider.get_hostname().await
        } else {
            None
        };

        if self.add_hostname_if_missing && hostname.is_none() {
            debug!("No hostname available. Records without a host tag will be sent without one.");
        }

        OpenTsdbRawEncoder::from_parts(self, hostname)
    }
}
