use std::fmt;

use serde::{
    de::{MapAccess, Visitor},
    Deserialize, Deserializer,
};

use snafu::{ensure, ResultExt as _};

use crate::{
    error::{Empty, InvalidJson},
    FieldValue, RecordError,
};

/// A named record field.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    name: String,
    value: FieldValue,
}

impl Field {
    /// Creates a new `Field`.
    pub fn new(name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns the name of the field.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value of the field.
    pub fn value(&self) -> &FieldValue {
        &self.value
    }
}

/// A telemetry record.
///
/// Records are a timestamp plus an ordered list of named fields. Field names are not required to be unique: lookups by
/// name return the first matching field, while iteration visits every field in insertion order.
///
/// Records deserialize from an object of the form `{"timestamp": <nanoseconds>, "fields": {"Metric": ..., ...}}`, where
/// the fields keep the order in which they appear in the document.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Record {
    timestamp: i64,

    #[serde(default, deserialize_with = "deserialize_ordered_fields")]
    fields: Vec<Field>,
}

impl Record {
    /// Creates an empty `Record` with the given timestamp.
    ///
    /// The timestamp is the number of nanoseconds since the Unix epoch.
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            fields: Vec::new(),
        }
    }

    /// Adds a field to the record.
    ///
    /// This variant is specifically for use in builder-style APIs.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.push_field(name, value);
        self
    }

    /// Adds a field to the record.
    pub fn push_field(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.push(Field::new(name, value));
    }

    /// Returns the timestamp of the record, in nanoseconds since the Unix epoch.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Returns the value of the first field with the given name, if any.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }

    /// Returns all fields, in insertion order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Decodes a record from a single line of JSON.
    ///
    /// # Errors
    ///
    /// If the line is blank, or is not a JSON object with an integer `timestamp` and an optional `fields` object of
    /// scalar values, an error is returned.
    pub fn from_json_line(line: &str) -> Result<Self, RecordError> {
        let line = line.trim();
        ensure!(!line.is_empty(), Empty);

        serde_json::from_str(line).context(InvalidJson)
    }
}

fn deserialize_ordered_fields<'de, D>(deserializer: D) -> Result<Vec<Field>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedFieldsVisitor;

    impl<'de> Visitor<'de> for OrderedFieldsVisitor {
        type Value = Vec<Field>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of field names to values")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut fields = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, value)) = map.next_entry::<String, FieldValue>()? {
                fields.push(Field { name, value });
            }
            Ok(fields)
        }
    }

    deserializer.deserialize_map(OrderedFieldsVisitor)
}
