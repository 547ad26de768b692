use serde_json::{Map, Value};

use crate::timestamp::{EnqueueTime, TimestampError};

/// One job as returned by the listing endpoint.
///
/// Only `id`, `type` and `enqueue_time` are interpreted. Every other field is
/// carried along untouched and written back out in its original key order.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("job record is not a JSON object")]
    NotAnObject,
    #[error("job record field '{0}' is missing or not a string")]
    MissingField(&'static str),
    #[error(transparent)]
    Timestamp(#[from] TimestampError),
}

/// Indentation of archived JSON. Zero means compact output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonIndent(pub usize);

impl Default for JsonIndent {
    fn default() -> Self {
        Self(2)
    }
}

impl JobRecord {
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(RecordError::NotAnObject),
        }
    }

    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn id(&self) -> Option<&str> {
        self.str_field("id")
    }

    pub fn job_type(&self) -> Option<&str> {
        self.str_field("type")
    }

    pub fn enqueue_time_raw(&self) -> Option<&str> {
        self.str_field("enqueue_time")
    }

    /// Parsed `enqueue_time`, failing when absent or in an unknown format.
    pub fn enqueue_time(&self) -> Result<EnqueueTime, RecordError> {
        let raw = self
            .enqueue_time_raw()
            .ok_or(RecordError::MissingField("enqueue_time"))?;
        Ok(EnqueueTime::parse(raw)?)
    }

    pub fn prompt(&self) -> Option<&str> {
        self.str_field("prompt")
    }

    pub fn full_command(&self) -> Option<&str> {
        self.str_field("full_command")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Serialize the full record; no trailing newline.
    pub fn to_json(&self, indent: JsonIndent) -> Result<Vec<u8>, serde_json::Error> {
        if indent.0 == 0 {
            return serde_json::to_vec(&self.fields);
        }
        let indent_str = " ".repeat(indent.0);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent_str.as_bytes());
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        serde::Serialize::serialize(&self.fields, &mut serializer)?;
        Ok(out)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}
