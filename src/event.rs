//! Event records fed to the email output.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One structured record: an ordered mapping of field name to value.
///
/// Values are scalars, arrays of scalars, or nested objects. The output
/// never mutates an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Map<String, Value>);

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one JSON object. Anything other than an object is rejected.
    pub fn from_json(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    /// Looks up a field by name.
    ///
    /// A bracketed path such as `[host][name]` walks nested objects.
    pub fn get(&self, reference: &str) -> Option<&Value> {
        let reference = reference.trim();
        if !reference.starts_with('[') {
            return self.0.get(reference);
        }

        let mut segments = reference
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split("][");

        let first = segments.next()?;
        let mut current = self.0.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Event {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
