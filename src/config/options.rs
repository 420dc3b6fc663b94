//! Raw transport options and their typed accessors.
//!
//! Options arrive untyped (`transportOptions` / `options` in YAML). Values are
//! read with the type the transport expects when `TransportSettings` are
//! derived, so a wrong type is reported once, at configure time.

use super::secret::REDACTED;
use crate::error::ConfigError;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::fmt;

/// Option keys whose values never appear in `Debug` output.
const SECRET_KEYS: [&str; 1] = ["password"];

/// Transport-specific option map, in configuration order.
#[derive(Clone, Default, PartialEq)]
pub struct TransportOptions(Map<String, Value>);

impl TransportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and programmatic configs.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads a string option. Numbers are accepted and stringified.
    pub fn get_str(&self, transport: &str, key: &str) -> Result<Option<String>, ConfigError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(invalid(
                transport,
                key,
                format!("expected a string, got {}", other),
            )),
        }
    }

    /// Reads a port number, accepting an integer or a numeric string.
    pub fn get_port(&self, transport: &str, key: &str) -> Result<Option<u16>, ConfigError> {
        let expected = || {
            invalid(
                transport,
                key,
                "expected an integer between 1 and 65535".to_string(),
            )
        };

        let port = match self.0.get(key) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Number(n)) => n.as_u64().ok_or_else(expected)?,
            Some(Value::String(s)) => s.trim().parse::<u64>().map_err(|_| expected())?,
            Some(_) => return Err(expected()),
        };

        match u16::try_from(port) {
            Ok(p) if p > 0 => Ok(Some(p)),
            _ => Err(expected()),
        }
    }

    /// Reads a non-negative integer (e.g. a timeout in seconds).
    pub fn get_u64(&self, transport: &str, key: &str) -> Result<Option<u64>, ConfigError> {
        let expected = || invalid(transport, key, "expected a non-negative integer".to_string());

        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(expected),
            Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| expected()),
            Some(_) => Err(expected()),
        }
    }

    /// Reads a boolean, accepting `true`/`false` as booleans or strings.
    pub fn get_bool(&self, transport: &str, key: &str) -> Result<Option<bool>, ConfigError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" => Ok(Some(true)),
                "false" | "no" | "off" => Ok(Some(false)),
                _ => Err(invalid(transport, key, format!("expected a boolean, got '{}'", s))),
            },
            Some(other) => Err(invalid(
                transport,
                key,
                format!("expected a boolean, got {}", other),
            )),
        }
    }

    /// Reads a list of strings. A single string is split on whitespace.
    pub fn get_words(
        &self,
        transport: &str,
        key: &str,
    ) -> Result<Option<Vec<String>>, ConfigError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.split_whitespace().map(String::from).collect())),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    Value::Number(n) => Ok(n.to_string()),
                    other => Err(invalid(
                        transport,
                        key,
                        format!("expected a list of strings, got {}", other),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(invalid(
                transport,
                key,
                format!("expected a string or a list of strings, got {}", other),
            )),
        }
    }
}

fn invalid(transport: &str, key: &str, message: String) -> ConfigError {
    ConfigError::InvalidOption {
        transport: transport.to_string(),
        option: key.to_string(),
        message,
    }
}

impl fmt::Debug for TransportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.0 {
            if SECRET_KEYS.iter().any(|secret| key.eq_ignore_ascii_case(secret)) {
                map.entry(key, &format_args!("{}", REDACTED));
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

impl From<Map<String, Value>> for TransportOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Accepts either a mapping or a flat `[key, value, key, value]` list.
impl<'de> Deserialize<'de> for TransportOptions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawOptions {
            Map(Map<String, Value>),
            Pairs(Vec<Value>),
        }

        match RawOptions::deserialize(deserializer)? {
            RawOptions::Map(map) => Ok(Self(map)),
            RawOptions::Pairs(items) => {
                if items.len() % 2 != 0 {
                    return Err(serde::de::Error::custom(
                        "options list must contain key/value pairs",
                    ));
                }
                let mut map = Map::new();
                for pair in items.chunks(2) {
                    let key = match &pair[0] {
                        Value::String(s) => s.clone(),
                        other => {
                            return Err(serde::de::Error::custom(format!(
                                "option key must be a string, got {}",
                                other
                            )));
                        }
                    };
                    map.insert(key, pair[1].clone());
                }
                Ok(Self(map))
            }
        }
    }
}
