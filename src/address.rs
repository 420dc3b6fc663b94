//! Address list normalization.
//!
//! No syntax validation happens here; malformed addresses are caught when
//! the message is assembled.

use std::fmt;

/// Ordered list of trimmed, non-empty address strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressList(Vec<String>);

impl AddressList {
    /// Flattens address specifications into individual addresses.
    ///
    /// Every entry is split on commas, so `["a@x, b@x"]` and
    /// `["a@x", "b@x"]` both give `[a@x, b@x]`. Order is preserved and
    /// duplicates are kept.
    pub fn parse<S: AsRef<str>>(specs: &[S]) -> Self {
        Self(
            specs
                .iter()
                .flat_map(|spec| spec.as_ref().split(','))
                .map(str::trim)
                .filter(|addr| !addr.is_empty())
                .map(String::from)
                .collect(),
        )
    }

    /// Parses a single, possibly comma-joined, specification.
    pub fn parse_str(spec: &str) -> Self {
        Self::parse(&[spec])
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AddressList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}
