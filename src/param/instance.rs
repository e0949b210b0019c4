//! Per-instance values
//!
//! CPU and block-device settings are reported per instance:
//! `all:performance` or `cpu0:15 cpu1:6 cpu2:0`. Entry order is kept so a
//! rewritten map reads exactly like the one that was inspected.

use std::fmt;

/// Key used when every instance shares one value
pub const ALL: &str = "all";

/// Ordered `key:value` pairs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstanceMap {
    entries: Vec<(String, String)>,
}

impl InstanceMap {
    /// Map with a single `all:<value>` entry
    pub fn uniform(value: impl Into<String>) -> Self {
        Self {
            entries: vec![(ALL.to_string(), value.into())],
        }
    }

    /// Parse `key:value key:value ...`.
    ///
    /// A bare token without a colon becomes an `all` entry.
    pub fn parse(text: &str) -> Self {
        let entries = text
            .split_whitespace()
            .map(|token| match token.split_once(':') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (ALL.to_string(), token.to_string()),
            })
            .collect();
        Self { entries }
    }

    /// Build from per-instance readings, collapsing to `all:<v>` when every
    /// instance agrees.
    pub fn from_readings(readings: Vec<(String, String)>) -> Self {
        let uniform = readings
            .first()
            .map(|(_, first)| readings.iter().all(|(_, v)| v == first))
            .unwrap_or(false);

        if uniform {
            let value = readings[0].1.clone();
            return Self::uniform(value);
        }
        Self { entries: readings }
    }

    /// Entries in order
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// New map with every value replaced, keys and order untouched
    pub fn with_all_values(&self, value: &str) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|(k, _)| (k.clone(), value.to_string()))
                .collect(),
        }
    }
}

impl fmt::Display for InstanceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.entries {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}:{}", key, value)?;
            first = false;
        }
        Ok(())
    }
}
