//! Parameter values and numeric helpers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Text shown for an undeterminable value
pub const NA: &str = "NA";

/// A parameter value as read from the system or supplied by a note.
///
/// `Na` is a distinct variant. Text read from the system is always `Text`,
/// even if the kernel happens to report the string "NA".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A concrete value (possibly empty, meaning "nothing to apply")
    Text(String),
    /// Not determinable on this system, or no recommendation applies
    Na,
}

impl Value {
    /// Build a concrete value
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    /// The empty value, returned by reconciliations that must not be applied
    pub fn empty() -> Self {
        Value::Text(String::new())
    }

    /// Parse caller-supplied text, mapping the literal `NA` to [`Value::Na`]
    pub fn parse(raw: &str) -> Self {
        if raw.trim() == NA {
            Value::Na
        } else {
            Value::Text(raw.to_string())
        }
    }

    /// Whether this is the NA sentinel
    pub fn is_na(&self) -> bool {
        matches!(self, Value::Na)
    }

    /// Whether this is an empty concrete value
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Text(s) if s.trim().is_empty())
    }

    /// The concrete text, if any
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            Value::Na => None,
        }
    }

    /// Whitespace-normalised text, used for comparisons
    pub fn normalized(&self) -> Option<String> {
        self.as_text()
            .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Na
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Na => f.write_str(NA),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Maximum of the given values, starting from `T::default()`.
///
/// Returns the default (zero) for empty input, and also when every value
/// is below the default.
pub fn max_of<T: PartialOrd + Default + Copy>(values: &[T]) -> T {
    values
        .iter()
        .fold(T::default(), |acc, &v| if acc < v { v } else { acc })
}

/// Minimum of the given values; the default (zero) for empty input.
pub fn min_of<T: PartialOrd + Default + Copy>(values: &[T]) -> T {
    let mut iter = values.iter().copied();
    match iter.next() {
        Some(first) => iter.fold(first, |acc, v| if v < acc { v } else { acc }),
        None => T::default(),
    }
}
