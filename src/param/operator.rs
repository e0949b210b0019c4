//! Reconciliation operators
//!
//! A note may express a recommendation as a comparison against the current
//! value (`vm.max_map_count > 2147483647`). The operator is validated and
//! carried with the parameter; reconciliation of a single recommendation
//! currently adopts the recommended value whichever operator is declared.

use crate::error::TuneError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Comparison operator attached to a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Operator {
    /// `=`
    #[default]
    #[serde(rename = "=")]
    Equal,
    /// `<`
    #[serde(rename = "<")]
    Less,
    /// `>`
    #[serde(rename = ">")]
    Greater,
}

impl Operator {
    /// Symbol as written in notes
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::Less => "<",
            Operator::Greater => ">",
        }
    }

    /// Split a `name<op>value` assignment on the first operator symbol.
    ///
    /// Returns `None` if the text contains no operator.
    pub fn split_assignment(text: &str) -> Option<(&str, Operator, &str)> {
        let (idx, op) = text.char_indices().find_map(|(i, c)| match c {
            '=' => Some((i, Operator::Equal)),
            '<' => Some((i, Operator::Less)),
            '>' => Some((i, Operator::Greater)),
            _ => None,
        })?;
        Some((text[..idx].trim(), op, text[idx + 1..].trim()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = TuneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" => Ok(Operator::Equal),
            "<" => Ok(Operator::Less),
            ">" => Ok(Operator::Greater),
            other => Err(TuneError::invalid_value(
                "operator",
                other,
                "expected one of '=', '<', '>'",
            )),
        }
    }
}
