//! The parameter value object

use super::{Operator, ParamKind, Value};
use serde::{Deserialize, Serialize};

/// What a note asks for, plus an optional caller override
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Recommendation {
    /// Value from the note
    pub value: Value,
    /// Declared comparison operator
    pub operator: Operator,
    /// Override supplied by the caller; replaces the note value.
    /// An empty override leaves the parameter untouched.
    pub override_value: Option<Value>,
}

impl Recommendation {
    /// Plain `=` recommendation
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    /// Recommendation parsed from note text (`NA` becomes the sentinel)
    pub fn parse(raw: &str) -> Self {
        Self {
            value: Value::parse(raw),
            ..Default::default()
        }
    }

    /// Set the operator
    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    /// Set an override value
    pub fn with_override(mut self, value: impl Into<Value>) -> Self {
        self.override_value = Some(value.into());
        self
    }

    /// The value reconciliation should work with
    pub fn effective(&self) -> &Value {
        self.override_value.as_ref().unwrap_or(&self.value)
    }

    /// Whether an empty override asks to leave the parameter alone
    pub fn is_untouched(&self) -> bool {
        self.override_value.as_ref().is_some_and(Value::is_empty)
    }
}

/// Result of comparing the live value with the resolved one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compliance {
    /// System already matches
    Compliant,
    /// System differs from the resolved value
    NonCompliant,
    /// Nothing to compare (NA, empty, unsupported, not yet optimised)
    NotApplicable,
}

/// A tunable parameter.
///
/// Never mutated in place: every step returns a new value so the original
/// reading stays available next to the computed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    name: String,
    kind: ParamKind,
    operator: Operator,
    current: Value,
    recommended: Value,
    resolved: Option<Value>,
    supported: bool,
    choices: Vec<String>,
}

impl Parameter {
    /// New parameter with nothing read yet
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: ParamKind::classify(&name),
            name,
            operator: Operator::default(),
            current: Value::Na,
            recommended: Value::Na,
            resolved: None,
            supported: true,
            choices: Vec::new(),
        }
    }

    /// Copy with the given current value
    pub fn with_current(&self, current: impl Into<Value>) -> Self {
        Self {
            current: current.into(),
            ..self.clone()
        }
    }

    /// Copy with the values the system advertises as possible
    pub fn with_choices(&self, choices: Vec<String>) -> Self {
        Self {
            choices,
            ..self.clone()
        }
    }

    /// Copy carrying the outcome of reconciliation
    pub fn resolve(
        &self,
        recommendation: &Recommendation,
        resolved: Value,
        supported: bool,
    ) -> Self {
        Self {
            operator: recommendation.operator,
            recommended: recommendation.effective().clone(),
            resolved: Some(resolved),
            supported,
            ..self.clone()
        }
    }

    /// Parameter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter kind
    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    /// Operator of the last recommendation
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Value read from the system
    pub fn current(&self) -> &Value {
        &self.current
    }

    /// Value recommended by the note (after override)
    pub fn recommended(&self) -> &Value {
        &self.recommended
    }

    /// Reconciled value, once optimised
    pub fn resolved(&self) -> Option<&Value> {
        self.resolved.as_ref()
    }

    /// Whether the resolved value can be honoured on this system
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Values advertised by the system
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    /// Whether the resolved value should be written
    pub fn is_applicable(&self) -> bool {
        self.supported
            && !self.kind.is_report_only()
            && matches!(&self.resolved, Some(Value::Text(s)) if !s.trim().is_empty())
    }

    /// Compare current and resolved values
    pub fn compliance(&self) -> Compliance {
        let resolved = match &self.resolved {
            Some(v) if !v.is_na() && !v.is_empty() && self.supported => v,
            _ => return Compliance::NotApplicable,
        };
        if self.kind == ParamKind::Rpm {
            return match (self.current.as_text(), resolved.as_text()) {
                (Some(installed), Some(wanted))
                    if crate::tuning::rpm::version_at_least(installed, wanted) =>
                {
                    Compliance::Compliant
                }
                _ => Compliance::NonCompliant,
            };
        }
        if self.current.normalized() == resolved.normalized() {
            Compliance::Compliant
        } else {
            Compliance::NonCompliant
        }
    }
}
