//! PAM resource limits
//!
//! `LIMIT_<domain>_<type>_<item>` carries a whole limits line as its value
//! (`@sapsys soft nofile 65536`). Applied limits live in a drop-in file
//! owned by this tool; removing the drop-in restores the previous state.

use crate::error::{Result, TuneError};
use crate::param::{Value, LIMIT_PREFIX, NA};
use crate::system::Host;
use std::fmt;

const DROP_IN_DIR: &str = "/etc/security/limits.d";
const LIMITS_CONF: &str = "/etc/security/limits.conf";

/// Domain, type and item of a limit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitKey {
    /// User, `@group` or `*`
    pub domain: String,
    /// `soft`, `hard` or `-`
    pub kind: String,
    /// Resource, e.g. `nofile`
    pub item: String,
}

impl LimitKey {
    /// Parse a parameter name. The domain may itself contain underscores.
    pub fn from_name(name: &str) -> Option<Self> {
        let rest = name.strip_prefix(LIMIT_PREFIX)?;
        let mut parts = rest.rsplitn(3, '_');
        let item = parts.next()?;
        let kind = parts.next()?;
        let domain = parts.next()?;
        if domain.is_empty() || kind.is_empty() || item.is_empty() {
            return None;
        }
        Some(Self {
            domain: domain.to_string(),
            kind: kind.to_string(),
            item: item.to_string(),
        })
    }

    /// Drop-in file holding this limit
    pub fn drop_in(&self) -> String {
        format!(
            "{}/paramtune-{}-{}-{}.conf",
            DROP_IN_DIR, self.domain, self.kind, self.item
        )
    }

    /// Limits line with the given value
    pub fn line(&self, value: &str) -> String {
        format!("{} {} {} {}", self.domain, self.kind, self.item, value)
    }

    /// Value of the first line in `content` that sets this limit
    fn find_in(&self, content: &str) -> Option<String> {
        content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .find_map(|l| {
                let fields: Vec<&str> = l.split_whitespace().collect();
                match fields.as_slice() {
                    [d, t, i, v, ..] if *d == self.domain && *t == self.kind && *i == self.item => {
                        Some(v.to_string())
                    }
                    _ => None,
                }
            })
    }
}

impl fmt::Display for LimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.domain, self.kind, self.item)
    }
}

/// Value field of a limits line, if it has one
fn value_field(line: &str) -> Option<&str> {
    line.split_whitespace().nth(3)
}

/// Current limits line; the value is `NA` when the limit is not set
pub fn inspect(host: &dyn Host, name: &str) -> Result<Value> {
    let Some(key) = LimitKey::from_name(name) else {
        tracing::warn!("{}: malformed limit name", name);
        return Ok(Value::Na);
    };
    for path in [key.drop_in(), LIMITS_CONF.to_string()] {
        if let Some(value) = host.read(&path)?.and_then(|c| key.find_in(&c)) {
            return Ok(Value::Text(key.line(&value)));
        }
    }
    Ok(Value::Text(key.line(NA)))
}

/// Adopt the recommended line unless it carries no value
pub fn optimise(current: &Value, recommended: &Value) -> Value {
    match recommended.as_text().map(str::trim) {
        Some(line) if value_field(line).is_some_and(|v| v != NA) => Value::text(line),
        _ => current.clone(),
    }
}

/// Write the drop-in. A line whose value is `NA`, or NA itself, removes it.
pub fn apply(host: &dyn Host, name: &str, value: &Value) -> Result<()> {
    let key = LimitKey::from_name(name)
        .ok_or_else(|| TuneError::invalid_value(name, value.to_string(), "malformed limit name"))?;
    let path = key.drop_in();

    let line = match value.as_text().map(str::trim) {
        Some(line) if value_field(line).is_some_and(|v| v != NA) => line,
        Some(line) if !line.is_empty() && value_field(line).is_none() => {
            return Err(TuneError::invalid_value(
                name,
                line,
                "expected '<domain> <type> <item> <value>'",
            ));
        }
        _ => {
            if host.remove(&path)? {
                tracing::info!("{}: removed {}", name, path);
            }
            return Ok(());
        }
    };

    let head: Vec<&str> = line.split_whitespace().take(3).collect();
    if head != [key.domain.as_str(), key.kind.as_str(), key.item.as_str()] {
        return Err(TuneError::invalid_value(
            name,
            line,
            format!("line must start with '{}'", key),
        ));
    }
    tracing::info!("{}: writing '{}' to {}", name, line, path);
    host.write(&path, &format!("{}\n", line))
}
