//! Kernel settings under /proc/sys
//!
//! Multi-field settings such as `kernel.sem` are reported with tab
//! separators. A recommendation is only usable when it has exactly as many
//! fields as the current value.

use super::{guard_na, write_existing};
use crate::error::Result;
use crate::param::Value;
use crate::system::Host;

/// Path of a sysctl key
pub fn path_of(key: &str) -> String {
    format!("/proc/sys/{}", key.replace('.', "/"))
}

/// Read a key, tab-separating its fields; `None` if the key does not exist
pub fn read(host: &dyn Host, key: &str) -> Result<Option<String>> {
    Ok(host
        .read(&path_of(key))?
        .map(|content| content.split_whitespace().collect::<Vec<_>>().join("\t")))
}

/// Current value of a key, NA if the kernel lacks it
pub fn inspect(host: &dyn Host, key: &str) -> Result<Value> {
    match read(host, key)? {
        Some(value) => Ok(Value::Text(value)),
        None => {
            tracing::debug!("{}: key not present in this kernel", key);
            Ok(Value::Na)
        }
    }
}

/// Reconcile field tuples.
///
/// An empty current value or a field count mismatch yields the empty
/// value, which is never applied.
pub fn optimise(current: &Value, recommended: &Value) -> Value {
    if let Some(v) = guard_na(current, recommended) {
        return v;
    }
    let (Some(current), Some(wanted)) = (current.as_text(), recommended.as_text()) else {
        return Value::empty();
    };

    let current_fields: Vec<&str> = current.split_whitespace().collect();
    let wanted_fields: Vec<&str> = wanted.split_whitespace().collect();

    if current_fields.is_empty() {
        return Value::empty();
    }
    if current_fields.len() != wanted_fields.len() {
        tracing::warn!(
            "field count of '{}' does not match current value '{}'",
            wanted,
            current
        );
        return Value::empty();
    }
    Value::Text(wanted_fields.join("\t"))
}

/// Write a key that must exist
pub fn write(host: &dyn Host, key: &str, value: &str) -> Result<()> {
    write_existing(host, key, &path_of(key), value)
}
