//! systemd-logind settings
//!
//! `UserTasksMax` is written to a logind drop-in owned by this tool. No
//! drop-in is a valid state (logind's own default applies), so an absent
//! file inspects as NA and the recommendation is adopted regardless.

use crate::error::Result;
use crate::param::Value;
use crate::system::Host;

/// Only setting this kind manages
pub const USER_TASKS_MAX: &str = "UserTasksMax";

/// Drop-in holding the setting
pub const DROP_IN: &str = "/etc/systemd/logind.conf.d/paramtune-UserTasksMax.conf";

/// Value from the drop-in; NA without one, empty for unknown names
pub fn inspect(host: &dyn Host, name: &str) -> Result<Value> {
    if name != USER_TASKS_MAX {
        return Ok(Value::empty());
    }
    let Some(content) = host.read(DROP_IN)? else {
        return Ok(Value::Na);
    };
    let value = content
        .lines()
        .filter_map(|l| l.trim().split_once('='))
        .find(|(k, _)| k.trim() == USER_TASKS_MAX)
        .map(|(_, v)| Value::text(v.trim()));
    Ok(value.unwrap_or(Value::Na))
}

/// The recommendation passes through
pub fn optimise(current: &Value, recommended: &Value) -> Value {
    if recommended.is_na() {
        return current.clone();
    }
    recommended.clone()
}

/// Write the drop-in, or remove it for NA
pub fn apply(host: &dyn Host, name: &str, value: &Value) -> Result<()> {
    if name != USER_TASKS_MAX {
        tracing::debug!("{}: not a login setting, nothing to write", name);
        return Ok(());
    }
    match value.as_text().map(str::trim) {
        Some(v) if !v.is_empty() => {
            tracing::info!("{}: writing '{}' to {}", name, v, DROP_IN);
            host.write(DROP_IN, &format!("[Login]\n{}={}\n", USER_TASKS_MAX, v))
        }
        _ => {
            if host.remove(DROP_IN)? {
                tracing::info!("{}: removed {}", name, DROP_IN);
            }
            Ok(())
        }
    }
}
