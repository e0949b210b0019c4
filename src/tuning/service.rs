//! systemd services
//!
//! `systemd:<unit>` is `start` when the unit is active and `stop`
//! otherwise. Starting also enables the unit and stopping disables it, so
//! the state survives a reboot.

use crate::error::{Result, TuneError};
use crate::param::{Value, SERVICE_PREFIX};
use crate::system::{systemctl, Host};

/// Units that must always run
const PINNED_RUNNING: [&str; 1] = ["uuidd.socket"];

fn unit_of(name: &str) -> &str {
    name.strip_prefix(SERVICE_PREFIX).unwrap_or(name)
}

/// `start`/`stop`, or NA if systemd does not know the unit
pub fn inspect(host: &dyn Host, name: &str) -> Result<Value> {
    let Some(unit) = systemctl::unit_name(host, unit_of(name))? else {
        tracing::debug!("{}: unit not known to systemd", name);
        return Ok(Value::Na);
    };
    let state = if systemctl::is_active(host, &unit)? {
        "start"
    } else {
        "stop"
    };
    Ok(Value::text(state))
}

/// Adopt `start` or `stop`; anything else keeps the current state
pub fn optimise(name: &str, current: &Value, recommended: &Value) -> Value {
    if current.is_na() {
        return Value::Na;
    }
    let unit = unit_of(name);
    if PINNED_RUNNING.contains(&unit) {
        return Value::text("start");
    }
    match recommended.as_text().map(|s| s.trim().to_ascii_lowercase()) {
        Some(state) if state == "start" || state == "stop" => Value::Text(state),
        _ => current.clone(),
    }
}

/// Start and enable, or stop and disable the unit. Unknown units are left
/// alone.
pub fn apply(host: &dyn Host, name: &str, value: &str) -> Result<()> {
    let Some(unit) = systemctl::unit_name(host, unit_of(name))? else {
        tracing::warn!("{}: unit not known to systemd, skipping", name);
        return Ok(());
    };
    match value.trim() {
        "start" => {
            tracing::info!("{}: enabling and starting {}", name, unit);
            systemctl::enable_start(host, &unit)
        }
        "stop" => {
            tracing::info!("{}: disabling and stopping {}", name, unit);
            systemctl::disable_stop(host, &unit)
        }
        other => Err(TuneError::invalid_value(name, other, "expected 'start' or 'stop'")),
    }
}
