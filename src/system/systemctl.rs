//! Thin wrappers around `systemctl`

use super::Host;
use crate::error::{Result, TuneError};

const SYSTEMCTL: &str = "systemctl";

fn systemctl(host: &dyn Host, args: &[&str]) -> Result<()> {
    let command = format!("{} {}", SYSTEMCTL, args.join(" "));
    host.run(SYSTEMCTL, args)?.check(&command)?;
    Ok(())
}

/// Resolve a service name to a unit known to systemd.
///
/// Tries the exact name first, then `<name>.service`. A host without
/// systemctl knows no units.
pub fn unit_name(host: &dyn Host, name: &str) -> Result<Option<String>> {
    let output = match host.run(
        SYSTEMCTL,
        &["list-unit-files", "--no-legend", "--no-pager"],
    ) {
        Ok(output) if output.success => output,
        Ok(output) => {
            tracing::warn!("cannot list unit files: {}", output.stderr.trim());
            return Ok(None);
        }
        Err(e @ TuneError::Command { .. }) => {
            tracing::warn!("{}", e);
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let units: Vec<&str> = output
        .stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect();

    if units.contains(&name) {
        return Ok(Some(name.to_string()));
    }
    let service = format!("{}.service", name);
    if units.contains(&service.as_str()) {
        return Ok(Some(service));
    }
    Ok(None)
}

/// Whether the unit is currently active
pub fn is_active(host: &dyn Host, unit: &str) -> Result<bool> {
    Ok(host.run(SYSTEMCTL, &["is-active", unit])?.success)
}

/// Whether the system manager accepts start/stop jobs
pub fn is_system_running(host: &dyn Host) -> Result<bool> {
    let output = host.run(SYSTEMCTL, &["is-system-running"])?;
    Ok(matches!(
        output.stdout.trim(),
        "running" | "starting" | "degraded"
    ))
}

/// Enable the unit, then start it if the system is up
pub fn enable_start(host: &dyn Host, unit: &str) -> Result<()> {
    systemctl(host, &["enable", unit])?;
    if is_system_running(host)? {
        systemctl(host, &["start", unit])?;
    } else {
        tracing::debug!("system not running, skipping start of {}", unit);
    }
    Ok(())
}

/// Disable the unit, then stop it if the system is up
pub fn disable_stop(host: &dyn Host, unit: &str) -> Result<()> {
    systemctl(host, &["disable", unit])?;
    if is_system_running(host)? {
        systemctl(host, &["stop", unit])?;
    } else {
        tracing::debug!("system not running, skipping stop of {}", unit);
    }
    Ok(())
}
