//! Installed package versions
//!
//! Report only. A system complies when the installed `version-release` is
//! at least the recommended one, compared segment by segment the way rpm
//! does.

use crate::error::{Result, TuneError};
use crate::param::{Value, RPM_PREFIX};
use crate::system::Host;
use std::cmp::Ordering;

/// Installed `version-release`, NA if the package (or rpm) is missing
pub fn inspect(host: &dyn Host, name: &str) -> Result<Value> {
    let package = name.strip_prefix(RPM_PREFIX).unwrap_or(name);
    let output = match host.run("rpm", &["-q", "--qf", "%{VERSION}-%{RELEASE}", package]) {
        Ok(output) => output,
        Err(e @ TuneError::Command { .. }) => {
            tracing::warn!("{}", e);
            return Ok(Value::Na);
        }
        Err(e) => return Err(e),
    };
    if !output.success {
        tracing::debug!("{}: package not installed", package);
        return Ok(Value::Na);
    }
    let version = output.stdout.trim();
    if version.is_empty() {
        return Ok(Value::Na);
    }
    Ok(Value::text(version))
}

/// Alphanumeric segments of a version string
fn segments(version: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = version;
    loop {
        rest = rest.trim_start_matches(|c: char| !c.is_ascii_alphanumeric());
        let Some(first) = rest.chars().next() else {
            break;
        };
        let boundary = if first.is_ascii_digit() {
            rest.find(|c: char| !c.is_ascii_digit())
        } else {
            rest.find(|c: char| !c.is_ascii_alphabetic())
        };
        let end = boundary.unwrap_or(rest.len());
        out.push(&rest[..end]);
        rest = &rest[end..];
    }
    out
}

fn compare_segment(a: &str, b: &str) -> Ordering {
    let a_num = a.starts_with(|c: char| c.is_ascii_digit());
    let b_num = b.starts_with(|c: char| c.is_ascii_digit());
    match (a_num, b_num) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => {
            let a = a.trim_start_matches('0');
            let b = b.trim_start_matches('0');
            a.len().cmp(&b.len()).then_with(|| a.cmp(b))
        }
        (false, false) => a.cmp(b),
    }
}

/// Compare two version strings segment by segment
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a = segments(a);
    let b = segments(b);
    for (x, y) in a.iter().zip(b.iter()) {
        match compare_segment(x, y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// Whether `installed` is the same as or newer than `wanted`. Releases are
/// only compared when `wanted` has one.
pub fn version_at_least(installed: &str, wanted: &str) -> bool {
    let (inst_version, inst_release) = split_release(installed.trim());
    let (want_version, want_release) = split_release(wanted.trim());

    match compare_versions(inst_version, want_version) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => match want_release {
            None => true,
            Some(want) => compare_versions(inst_release.unwrap_or(""), want) != Ordering::Less,
        },
    }
}

fn split_release(full: &str) -> (&str, Option<&str>) {
    match full.rsplit_once('-') {
        Some((version, release)) => (version, Some(release)),
        None => (full, None),
    }
}
