//! Transparent hugepages and kernel samepage merging

use super::{guard_na, read_trimmed, write_existing};
use crate::error::Result;
use crate::param::Value;
use crate::system::Host;

const THP_PATH: &str = "/sys/kernel/mm/transparent_hugepage/enabled";
const KSM_PATH: &str = "/sys/kernel/mm/ksm/run";

const THP_VALUES: [&str; 3] = ["always", "madvise", "never"];
const KSM_VALUES: [&str; 2] = ["0", "1"];

fn path_of(name: &str) -> Option<&'static str> {
    match name {
        "THP" => Some(THP_PATH),
        "KSM" => Some(KSM_PATH),
        _ => None,
    }
}

/// Current switch value; THP reports the bracketed mode
pub fn inspect(host: &dyn Host, name: &str) -> Result<Value> {
    let Some(path) = path_of(name) else {
        return Ok(Value::Na);
    };
    let Some(content) = read_trimmed(host, path)? else {
        return Ok(Value::Na);
    };
    if name == "THP" {
        let active = content
            .split_whitespace()
            .find_map(|t| t.strip_prefix('[').and_then(|t| t.strip_suffix(']')))
            .unwrap_or(content.as_str());
        return Ok(Value::text(active));
    }
    Ok(Value::Text(content))
}

/// Accept whitelisted values, otherwise fall back to the safe setting.
/// Unknown switches pass the recommendation through.
pub fn optimise(name: &str, current: &Value, recommended: &Value) -> Value {
    if let Some(v) = guard_na(current, recommended) {
        return v;
    }
    let wanted = recommended.as_text().map(str::trim).unwrap_or_default();
    let (allowed, fallback): (&[&str], &str) = match name {
        "THP" => (&THP_VALUES[..], "never"),
        "KSM" => (&KSM_VALUES[..], "0"),
        _ => return recommended.clone(),
    };
    if allowed.contains(&wanted) {
        Value::text(wanted)
    } else {
        tracing::warn!("{}: '{}' is not valid, using '{}'", name, wanted, fallback);
        Value::text(fallback)
    }
}

/// Write a switch
pub fn apply(host: &dyn Host, name: &str, value: &str) -> Result<()> {
    match path_of(name) {
        Some(path) => write_existing(host, name, path, value.trim()),
        None => {
            tracing::debug!("{}: not a vm switch, nothing to write", name);
            Ok(())
        }
    }
}
