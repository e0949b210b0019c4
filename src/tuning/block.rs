//! Block device queue settings
//!
//! `IO_SCHEDULER_<dev>` selects the I/O scheduler from a preference list,
//! `NRREQ_<dev>` sets the queue depth. Bare `IO_SCHEDULER` and `NRREQ`
//! expand to every device that has the queue file.

use super::{guard_na, read_trimmed, write_existing};
use crate::error::Result;
use crate::param::{scope_of, Value, IO_SCHEDULER_PREFIX, NRREQ_PREFIX};
use crate::system::Host;

const BLOCK_DIR: &str = "/sys/block";
const SCHEDULER_FILE: &str = "scheduler";
const NR_REQUESTS_FILE: &str = "nr_requests";

/// Queue depth used when a note asks for `0`
pub const DEFAULT_NR_REQUESTS: &str = "1024";

fn queue_path(dev: &str, file: &str) -> String {
    format!("{}/{}/queue/{}", BLOCK_DIR, dev, file)
}

/// Device part of a scheduler or queue depth name
pub fn device_of(name: &str) -> Option<&str> {
    scope_of(name, IO_SCHEDULER_PREFIX).or_else(|| scope_of(name, NRREQ_PREFIX))
}

/// Devices exposing the given queue file
fn devices_with(host: &dyn Host, file: &str) -> Result<Vec<String>> {
    Ok(host
        .list(BLOCK_DIR)?
        .into_iter()
        .filter(|dev| host.exists(&queue_path(dev, file)))
        .collect())
}

/// One scoped name per device for a bare prefix; other names unchanged
pub fn expand(host: &dyn Host, name: &str) -> Result<Vec<String>> {
    let file = match name {
        IO_SCHEDULER_PREFIX => SCHEDULER_FILE,
        NRREQ_PREFIX => NR_REQUESTS_FILE,
        _ => return Ok(vec![name.to_string()]),
    };
    let names: Vec<String> = devices_with(host, file)?
        .into_iter()
        .map(|dev| format!("{}_{}", name, dev))
        .collect();
    tracing::debug!("{} expands to {} device(s)", name, names.len());
    Ok(names)
}

/// Split a scheduler file (`mq-deadline kyber [bfq] none`) into the active
/// entry and the advertised choices
pub fn parse_schedulers(content: &str) -> (Option<String>, Vec<String>) {
    let mut active = None;
    let mut choices = Vec::new();
    for token in content.split_whitespace() {
        match token.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            Some(name) => {
                active = Some(name.to_string());
                choices.push(name.to_string());
            }
            None => choices.push(token.to_string()),
        }
    }
    if active.is_none() && choices.len() == 1 {
        active = choices.first().cloned();
    }
    (active, choices)
}

/// Active scheduler and advertised choices of a device
pub fn inspect_scheduler(host: &dyn Host, dev: &str) -> Result<(Value, Vec<String>)> {
    let Some(content) = host.read(&queue_path(dev, SCHEDULER_FILE))? else {
        tracing::debug!("{}: no scheduler file", dev);
        return Ok((Value::Na, Vec::new()));
    };
    let (active, choices) = parse_schedulers(&content);
    let current = active.map(Value::Text).unwrap_or(Value::Na);
    Ok((current, choices))
}

/// Queue depth of a device
pub fn inspect_nr_requests(host: &dyn Host, dev: &str) -> Result<Value> {
    Ok(read_trimmed(host, &queue_path(dev, NR_REQUESTS_FILE))?
        .map(Value::Text)
        .unwrap_or(Value::Na))
}

/// Pick the first scheduler of a comma-separated preference list that the
/// device offers. Returns the value and whether it is supported.
///
/// Matching ignores case and surrounding spaces; the device's spelling is
/// returned. Without a match the first preference comes back unsupported.
pub fn optimise_scheduler(current: &Value, recommended: &Value, choices: &[String]) -> (Value, bool) {
    if current.is_na() {
        return (Value::Na, false);
    }
    if let Some(v) = guard_na(current, recommended) {
        return (v, true);
    }
    let wanted = recommended.as_text().unwrap_or_default();
    let candidates: Vec<&str> = wanted
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();

    for candidate in &candidates {
        if let Some(choice) = choices.iter().find(|c| c.eq_ignore_ascii_case(candidate)) {
            return (Value::Text(choice.clone()), true);
        }
    }

    match candidates.first() {
        Some(first) => {
            tracing::warn!(
                "scheduler '{}' not offered (available: {})",
                wanted,
                choices.join(" ")
            );
            (Value::text(*first), false)
        }
        None => (Value::empty(), true),
    }
}

/// `0` means "use the default depth"; anything else is taken as is.
/// The device is not consulted.
pub fn optimise_nr_requests(current: &Value, recommended: &Value) -> Value {
    match recommended.as_text().map(str::trim) {
        Some("0") => Value::text(DEFAULT_NR_REQUESTS),
        Some(v) => Value::text(v),
        None => current.clone(),
    }
}

/// Write the scheduler of a device
pub fn apply_scheduler(host: &dyn Host, name: &str, dev: &str, value: &str) -> Result<()> {
    write_existing(host, name, &queue_path(dev, SCHEDULER_FILE), value.trim())
}

/// Write the queue depth of a device
pub fn apply_nr_requests(host: &dyn Host, name: &str, dev: &str, value: &str) -> Result<()> {
    write_existing(host, name, &queue_path(dev, NR_REQUESTS_FILE), value.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::testing::FakeHost;

    fn host() -> FakeHost {
        FakeHost::new()
            .with_file("/sys/block/sda/queue/scheduler", "mq-deadline kyber [bfq] none\n")
            .with_file("/sys/block/sda/queue/nr_requests", "64\n")
            .with_file("/sys/block/nvme0n1/queue/scheduler", "[none]\n")
            .with_file("/sys/block/nvme0n1/queue/nr_requests", "1023\n")
            .with_file("/sys/block/loop0/uevent", "")
    }

    fn choices(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_schedulers() {
        let (active, all) = parse_schedulers("mq-deadline kyber [bfq] none");
        assert_eq!(active.as_deref(), Some("bfq"));
        assert_eq!(all, choices(&["mq-deadline", "kyber", "bfq", "none"]));

        let (active, _) = parse_schedulers("none");
        assert_eq!(active.as_deref(), Some("none"));

        let (active, _) = parse_schedulers("noop deadline");
        assert_eq!(active, None);
    }

    #[test]
    fn test_expand() {
        let host = host();
        assert_eq!(
            expand(&host, "IO_SCHEDULER").unwrap(),
            vec!["IO_SCHEDULER_nvme0n1", "IO_SCHEDULER_sda"]
        );
        assert_eq!(expand(&host, "NRREQ").unwrap().len(), 2);
        assert_eq!(expand(&host, "NRREQ_sda").unwrap(), vec!["NRREQ_sda"]);
    }

    #[test]
    fn test_inspect() {
        let host = host();
        let (current, all) = inspect_scheduler(&host, "sda").unwrap();
        assert_eq!(current, Value::text("bfq"));
        assert_eq!(all.len(), 4);

        let (current, all) = inspect_scheduler(&host, "sdz").unwrap();
        assert!(current.is_na());
        assert!(all.is_empty());

        assert_eq!(inspect_nr_requests(&host, "sda").unwrap(), Value::text("64"));
        assert!(inspect_nr_requests(&host, "sdz").unwrap().is_na());
    }

    #[test]
    fn test_optimise_scheduler_preference_list() {
        let offered = choices(&["mq-deadline", "kyber", "bfq", "none"]);
        let current = Value::text("bfq");

        assert_eq!(
            optimise_scheduler(&current, &Value::text("noop, none"), &offered),
            (Value::text("none"), true)
        );
        assert_eq!(
            optimise_scheduler(&current, &Value::text("NoOp,NoNe"), &offered),
            (Value::text("none"), true)
        );
        assert_eq!(
            optimise_scheduler(&current, &Value::text(" noop , none "), &offered),
            (Value::text("none"), true)
        );
        assert_eq!(
            optimise_scheduler(&current, &Value::text("MQ-Deadline"), &offered),
            (Value::text("mq-deadline"), true)
        );
    }

    #[test]
    fn test_optimise_scheduler_unsupported() {
        let offered = choices(&["none"]);
        assert_eq!(
            optimise_scheduler(&Value::text("none"), &Value::text("hugo"), &offered),
            (Value::text("hugo"), false)
        );
        assert_eq!(
            optimise_scheduler(&Value::Na, &Value::text("none"), &[]),
            (Value::Na, false)
        );
    }

    #[test]
    fn test_optimise_nr_requests() {
        let current = Value::text("64");
        assert_eq!(optimise_nr_requests(&current, &Value::text("0")), Value::text("1024"));
        assert_eq!(optimise_nr_requests(&current, &Value::text("512")), Value::text("512"));
        assert_eq!(optimise_nr_requests(&current, &Value::text("128")), Value::text("128"));
        assert_eq!(optimise_nr_requests(&current, &Value::Na), current);
    }

    #[test]
    fn test_optimise_nr_requests_ignores_missing_device() {
        assert_eq!(optimise_nr_requests(&Value::Na, &Value::text("0")), Value::text("1024"));
        assert_eq!(optimise_nr_requests(&Value::Na, &Value::text("128")), Value::text("128"));
        assert!(optimise_nr_requests(&Value::Na, &Value::Na).is_na());
    }

    #[test]
    fn test_apply() {
        let host = host();
        apply_scheduler(&host, "IO_SCHEDULER_sda", "sda", "none").unwrap();
        assert_eq!(
            host.file("/sys/block/sda/queue/scheduler").as_deref(),
            Some("none")
        );
        apply_nr_requests(&host, "NRREQ_sda", "sda", "1024").unwrap();
        assert_eq!(
            host.file("/sys/block/sda/queue/nr_requests").as_deref(),
            Some("1024")
        );
        assert!(apply_scheduler(&host, "IO_SCHEDULER_sdz", "sdz", "none")
            .unwrap_err()
            .is_absent());
    }
}
