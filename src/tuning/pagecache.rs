//! Pagecache limit
//!
//! Three names map onto two kernel settings. The limit itself comes from
//! the [`PagecacheConfig`] loaded for the run, or is derived from main
//! memory; optimisation hands back the updated configuration instead of
//! changing shared state.

use super::{guard_na, sysctl};
use crate::config::PagecacheConfig;
use crate::error::Result;
use crate::param::Value;
use crate::system::{Host, MemoryTotals};

/// Kernel setting holding the limit in MB
pub const LIMIT_KEY: &str = "vm.pagecache_limit_mb";
/// Kernel setting controlling how dirty pages are treated
pub const IGNORE_DIRTY_KEY: &str = "vm.pagecache_limit_ignore_dirty";

const ENABLE: &str = "ENABLE_PAGECACHE_LIMIT";
const OVERRIDE: &str = "OVERRIDE_PAGECACHE_LIMIT_MB";

/// Percentage of main memory used when the limit is derived
pub const ALGORITHM_PERCENT: u64 = 2;

fn read_limit(host: &dyn Host) -> Result<Option<u64>> {
    Ok(sysctl::read(host, LIMIT_KEY)?.map(|v| v.trim().parse().unwrap_or(0)))
}

/// Current value; NA when the kernel has no pagecache limit
pub fn inspect(host: &dyn Host, name: &str) -> Result<Value> {
    match name {
        ENABLE => Ok(match read_limit(host)? {
            Some(limit) if limit > 0 => Value::text("yes"),
            Some(_) => Value::text("no"),
            None => Value::Na,
        }),
        OVERRIDE => Ok(match read_limit(host)? {
            Some(limit) if limit > 0 => Value::Text(limit.to_string()),
            Some(_) => Value::empty(),
            None => Value::Na,
        }),
        IGNORE_DIRTY_KEY => sysctl::inspect(host, IGNORE_DIRTY_KEY),
        _ => Ok(Value::empty()),
    }
}

/// Reconcile a pagecache setting. Returns the value and, when the setting
/// changed it, the new configuration.
pub fn optimise(
    name: &str,
    current: &Value,
    recommended: &Value,
    config: &PagecacheConfig,
    memory: &MemoryTotals,
) -> (Value, Option<PagecacheConfig>) {
    if let Some(v) = guard_na(current, recommended) {
        return (v, None);
    }
    let wanted = recommended
        .as_text()
        .map(|s| s.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match name {
        ENABLE => match wanted.as_str() {
            "yes" | "no" => (Value::Text(wanted), None),
            _ => (Value::text("no"), None),
        },
        IGNORE_DIRTY_KEY => {
            let ignore_dirty = match wanted.as_str() {
                "0" => 0,
                "2" => 2,
                _ => 1,
            };
            let updated = PagecacheConfig {
                ignore_dirty,
                ..*config
            };
            (Value::Text(ignore_dirty.to_string()), Some(updated))
        }
        OVERRIDE => {
            if config.limit_mb > 0 {
                return (Value::Text(config.limit_mb.to_string()), None);
            }
            if config.enabled && config.use_algorithm {
                let limit_mb = memory.main_mb * ALGORITHM_PERCENT / 100;
                tracing::debug!("derived pagecache limit of {} MB", limit_mb);
                let updated = PagecacheConfig {
                    limit_mb,
                    ..*config
                };
                return (Value::Text(limit_mb.to_string()), Some(updated));
            }
            (Value::empty(), None)
        }
        _ => (recommended.clone(), None),
    }
}

/// Write a pagecache setting. An empty limit or a disabled switch clears
/// the limit.
pub fn apply(host: &dyn Host, name: &str, value: &str) -> Result<()> {
    let value = value.trim();
    match name {
        OVERRIDE => sysctl::write(host, LIMIT_KEY, if value.is_empty() { "0" } else { value }),
        ENABLE if value.eq_ignore_ascii_case("no") => sysctl::write(host, LIMIT_KEY, "0"),
        ENABLE => {
            tracing::debug!("{}: limit is set through {}", name, OVERRIDE);
            Ok(())
        }
        IGNORE_DIRTY_KEY if value.is_empty() => Ok(()),
        IGNORE_DIRTY_KEY => sysctl::write(host, IGNORE_DIRTY_KEY, value),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::testing::FakeHost;

    const LIMIT_PATH: &str = "/proc/sys/vm/pagecache_limit_mb";
    const DIRTY_PATH: &str = "/proc/sys/vm/pagecache_limit_ignore_dirty";

    fn memory() -> MemoryTotals {
        MemoryTotals {
            main_mb: 32000,
            swap_mb: 2000,
        }
    }

    fn enabled() -> PagecacheConfig {
        PagecacheConfig {
            enabled: true,
            ..PagecacheConfig::default()
        }
    }

    #[test]
    fn test_inspect() {
        let host = FakeHost::new()
            .with_file(LIMIT_PATH, "0\n")
            .with_file(DIRTY_PATH, "1\n");
        assert_eq!(inspect(&host, ENABLE).unwrap(), Value::text("no"));
        assert_eq!(inspect(&host, OVERRIDE).unwrap(), Value::empty());
        assert_eq!(inspect(&host, IGNORE_DIRTY_KEY).unwrap(), Value::text("1"));
        assert_eq!(inspect(&host, "UNKOWN").unwrap(), Value::empty());

        let host = FakeHost::new().with_file(LIMIT_PATH, "641\n");
        assert_eq!(inspect(&host, ENABLE).unwrap(), Value::text("yes"));
        assert_eq!(inspect(&host, OVERRIDE).unwrap(), Value::text("641"));

        assert!(inspect(&FakeHost::new(), ENABLE).unwrap().is_na());
    }

    #[test]
    fn test_optimise_switches() {
        let cfg = PagecacheConfig::default();
        let mem = memory();
        let cur = Value::text("no");
        assert_eq!(optimise("UNKNOWN", &cur, &Value::text("unknown"), &cfg, &mem).0, Value::text("unknown"));
        assert_eq!(optimise(ENABLE, &cur, &Value::text("yes"), &cfg, &mem).0, Value::text("yes"));
        assert_eq!(optimise(ENABLE, &cur, &Value::text("no"), &cfg, &mem).0, Value::text("no"));
        assert_eq!(optimise(ENABLE, &cur, &Value::text("unknown"), &cfg, &mem).0, Value::text("no"));
    }

    #[test]
    fn test_optimise_ignore_dirty_updates_config() {
        let cfg = PagecacheConfig::default();
        let mem = memory();
        let cur = Value::text("1");
        for (wanted, expected) in [("2", 2u8), ("1", 1), ("0", 0), ("unknown", 1)] {
            let (value, updated) = optimise(IGNORE_DIRTY_KEY, &cur, &Value::text(wanted), &cfg, &mem);
            assert_eq!(value, Value::Text(expected.to_string()));
            assert_eq!(updated.unwrap().ignore_dirty, expected);
        }
    }

    #[test]
    fn test_optimise_limit() {
        let mem = memory();
        let cur = Value::empty();
        let rec = Value::text("unknown");

        // nothing configured, limit disabled
        let (value, updated) = optimise(OVERRIDE, &cur, &rec, &PagecacheConfig::default(), &mem);
        assert_eq!(value, Value::empty());
        assert!(updated.is_none());

        // enabled, derived from main memory
        let (value, updated) = optimise(OVERRIDE, &cur, &rec, &enabled(), &mem);
        assert_eq!(value, Value::text("640"));
        assert_eq!(updated.unwrap().limit_mb, 640);

        // enabled but algorithm off
        let cfg = enabled().with_algorithm(false);
        assert_eq!(optimise(OVERRIDE, &cur, &rec, &cfg, &mem).0, Value::empty());

        // configured limit wins
        let cfg = PagecacheConfig {
            limit_mb: 1000,
            ..enabled()
        };
        let (value, updated) = optimise(OVERRIDE, &cur, &rec, &cfg, &mem);
        assert_eq!(value, Value::text("1000"));
        assert!(updated.is_none());
    }

    #[test]
    fn test_apply() {
        let host = FakeHost::new()
            .with_file(LIMIT_PATH, "0\n")
            .with_file(DIRTY_PATH, "1\n");
        apply(&host, OVERRIDE, "640").unwrap();
        assert_eq!(host.file(LIMIT_PATH).as_deref(), Some("640"));
        apply(&host, IGNORE_DIRTY_KEY, "2").unwrap();
        assert_eq!(host.file(DIRTY_PATH).as_deref(), Some("2"));
        apply(&host, ENABLE, "no").unwrap();
        assert_eq!(host.file(LIMIT_PATH).as_deref(), Some("0"));
        apply(&host, OVERRIDE, "").unwrap();
        assert_eq!(host.file(LIMIT_PATH).as_deref(), Some("0"));

        assert!(apply(&FakeHost::new(), OVERRIDE, "640").unwrap_err().is_absent());
    }
}
