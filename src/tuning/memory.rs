//! Size of the shared memory filesystem
//!
//! `VSZ_TMPFS_PERCENT` is the share of total memory (RAM plus swap) given
//! to /dev/shm; `ShmFileSystemSizeMB` is the resulting size. When /dev/shm
//! is not mounted both report `-1`.

use super::{guard_na, OptimiseContext};
use crate::error::{Result, TuneError};
use crate::param::Value;
use crate::system::{Host, MemoryTotals};

/// Mount point being sized
pub const SHM: &str = "/dev/shm";

/// Reported when /dev/shm is not mounted
pub const NOT_MOUNTED: &str = "-1";

/// Share used when no percentage is configured
pub const DEFAULT_TMPFS_PERCENT: u64 = 75;

/// Current value; unknown names give the empty value
pub fn inspect(host: &dyn Host, name: &str) -> Result<Value> {
    match name {
        "ShmFileSystemSizeMB" => Ok(Value::Text(match host.filesystem_size_mb(SHM)? {
            Some(size) => size.to_string(),
            None => NOT_MOUNTED.to_string(),
        })),
        "VSZ_TMPFS_PERCENT" => {
            let Some(size) = host.filesystem_size_mb(SHM)? else {
                return Ok(Value::text(NOT_MOUNTED));
            };
            let total = MemoryTotals::read(host)?.total_mb();
            if total == 0 {
                return Ok(Value::text(NOT_MOUNTED));
            }
            Ok(Value::Text((size * 100 / total).to_string()))
        }
        _ => Ok(Value::empty()),
    }
}

/// Size in MB for a percentage of total memory; 0 selects the default
/// share and larger values are capped at 100
pub fn size_for_percent(total_mb: u64, percent: u64) -> u64 {
    let percent = match percent {
        0 => DEFAULT_TMPFS_PERCENT,
        p => p.min(100),
    };
    total_mb * percent / 100
}

/// Reconcile a memory setting
pub fn optimise(name: &str, current: &Value, recommended: &Value, ctx: &OptimiseContext) -> Value {
    match name {
        "VSZ_TMPFS_PERCENT" => {
            if recommended.is_na() {
                return current.clone();
            }
            recommended.clone()
        }
        "ShmFileSystemSizeMB" => {
            if current.as_text().map(str::trim) == Some(NOT_MOUNTED) {
                return Value::text(NOT_MOUNTED);
            }
            if let Some(v) = guard_na(current, recommended) {
                return v;
            }
            match recommended.as_text().map(str::trim).unwrap_or_default() {
                "" | "0" => Value::Text(
                    size_for_percent(ctx.memory.total_mb(), ctx.tmpfs_percent).to_string(),
                ),
                wanted => Value::text(wanted),
            }
        }
        _ => Value::empty(),
    }
}

/// Resize /dev/shm. The percentage is only an input to the size and
/// writes nothing.
pub fn apply(host: &dyn Host, name: &str, value: &str) -> Result<()> {
    if name != "ShmFileSystemSizeMB" {
        tracing::debug!("{}: nothing to write", name);
        return Ok(());
    }
    let value = value.trim();
    if value == NOT_MOUNTED {
        tracing::debug!("{}: {} not mounted, skipping", name, SHM);
        return Ok(());
    }
    let size: u64 = value
        .parse()
        .map_err(|_| TuneError::invalid_value(name, value, "expected size in MB"))?;
    if host.filesystem_size_mb(SHM)?.is_none() {
        return Err(TuneError::not_supported(name, format!("{} is not mounted", SHM)));
    }

    let option = format!("remount,size={}M", size);
    let args = ["-o", option.as_str(), SHM];
    tracing::info!("{}: mount {}", name, args.join(" "));
    host.run("mount", &args)?
        .check(&format!("mount {}", args.join(" ")))?;
    Ok(())
}
