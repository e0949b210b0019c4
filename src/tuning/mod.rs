//! Parameter reconciliation
//!
//! One module per parameter kind, each exposing the same three steps:
//! `inspect` reads the live value, `optimise` reconciles it with a
//! recommendation without touching the system, and `apply` writes a value
//! back. [`Tuner`] classifies names and dispatches to the right kind.

pub mod block;
pub mod cpu;
mod engine;
pub mod grub;
pub mod limits;
pub mod login;
pub mod memory;
pub mod pagecache;
mod report;
pub mod rpm;
pub mod service;
pub mod sysctl;
pub mod vm;

pub use engine::*;
pub use report::*;

use crate::error::{Result, TuneError};
use crate::param::Value;
use crate::system::Host;

/// NA rules shared by most kinds.
///
/// A current value of NA means the feature is missing here and stays NA.
/// A recommendation of NA asks for nothing, so the current value is kept.
/// Returns `None` when both sides are concrete.
pub(crate) fn guard_na(current: &Value, recommended: &Value) -> Option<Value> {
    if current.is_na() {
        return Some(Value::Na);
    }
    if recommended.is_na() {
        return Some(current.clone());
    }
    None
}

/// Read a single-line kernel file, trimmed
pub(crate) fn read_trimmed(host: &dyn Host, path: &str) -> Result<Option<String>> {
    Ok(host.read(path)?.map(|s| s.trim().to_string()))
}

/// Write to a kernel file that must already exist
pub(crate) fn write_existing(host: &dyn Host, name: &str, path: &str, value: &str) -> Result<()> {
    if !host.exists(path) {
        return Err(TuneError::not_supported(
            name,
            format!("{} does not exist", path),
        ));
    }
    tracing::info!("{}: writing '{}' to {}", name, value, path);
    host.write(path, value)
}
