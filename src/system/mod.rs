//! Host access
//!
//! Everything the tuning engine reads from or writes to the machine goes
//! through the [`Host`] trait: files under /proc, /sys and /etc, mounted
//! filesystem sizes, and helper programs such as `systemctl`, `mount` and
//! `rpm`.

mod host;
mod meminfo;
pub mod systemctl;

#[cfg(test)]
pub mod testing;

pub use host::*;
pub use meminfo::MemoryTotals;
