//! # paramtune - Linux tuning parameter reconciliation
//!
//! paramtune reads the live value of a tunable, reconciles it with a
//! recommended value and writes the result back. Every parameter follows
//! the same three steps:
//!
//! - **Inspect**: read the current value, or NA when the system does not
//!   provide the parameter
//! - **Optimise**: combine the current value and the recommendation into
//!   the value that should be applied
//! - **Apply**: write that value; writing a previously inspected value
//!   restores the earlier state
//!
//! Supported kinds are sysctls, block device schedulers and queue depths,
//! transparent hugepages and KSM, per-CPU power settings, `/dev/shm` size,
//! the pagecache limit, systemd services, security limits, logind's
//! `UserTasksMax`, installed packages and kernel command line parameters.
//!
//! ## Quick Start
//!
//! ```no_run
//! use paramtune::prelude::*;
//!
//! let tuner = Tuner::new(LinuxHost::new());
//! let ctx = tuner.context(PagecacheConfig::default()).unwrap();
//!
//! let current = tuner.inspect("vm.swappiness").unwrap();
//! let optimised = tuner.optimise(&current, &Recommendation::new("10"), &ctx);
//! if let Some(value) = optimised.parameter.resolved() {
//!     tuner.apply("vm.swappiness", value, false).unwrap();
//! }
//!
//! // restore
//! tuner.apply("vm.swappiness", current.current(), true).unwrap();
//! ```
//!
//! ## Running a note
//!
//! ```no_run
//! use paramtune::config::parse_assignment;
//! use paramtune::prelude::*;
//!
//! let tuner = Tuner::new(LinuxHost::new());
//! let ctx = tuner.context(PagecacheConfig::default()).unwrap();
//! let note = vec![
//!     parse_assignment("IO_SCHEDULER=none, noop").unwrap(),
//!     parse_assignment("KSM=0").unwrap(),
//! ];
//! let (_, reports) = tuner.run_note(&note, ctx, RunMode::Verify);
//! paramtune::tuning::write_text(&mut std::io::stdout(), &reports).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod param;
pub mod system;
pub mod tuning;

// Re-export commonly used types
pub use error::{Result, TuneError};
pub use param::{Parameter, Recommendation, Value};
pub use tuning::{RunMode, Tuner};

/// Re-exports for common usage
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use paramtune::prelude::*;
    //! ```

    pub use crate::config::{EngineConfig, PagecacheConfig};
    pub use crate::error::{Result, TuneError};
    pub use crate::param::{Compliance, Operator, Parameter, Recommendation, Value};
    pub use crate::system::{Host, LinuxHost};
    pub use crate::tuning::{OptimiseContext, RunMode, Tuner};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
