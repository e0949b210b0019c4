//! Parameter kinds and name classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of scheduler parameters, scoped by device (`IO_SCHEDULER_sda`)
pub const IO_SCHEDULER_PREFIX: &str = "IO_SCHEDULER";
/// Prefix of queue depth parameters, scoped by device (`NRREQ_sda`)
pub const NRREQ_PREFIX: &str = "NRREQ";
/// Prefix of service parameters (`systemd:uuidd.socket`)
pub const SERVICE_PREFIX: &str = "systemd:";
/// Prefix of resource limit parameters (`LIMIT_@sapsys_soft_nofile`)
pub const LIMIT_PREFIX: &str = "LIMIT_";
/// Prefix of package version parameters (`rpm:glibc`)
pub const RPM_PREFIX: &str = "rpm:";
/// Prefix of boot parameters (`grub:processor.max_cstate`)
pub const GRUB_PREFIX: &str = "grub:";

/// Names owned by the pagecache kind. One of them is a sysctl key, so the
/// pagecache kind is matched before the generic sysctl pattern.
pub const PAGECACHE_NAMES: [&str; 3] = [
    "ENABLE_PAGECACHE_LIMIT",
    "OVERRIDE_PAGECACHE_LIMIT_MB",
    "vm.pagecache_limit_ignore_dirty",
];

/// The family a tunable belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// Kernel setting under /proc/sys
    Sysctl,
    /// Block device I/O scheduler
    IoScheduler,
    /// Block device queue depth
    NrRequests,
    /// Virtual memory switch (THP, KSM)
    Vm,
    /// Per-CPU power setting
    Cpu,
    /// Shared memory filesystem sizing
    Memory,
    /// Pagecache limit
    Pagecache,
    /// systemd service run state
    Service,
    /// PAM resource limit
    Limits,
    /// systemd-logind setting
    Login,
    /// Installed package version
    Rpm,
    /// Kernel command line parameter
    Grub,
    /// Anything else
    Unknown,
}

impl ParamKind {
    /// Resolve the kind from a parameter name
    pub fn classify(name: &str) -> Self {
        if PAGECACHE_NAMES.contains(&name) {
            return ParamKind::Pagecache;
        }
        if is_scoped(name, IO_SCHEDULER_PREFIX) {
            return ParamKind::IoScheduler;
        }
        if is_scoped(name, NRREQ_PREFIX) {
            return ParamKind::NrRequests;
        }
        match name {
            "THP" | "KSM" => return ParamKind::Vm,
            "force_latency" | "energy_perf_bias" | "governor" => return ParamKind::Cpu,
            "VSZ_TMPFS_PERCENT" | "ShmFileSystemSizeMB" => return ParamKind::Memory,
            "UserTasksMax" => return ParamKind::Login,
            _ => {}
        }
        if name.starts_with(SERVICE_PREFIX) {
            return ParamKind::Service;
        }
        if name.starts_with(LIMIT_PREFIX) {
            return ParamKind::Limits;
        }
        if name.starts_with(RPM_PREFIX) {
            return ParamKind::Rpm;
        }
        if name.starts_with(GRUB_PREFIX) {
            return ParamKind::Grub;
        }
        if is_sysctl_key(name) {
            return ParamKind::Sysctl;
        }
        ParamKind::Unknown
    }

    /// Short label for reports
    pub fn label(&self) -> &'static str {
        match self {
            ParamKind::Sysctl => "sysctl",
            ParamKind::IoScheduler => "scheduler",
            ParamKind::NrRequests => "nr_requests",
            ParamKind::Vm => "vm",
            ParamKind::Cpu => "cpu",
            ParamKind::Memory => "mem",
            ParamKind::Pagecache => "pagecache",
            ParamKind::Service => "service",
            ParamKind::Limits => "limits",
            ParamKind::Login => "login",
            ParamKind::Rpm => "rpm",
            ParamKind::Grub => "grub",
            ParamKind::Unknown => "unknown",
        }
    }

    /// Kinds that only report and never write
    pub fn is_report_only(&self) -> bool {
        matches!(self, ParamKind::Rpm | ParamKind::Grub | ParamKind::Unknown)
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `PREFIX` alone or `PREFIX_<scope>`
fn is_scoped(name: &str, prefix: &str) -> bool {
    match name.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.len() > 1 && rest.starts_with('_'),
        None => false,
    }
}

/// Scope of a scoped name (`sda` for `IO_SCHEDULER_sda`)
pub fn scope_of<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    name.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .filter(|scope| !scope.is_empty())
}

fn is_sysctl_key(name: &str) -> bool {
    name.contains('.')
        && !name.starts_with('.')
        && !name.ends_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/'))
}
