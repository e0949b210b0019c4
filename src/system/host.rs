//! Access to the host being tuned
//!
//! Every read and write the engine performs goes through [`Host`]. The
//! production implementation, [`LinuxHost`], resolves absolute paths against
//! a root directory (normally `/`) so a whole tuning run can be pointed at a
//! scratch tree.

use crate::error::{IoResultExt, Result, TuneError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Captured result of a helper program
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Exit status was zero
    pub success: bool,
    /// Exit code, if the process exited normally
    pub code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Successful run with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed run with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Turn a failed run into [`TuneError::CommandFailed`]
    pub fn check(self, command: &str) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(TuneError::CommandFailed {
                command: command.to_string(),
                code: self.code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Operations the engine needs from the operating system.
///
/// "Not found" is never an error here: reads return `None`, removals
/// return `false`, listings come back empty.
pub trait Host {
    /// Read a file; `None` if it does not exist
    fn read(&self, path: &str) -> Result<Option<String>>;

    /// Write a file, creating parent directories as needed
    fn write(&self, path: &str, content: &str) -> Result<()>;

    /// Remove a file; `false` if it was already gone
    fn remove(&self, path: &str) -> Result<bool>;

    /// Entry names of a directory, sorted; empty if it does not exist
    fn list(&self, dir: &str) -> Result<Vec<String>>;

    /// Whether a path exists
    fn exists(&self, path: &str) -> bool;

    /// Size in MB of the filesystem mounted at `mount_point`; `None` when
    /// nothing is mounted there
    fn filesystem_size_mb(&self, mount_point: &str) -> Result<Option<u64>>;

    /// Run a helper program to completion
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;
}

/// Whether `/proc/mounts` content lists a mount at `mount_point`
pub fn is_mounted(mounts: &str, mount_point: &str) -> bool {
    mounts
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .any(|mp| mp == mount_point)
}

/// The real system, with file paths resolved below `root`
#[derive(Debug, Clone)]
pub struct LinuxHost {
    root: PathBuf,
}

impl Default for LinuxHost {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxHost {
    /// Host rooted at `/`
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("/"),
        }
    }

    /// Host rooted at a different directory. Helper programs still run
    /// against the live system.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an absolute system path below the root
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl Host for LinuxHost {
    fn read(&self, path: &str) -> Result<Option<String>> {
        let full = self.resolve(path);
        match std::fs::read_to_string(&full) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TuneError::io(full, e)),
        }
    }

    fn write(&self, path: &str, content: &str) -> Result<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).with_path(parent)?;
            }
        }
        tracing::debug!("write {:?} <- '{}'", full, content.trim_end());
        std::fs::write(&full, content).with_path(&full)
    }

    fn remove(&self, path: &str) -> Result<bool> {
        let full = self.resolve(path);
        match std::fs::remove_file(&full) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(TuneError::io(full, e)),
        }
    }

    fn list(&self, dir: &str) -> Result<Vec<String>> {
        let full = self.resolve(dir);
        let entries = match std::fs::read_dir(&full) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(TuneError::io(full, e)),
        };

        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn filesystem_size_mb(&self, mount_point: &str) -> Result<Option<u64>> {
        let mounts = self.read("/proc/mounts")?.unwrap_or_default();
        if !is_mounted(&mounts, mount_point) {
            return Ok(None);
        }

        let full = self.resolve(mount_point);
        Ok(Some(statvfs_bytes(&full)? / (1024 * 1024)))
    }

    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        tracing::debug!("run {} {}", program, args.join(" "));
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| TuneError::Command {
                program: program.to_string(),
                message: e.to_string(),
            })?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(unix)]
fn statvfs_bytes(path: &Path) -> Result<u64> {
    let stat = nix::sys::statvfs::statvfs(path)
        .map_err(|errno| TuneError::io(path, std::io::Error::from(errno)))?;
    Ok(stat.blocks() as u64 * stat.fragment_size() as u64)
}

#[cfg(not(unix))]
fn statvfs_bytes(path: &Path) -> Result<u64> {
    Err(TuneError::not_supported(
        path.display().to_string(),
        "file system statistics need a unix host",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rooted_read_write_remove() {
        let tmp = TempDir::new().unwrap();
        let host = LinuxHost::with_root(tmp.path());

        assert_eq!(host.read("/proc/sys/vm/swappiness").unwrap(), None);
        host.write("/proc/sys/vm/swappiness", "60\n").unwrap();
        assert!(tmp.path().join("proc/sys/vm/swappiness").is_file());
        assert_eq!(
            host.read("/proc/sys/vm/swappiness").unwrap().as_deref(),
            Some("60\n")
        );

        assert!(host.remove("/proc/sys/vm/swappiness").unwrap());
        assert!(!host.remove("/proc/sys/vm/swappiness").unwrap());
    }

    #[test]
    fn test_list_sorted_and_missing() {
        let tmp = TempDir::new().unwrap();
        let host = LinuxHost::with_root(tmp.path());
        assert!(host.list("/sys/block").unwrap().is_empty());

        host.write("/sys/block/sdb/queue/scheduler", "none").unwrap();
        host.write("/sys/block/sda/queue/scheduler", "none").unwrap();
        assert_eq!(host.list("/sys/block").unwrap(), vec!["sda", "sdb"]);
    }

    #[test]
    fn test_unmounted_filesystem() {
        let tmp = TempDir::new().unwrap();
        let host = LinuxHost::with_root(tmp.path());
        host.write("/proc/mounts", "proc /proc proc rw 0 0\n").unwrap();
        assert_eq!(host.filesystem_size_mb("/dev/shm").unwrap(), None);
    }

    #[test]
    fn test_is_mounted() {
        let mounts = "tmpfs /dev/shm tmpfs rw,nosuid,nodev 0 0\nproc /proc proc rw 0 0\n";
        assert!(is_mounted(mounts, "/dev/shm"));
        assert!(!is_mounted(mounts, "/dev"));
    }

    #[test]
    fn test_command_check() {
        assert!(CommandOutput::ok("").check("true").is_ok());
        let err = CommandOutput::failed(3, "inactive\n")
            .check("systemctl is-active foo")
            .unwrap_err();
        match err {
            TuneError::CommandFailed { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "inactive");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
