//! In-memory host for unit tests

use super::{CommandOutput, Host};
use crate::error::{Result, TuneError};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

/// Host backed by a map of files and a table of scripted command outputs.
///
/// Commands without a scripted output fail as if the program were missing.
#[derive(Debug, Default)]
pub struct FakeHost {
    files: RefCell<BTreeMap<String, String>>,
    fs_sizes: BTreeMap<String, u64>,
    responses: BTreeMap<String, CommandOutput>,
    log: RefCell<Vec<String>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.files
            .borrow_mut()
            .insert(path.to_string(), content.to_string());
        self
    }

    pub fn with_fs_size(mut self, mount_point: &str, size_mb: u64) -> Self {
        self.fs_sizes.insert(mount_point.to_string(), size_mb);
        self
    }

    /// Script the output of a command line (`program arg arg`)
    pub fn respond(mut self, command: &str, output: CommandOutput) -> Self {
        self.responses.insert(command.to_string(), output);
        self
    }

    /// Current content of a file
    pub fn file(&self, path: &str) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }

    /// Command lines run so far
    pub fn commands(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl Host for FakeHost {
    fn read(&self, path: &str) -> Result<Option<String>> {
        Ok(self.file(path))
    }

    fn write(&self, path: &str, content: &str) -> Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    fn remove(&self, path: &str) -> Result<bool> {
        Ok(self.files.borrow_mut().remove(path).is_some())
    }

    fn list(&self, dir: &str) -> Result<Vec<String>> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        let names: BTreeSet<String> = self
            .files
            .borrow()
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter_map(|rest| rest.split('/').next())
            .map(str::to_string)
            .collect();
        Ok(names.into_iter().collect())
    }

    fn exists(&self, path: &str) -> bool {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        self.files
            .borrow()
            .keys()
            .any(|p| p == path || p.starts_with(&prefix))
    }

    fn filesystem_size_mb(&self, mount_point: &str) -> Result<Option<u64>> {
        Ok(self.fs_sizes.get(mount_point).copied())
    }

    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.log.borrow_mut().push(line.clone());
        self.responses
            .get(&line)
            .cloned()
            .ok_or_else(|| TuneError::Command {
                program: program.to_string(),
                message: "No such file or directory".to_string(),
            })
    }
}
