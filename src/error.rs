//! Error types for paramtune
//!
//! Only real failures end up here: I/O errors, failed process invocations,
//! malformed input. A parameter the system cannot provide is not an error,
//! it inspects as [`Value::Na`](crate::param::Value::Na).

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tuning operations
#[derive(Error, Debug)]
pub enum TuneError {
    /// I/O error while reading or writing a system file
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A helper program could not be started
    #[error("Failed to run '{program}': {message}")]
    Command {
        /// Program name
        program: String,
        /// Spawn error
        message: String,
    },

    /// A helper program ran but reported failure
    #[error("'{command}' failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        /// Full command line
        command: String,
        /// Exit code, None if killed by a signal
        code: Option<i32>,
        /// Captured standard error
        stderr: String,
    },

    /// Parameter exists in principle but cannot be managed on this system
    #[error("Parameter '{name}' is not supported: {reason}")]
    NotSupported {
        /// Parameter name
        name: String,
        /// What is missing
        reason: String,
    },

    /// Value has the wrong shape for the parameter
    #[error("Invalid value '{value}' for '{name}': {reason}")]
    InvalidValue {
        /// Parameter name
        name: String,
        /// Rejected value
        value: String,
        /// Expected shape
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Multiple errors occurred
    #[error("Multiple errors occurred ({count} errors)")]
    MultipleErrors {
        /// Number of errors
        count: usize,
        /// The errors, in order
        errors: Vec<TuneError>,
    },

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        /// What was being done
        context: String,
        /// Wrapped error
        #[source]
        source: Box<TuneError>,
    },
}

impl TuneError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a not-supported error
    pub fn not_supported(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotSupported {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(
        name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this error means the resource is simply not there.
    ///
    /// Revert treats these as no-ops.
    pub fn is_absent(&self) -> bool {
        match self {
            Self::NotSupported { .. } => true,
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            Self::WithContext { source, .. } => source.is_absent(),
            _ => false,
        }
    }

    /// Check if this error is a permission issue
    pub fn is_permission_error(&self) -> bool {
        match self {
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::PermissionDenied,
            Self::WithContext { source, .. } => source.is_permission_error(),
            _ => false,
        }
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::WithContext { source, .. } => source.path(),
            _ => None,
        }
    }
}

/// Result type alias for tuning operations
pub type Result<T> = std::result::Result<T, TuneError>;

impl From<serde_json::Error> for TuneError {
    fn from(err: serde_json::Error) -> Self {
        TuneError::Config(format!("JSON serialization failed: {}", err))
    }
}

impl From<ini::Error> for TuneError {
    fn from(err: ini::Error) -> Self {
        TuneError::Config(format!("cannot parse settings file: {}", err))
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| TuneError::io(path, e))
    }
}

/// Collects multiple results into a single result
pub fn collect_errors<T>(results: Vec<Result<T>>) -> Result<Vec<T>> {
    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(value) => successes.push(value),
            Err(e) => errors.push(e),
        }
    }

    match errors.len() {
        0 => Ok(successes),
        1 => Err(errors.remove(0)),
        count => Err(TuneError::MultipleErrors { count, errors }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = TuneError::io("/proc/sys/vm/swappiness", io_err);
        assert_eq!(err.path().unwrap(), &PathBuf::from("/proc/sys/vm/swappiness"));
        assert!(err.is_absent());
    }

    #[test]
    fn test_absent_through_context() {
        let err = TuneError::not_supported("IO_SCHEDULER_sdz", "no such device")
            .with_context("revert");
        assert!(err.is_absent());

        let err = TuneError::CommandFailed {
            command: "systemctl start foo".to_string(),
            code: Some(5),
            stderr: "Unit foo.service not found.".to_string(),
        };
        assert!(!err.is_absent());
    }

    #[test]
    fn test_permission_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = TuneError::io("/sys/kernel/mm/ksm/run", io_err);
        assert!(err.is_permission_error());
        assert!(!err.is_absent());
    }

    #[test]
    fn test_collect_errors() {
        let results: Vec<Result<i32>> = vec![Ok(1), Ok(2), Ok(3)];
        assert_eq!(collect_errors(results).unwrap(), vec![1, 2, 3]);

        let results: Vec<Result<i32>> = vec![
            Ok(1),
            Err(TuneError::config("bad")),
            Err(TuneError::not_supported("x", "missing")),
        ];
        match collect_errors(results) {
            Err(TuneError::MultipleErrors { count, .. }) => assert_eq!(count, 2),
            other => panic!("unexpected: {:?}", other.map(|v| v.len())),
        }
    }
}
