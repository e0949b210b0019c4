//! Configuration settings for paramtune
//!
//! Defines the CLI arguments, subcommands, and the runtime configuration
//! derived from them.

use super::PagecacheConfig;
use crate::error::{Result, TuneError};
use crate::param::{Operator, Recommendation, Value};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default location of the pagecache settings
pub const DEFAULT_PAGECACHE_CONFIG: &str = "/etc/sysconfig/paramtune-pagecache";

/// paramtune - reconcile Linux kernel and service parameters with tuning notes
#[derive(Parser, Debug, Clone)]
#[command(name = "paramtune")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect, optimise and apply Linux tuning parameters")]
#[command(long_about = r#"
paramtune reads the current value of a tunable, reconciles it with a
recommended value and writes the result back, keeping enough information
to restore the previous state later.

Examples:
  paramtune inspect vm.swappiness IO_SCHEDULER       # Show current values
  paramtune verify 'IO_SCHEDULER=none, noop' KSM=0    # Compare with a note
  paramtune apply governor=performance --dry-run      # Preview changes
  paramtune apply KSM=0 --override KSM=               # Leave KSM untouched
  paramtune revert 'LIMIT_@sapsys_soft_nofile=NA'     # Restore a prior value
"#)]
pub struct CliArgs {
    /// Directory treated as the file system root
    #[arg(long, default_value = "/", value_name = "DIR", global = true)]
    pub root: PathBuf,

    /// Pagecache limit settings file
    #[arg(
        long,
        default_value = DEFAULT_PAGECACHE_CONFIG,
        value_name = "PATH",
        global = true
    )]
    pub pagecache_config: PathBuf,

    /// Do not derive a pagecache limit from main memory
    #[arg(long, global = true)]
    pub no_pagecache_algorithm: bool,

    /// Percentage of total memory for /dev/shm (0 = 75%)
    #[arg(long, default_value = "0", value_name = "PCT", global = true)]
    pub tmpfs_percent: u64,

    /// Output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub output_format: OutputFormat,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write JSON logs to this file
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Replace a recommended value (NAME=VALUE); an empty VALUE leaves the
    /// parameter untouched
    #[arg(long = "override", value_name = "NAME=VALUE", global = true)]
    pub overrides: Vec<String>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the current value of parameters
    #[command(name = "inspect")]
    Inspect {
        /// Parameter names
        #[arg(required = true, value_name = "NAME")]
        names: Vec<String>,
    },

    /// Show the reconciled value for NAME=VALUE recommendations
    #[command(name = "optimise", alias = "optimize")]
    Optimise {
        /// Recommendations (NAME=VALUE, NAME<VALUE, NAME>VALUE)
        #[arg(required = true, value_name = "NAME=VALUE")]
        assignments: Vec<String>,
    },

    /// Reconcile and write recommendations to the system
    #[command(name = "apply")]
    Apply {
        /// Recommendations (NAME=VALUE, NAME<VALUE, NAME>VALUE)
        #[arg(required = true, value_name = "NAME=VALUE")]
        assignments: Vec<String>,

        /// Show what would change without writing
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Restore previously captured values
    #[command(name = "revert")]
    Revert {
        /// Previous values (NAME=VALUE); NA removes drop-in files
        #[arg(required = true, value_name = "NAME=VALUE")]
        assignments: Vec<String>,
    },

    /// Compare the system with recommendations
    #[command(name = "verify")]
    Verify {
        /// Recommendations (NAME=VALUE, NAME<VALUE, NAME>VALUE)
        #[arg(required = true, value_name = "NAME=VALUE")]
        assignments: Vec<String>,
    },

    /// Show memory totals used for size computations
    #[command(name = "memory")]
    Memory,
}

/// Output format for reports
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
}

/// Runtime configuration of a tuning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// File system root for all reads and writes
    pub root: PathBuf,
    /// Pagecache settings file
    pub pagecache_config: PathBuf,
    /// Derive a pagecache limit from main memory when none is configured
    pub pagecache_algorithm: bool,
    /// Percentage of total memory for /dev/shm (0 = default)
    pub tmpfs_percent: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            pagecache_config: PathBuf::from(DEFAULT_PAGECACHE_CONFIG),
            pagecache_algorithm: true,
            tmpfs_percent: 0,
        }
    }
}

impl EngineConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        if args.tmpfs_percent > 100 {
            return Err(TuneError::config(format!(
                "--tmpfs-percent must be between 0 and 100, got {}",
                args.tmpfs_percent
            )));
        }
        Ok(Self {
            root: args.root.clone(),
            pagecache_config: args.pagecache_config.clone(),
            pagecache_algorithm: !args.no_pagecache_algorithm,
            tmpfs_percent: args.tmpfs_percent,
        })
    }

    /// Load the pagecache settings this configuration points at
    pub fn load_pagecache(&self) -> Result<PagecacheConfig> {
        Ok(PagecacheConfig::load(&self.pagecache_config)?.with_algorithm(self.pagecache_algorithm))
    }
}

/// Parse a `NAME=VALUE` command line argument into a recommendation.
///
/// `<` and `>` select the operator; the literal `NA` becomes the sentinel.
pub fn parse_assignment(arg: &str) -> Result<(String, Recommendation)> {
    let (name, operator, value) = Operator::split_assignment(arg).ok_or_else(|| {
        TuneError::invalid_value("assignment", arg, "expected NAME=VALUE")
    })?;
    if name.is_empty() {
        return Err(TuneError::invalid_value(
            "assignment",
            arg,
            "parameter name is empty",
        ));
    }
    Ok((
        name.to_string(),
        Recommendation {
            value: Value::parse(value),
            operator,
            override_value: None,
        },
    ))
}

/// Attach `--override` values to the note entries of the same name.
/// The last override given for a name wins.
pub fn apply_overrides(
    note: Vec<(String, Recommendation)>,
    overrides: &[String],
) -> Result<Vec<(String, Recommendation)>> {
    let overrides = overrides
        .iter()
        .map(|arg| parse_assignment(arg))
        .collect::<Result<Vec<_>>>()?;

    for (name, _) in &overrides {
        if !note.iter().any(|(n, _)| n == name) {
            tracing::warn!("{}: override given for a parameter not in the note", name);
        }
    }

    Ok(note
        .into_iter()
        .map(|(name, rec)| match overrides.iter().rev().find(|(n, _)| *n == name) {
            Some((_, custom)) => {
                tracing::debug!("{}: overridden with '{}'", name, custom.value);
                let rec = rec.with_override(custom.value.clone());
                (name, rec)
            }
            None => (name, rec),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        let (name, rec) = parse_assignment("vm.swappiness=10").unwrap();
        assert_eq!(name, "vm.swappiness");
        assert_eq!(rec.value, Value::text("10"));
        assert_eq!(rec.operator, Operator::Equal);

        let (name, rec) = parse_assignment("vm.max_map_count>2147483647").unwrap();
        assert_eq!(name, "vm.max_map_count");
        assert_eq!(rec.operator, Operator::Greater);

        let (_, rec) = parse_assignment("UserTasksMax=NA").unwrap();
        assert!(rec.value.is_na());

        let (name, rec) = parse_assignment("LIMIT_@sapsys_soft_nofile=@sapsys soft nofile 65536")
            .unwrap();
        assert_eq!(name, "LIMIT_@sapsys_soft_nofile");
        assert_eq!(rec.value, Value::text("@sapsys soft nofile 65536"));
    }

    #[test]
    fn test_parse_assignment_errors() {
        assert!(parse_assignment("vm.swappiness").is_err());
        assert!(parse_assignment("=10").is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let note = vec![
            parse_assignment("vm.swappiness=10").unwrap(),
            parse_assignment("KSM=0").unwrap(),
        ];
        let overrides = vec![
            "vm.swappiness=25".to_string(),
            "KSM=".to_string(),
            "THP=never".to_string(),
        ];
        let note = apply_overrides(note, &overrides).unwrap();
        assert_eq!(note.len(), 2);
        assert_eq!(note[0].1.effective(), &Value::text("25"));
        assert_eq!(note[0].1.value, Value::text("10"));
        assert!(!note[0].1.is_untouched());
        assert!(note[1].1.is_untouched());

        assert!(apply_overrides(Vec::new(), &["broken".to_string()]).is_err());
    }

    #[test]
    fn test_override_flag() {
        let args = CliArgs::try_parse_from([
            "paramtune",
            "verify",
            "KSM=0",
            "--override",
            "KSM=1",
            "--override",
            "THP=",
        ])
        .unwrap();
        assert_eq!(args.overrides, vec!["KSM=1".to_string(), "THP=".to_string()]);
    }

    #[test]
    fn test_cli_parsing() {
        let args = CliArgs::try_parse_from([
            "paramtune",
            "--root",
            "/tmp/sysroot",
            "apply",
            "KSM=0",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(args.root, PathBuf::from("/tmp/sysroot"));
        match args.command {
            Commands::Apply {
                ref assignments,
                dry_run,
            } => {
                assert_eq!(assignments, &vec!["KSM=0".to_string()]);
                assert!(dry_run);
            }
            ref other => panic!("unexpected command: {:?}", other),
        }

        let config = EngineConfig::from_cli(&args).unwrap();
        assert!(config.pagecache_algorithm);
        assert_eq!(config.tmpfs_percent, 0);
    }

    #[test]
    fn test_tmpfs_percent_range() {
        let args =
            CliArgs::try_parse_from(["paramtune", "--tmpfs-percent", "150", "memory"]).unwrap();
        assert!(EngineConfig::from_cli(&args).is_err());
    }
}
