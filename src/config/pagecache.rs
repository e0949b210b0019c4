//! Pagecache limit settings
//!
//! Loaded once per run from a sysconfig-style INI file. Keys may live in the
//! general section or in a `[pagecache]` section, and values may be quoted:
//!
//! ```text
//! ENABLE_PAGECACHE_LIMIT="yes"
//! OVERRIDE_PAGECACHE_LIMIT_MB="2048"
//! PAGECACHE_LIMIT_IGNORE_DIRTY="1"
//! ```

use crate::error::{Result, TuneError};
use ini::Ini;
use serde::{Deserialize, Serialize};
use std::path::Path;

const SECTION: &str = "pagecache";
const KEY_ENABLE: &str = "ENABLE_PAGECACHE_LIMIT";
const KEY_LIMIT: &str = "OVERRIDE_PAGECACHE_LIMIT_MB";
const KEY_IGNORE_DIRTY: &str = "PAGECACHE_LIMIT_IGNORE_DIRTY";

/// Default for `vm.pagecache_limit_ignore_dirty`
pub const DEFAULT_IGNORE_DIRTY: u8 = 1;

/// Pagecache limit configuration, threaded through optimisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagecacheConfig {
    /// Limit switched on
    pub enabled: bool,
    /// Limit in MB; always 0 when disabled
    pub limit_mb: u64,
    /// Value for `vm.pagecache_limit_ignore_dirty` (0, 1 or 2)
    pub ignore_dirty: u8,
    /// Derive a limit from main memory when none is configured
    pub use_algorithm: bool,
}

impl Default for PagecacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            limit_mb: 0,
            ignore_dirty: DEFAULT_IGNORE_DIRTY,
            use_algorithm: true,
        }
    }
}

impl PagecacheConfig {
    /// Load from a file; a missing file gives the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("no pagecache settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        Ok(Self::from_ini(&ini))
    }

    /// Parse settings text
    pub fn parse(content: &str) -> Result<Self> {
        let ini = Ini::load_from_str(content)
            .map_err(|e| TuneError::config(format!("cannot parse pagecache settings: {}", e)))?;
        Ok(Self::from_ini(&ini))
    }

    /// Overlay the values found in an INI document on the defaults
    pub fn from_ini(ini: &Ini) -> Self {
        let lookup = |key: &str| -> Option<String> {
            ini.section(Some(SECTION))
                .and_then(|s| s.get(key))
                .or_else(|| ini.general_section().get(key))
                .map(unquote)
        };

        let mut config = Self::default();

        if let Some(v) = lookup(KEY_ENABLE) {
            config.enabled = v.eq_ignore_ascii_case("yes");
        }
        if let Some(v) = lookup(KEY_LIMIT) {
            config.limit_mb = match v.parse() {
                Ok(mb) => mb,
                Err(_) if v.is_empty() => 0,
                Err(_) => {
                    tracing::warn!("ignoring invalid {} '{}'", KEY_LIMIT, v);
                    0
                }
            };
        }
        if let Some(v) = lookup(KEY_IGNORE_DIRTY) {
            config.ignore_dirty = match v.as_str() {
                "0" => 0,
                "1" => 1,
                "2" => 2,
                other => {
                    tracing::warn!("ignoring invalid {} '{}'", KEY_IGNORE_DIRTY, other);
                    DEFAULT_IGNORE_DIRTY
                }
            };
        }

        if !config.enabled {
            config.limit_mb = 0;
        }
        config
    }

    /// Copy with the algorithm switch set
    pub fn with_algorithm(mut self, use_algorithm: bool) -> Self {
        self.use_algorithm = use_algorithm;
        self
    }
}

fn unquote(value: &str) -> String {
    value.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_string()
}
