//! Memory totals from /proc/meminfo

use super::Host;
use crate::error::Result;
use serde::{Deserialize, Serialize};

const MEMINFO: &str = "/proc/meminfo";

/// Physical and swap memory, in MB
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryTotals {
    /// MemTotal
    pub main_mb: u64,
    /// SwapTotal
    pub swap_mb: u64,
}

impl MemoryTotals {
    /// Main memory plus swap
    pub fn total_mb(&self) -> u64 {
        self.main_mb + self.swap_mb
    }

    /// Parse the content of /proc/meminfo
    pub fn parse(content: &str) -> Self {
        let mut totals = Self::default();
        for line in content.lines() {
            let Some((key, rest)) = line.split_once(':') else {
                continue;
            };
            let kb = rest
                .split_whitespace()
                .next()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0);
            match key.trim() {
                "MemTotal" => totals.main_mb = kb / 1024,
                "SwapTotal" => totals.swap_mb = kb / 1024,
                _ => {}
            }
        }
        totals
    }

    /// Read the totals from the host. A host without /proc/meminfo reports
    /// zero memory.
    pub fn read(host: &dyn Host) -> Result<Self> {
        match host.read(MEMINFO)? {
            Some(content) => Ok(Self::parse(&content)),
            None => {
                tracing::warn!("{} not available, assuming no memory information", MEMINFO);
                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::testing::FakeHost;

    const SAMPLE: &str = "MemTotal:       16318712 kB\n\
                          MemFree:         1234567 kB\n\
                          SwapTotal:       2097148 kB\n\
                          SwapFree:        2097148 kB\n";

    #[test]
    fn test_parse() {
        let totals = MemoryTotals::parse(SAMPLE);
        assert_eq!(totals.main_mb, 15936);
        assert_eq!(totals.swap_mb, 2047);
        assert_eq!(totals.total_mb(), 17983);
    }

    #[test]
    fn test_read_missing() {
        let host = FakeHost::new();
        assert_eq!(MemoryTotals::read(&host).unwrap(), MemoryTotals::default());

        let host = FakeHost::new().with_file(MEMINFO, SAMPLE);
        assert_eq!(MemoryTotals::read(&host).unwrap().main_mb, 15936);
    }
}
