use crate::error::{Error, Result};
use std::fs;

const STAT_PATH: &str = "/proc/stat";

/// System-wide cumulative CPU times from the first line of `/proc/stat`,
/// in clock ticks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    /// Read the aggregate counters. A failure here is fatal to the sampling
    /// loop, not to the program.
    pub fn read() -> Result<Self> {
        let contents = fs::read_to_string(STAT_PATH).map_err(|source| Error::ProcRead {
            path: STAT_PATH.to_string(),
            source,
        })?;

        let line = contents.lines().next().ok_or_else(|| Error::ProcParse {
            path: STAT_PATH.to_string(),
            reason: "empty file".to_string(),
        })?;

        Self::parse(line)
    }

    /// Parse the aggregate `cpu` line. Kernels older than 2.6.11 omit some
    /// of the trailing counters; anything past the first eight (guest time
    /// and friends) is ignored. Fewer than four parseable fields is an
    /// error.
    pub(crate) fn parse(line: &str) -> Result<Self> {
        let malformed = |reason: &str| Error::ProcParse {
            path: STAT_PATH.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = line.split_ascii_whitespace();
        if parts.next() != Some("cpu") {
            return Err(malformed("first line is not the aggregate cpu line"));
        }

        let mut fields = [0u64; 8];
        let mut parsed = 0;
        for slot in fields.iter_mut() {
            match parts.next().map(str::parse) {
                Some(Ok(value)) => *slot = value,
                _ => break,
            }
            parsed += 1;
        }

        if parsed < 4 {
            return Err(malformed("fewer than four cpu counters"));
        }

        let [user, nice, system, idle, iowait, irq, softirq, steal] = fields;
        Ok(CpuTimes {
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal,
        })
    }

    /// The eight counters in report row order.
    pub fn fields(&self) -> [u64; 8] {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modern_line_with_guest_fields() {
        let cpu = CpuTimes::parse("cpu  100 2 50 500 25 3 7 1 9 9").unwrap();
        assert_eq!(
            cpu,
            CpuTimes {
                user: 100,
                nice: 2,
                system: 50,
                idle: 500,
                iowait: 25,
                irq: 3,
                softirq: 7,
                steal: 1,
            }
        );
    }

    #[test]
    fn missing_trailing_counters_default_to_zero() {
        let cpu = CpuTimes::parse("cpu 100 2 50 500").unwrap();
        assert_eq!(cpu.user, 100);
        assert_eq!(cpu.idle, 500);
        assert_eq!(cpu.iowait, 0);
        assert_eq!(cpu.steal, 0);
    }

    #[test]
    fn fewer_than_four_counters_is_an_error() {
        assert!(CpuTimes::parse("cpu 100 2 50").is_err());
    }

    #[test]
    fn per_core_line_is_rejected() {
        assert!(CpuTimes::parse("cpu0 100 2 50 500").is_err());
    }

    #[test]
    fn non_numeric_counter_stops_parsing() {
        assert!(CpuTimes::parse("cpu 100 x 50 500").is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn reads_the_live_proc_stat() {
        let cpu = CpuTimes::read().unwrap();
        assert!(cpu.fields().iter().sum::<u64>() > 0);
    }
}
