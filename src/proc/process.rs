//! Per-process and per-thread CPU accounting from `/proc/<pid>/stat`.
//!
//! Only the fields the report needs are kept. Field layout documented in
//! [proc_pid_stat(5)](https://man7.org/linux/man-pages/man5/proc_pid_stat.5.html).

use crate::error::{Error, Result};
use std::fs;
use std::io;

/// One process or thread's cumulative CPU accounting, in clock ticks.
///
/// `cutime`/`cstime` cover children that have already been reaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessStat {
    pub pid: i32,
    pub pgid: i32,
    /// Command name with the surrounding parentheses stripped.
    pub comm: String,
    pub utime: u64,
    pub stime: u64,
    pub cutime: u64,
    pub cstime: u64,
}

impl ProcessStat {
    /// User plus kernel time of the process itself, the quantity the report
    /// tracks per timeline.
    pub fn busy(&self) -> u64 {
        self.utime + self.stime
    }

    pub(crate) fn parse(line: &str, path: &str) -> Result<Self> {
        let malformed = |reason: &str| Error::ProcParse {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        // comm may itself contain spaces and parentheses, so split on the
        // outermost pair rather than on whitespace.
        let start = line.find('(').ok_or_else(|| malformed("no '(' around comm"))?;
        let end = line.rfind(')').ok_or_else(|| malformed("no ')' around comm"))?;
        if end < start {
            return Err(malformed("mismatched parentheses around comm"));
        }

        let pid: i32 = line[..start]
            .trim()
            .parse()
            .map_err(|_| malformed("pid is not a number"))?;
        let comm = line[start + 1..end].to_string();

        let mut rest = line[end + 1..].split_ascii_whitespace();
        let mut field = |name: &'static str| {
            rest.next().ok_or_else(|| Error::ProcParse {
                path: path.to_string(),
                reason: format!("missing field {name}"),
            })
        };

        let _state = field("state")?;
        let _ppid = field("ppid")?;
        let pgid: i32 = field("pgrp")?
            .parse()
            .map_err(|_| malformed("pgrp is not a number"))?;

        // Skip session, tty_nr, tpgid, flags, minflt, cminflt, majflt, cmajflt.
        for name in [
            "session", "tty_nr", "tpgid", "flags", "minflt", "cminflt", "majflt", "cmajflt",
        ] {
            field(name)?;
        }

        let utime: u64 = field("utime")?
            .parse()
            .map_err(|_| malformed("utime is not a number"))?;
        let stime: u64 = field("stime")?
            .parse()
            .map_err(|_| malformed("stime is not a number"))?;
        // cutime/cstime are signed in the kernel interface; negative values
        // are clamped to zero.
        let cutime: i64 = field("cutime")?
            .parse()
            .map_err(|_| malformed("cutime is not a number"))?;
        let cstime: i64 = field("cstime")?
            .parse()
            .map_err(|_| malformed("cstime is not a number"))?;

        Ok(ProcessStat {
            pid,
            pgid,
            comm,
            utime,
            stime,
            cutime: cutime.max(0) as u64,
            cstime: cstime.max(0) as u64,
        })
    }
}

/// Read and parse one stat file. A failure here is transient (the process
/// may have exited between enumeration and the read) and the caller skips
/// the record.
pub fn read_stat(path: &str) -> Result<ProcessStat> {
    let contents = fs::read_to_string(path).map_err(|source| Error::ProcRead {
        path: path.to_string(),
        source,
    })?;

    ProcessStat::parse(contents.trim_end(), path)
}

pub fn stat_path(pid: i32) -> String {
    format!("/proc/{pid}/stat")
}

pub fn task_stat_path(pid: i32, tid: i32) -> String {
    format!("/proc/{pid}/task/{tid}/stat")
}

/// Enumerate all currently running processes by scanning `/proc` for numeric
/// directory names.
pub fn pids() -> io::Result<Vec<i32>> {
    let mut pids = Vec::new();

    for entry in fs::read_dir("/proc")? {
        let entry = entry?;
        let name = entry.file_name();
        if let Ok(pid) = name.to_string_lossy().parse::<i32>() {
            pids.push(pid);
        }
    }

    Ok(pids)
}

/// Enumerate the threads of a process, excluding the main thread (its stat
/// duplicates the process-level record).
pub fn thread_ids(pid: i32) -> io::Result<Vec<i32>> {
    let mut tids = Vec::new();

    for entry in fs::read_dir(format!("/proc/{pid}/task"))? {
        let entry = entry?;
        let name = entry.file_name();
        if let Ok(tid) = name.to_string_lossy().parse::<i32>() {
            if tid != pid {
                tids.push(tid);
            }
        }
    }

    Ok(tids)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "42 (worker) S 1 42 42 0 -1 4194304 500 0 0 0 10 15 2 1 \
                        20 0 1 0 100 22222 33 18446744073709551615 0 0 0 0 0 0 0";

    #[test]
    fn parses_the_fields_the_report_needs() {
        let stat = ProcessStat::parse(LINE, "/proc/42/stat").unwrap();
        assert_eq!(stat.pid, 42);
        assert_eq!(stat.comm, "worker");
        assert_eq!(stat.pgid, 42);
        assert_eq!(stat.utime, 10);
        assert_eq!(stat.stime, 15);
        assert_eq!(stat.cutime, 2);
        assert_eq!(stat.cstime, 1);
        assert_eq!(stat.busy(), 25);
    }

    #[test]
    fn comm_with_spaces_and_parens_is_split_on_the_outermost_pair() {
        let line = "77 (Web (Content)) R 1 77 77 0 -1 0 0 0 0 0 3 4 0 0 20 0 1 0 9 1 1 1";
        let stat = ProcessStat::parse(line, "/proc/77/stat").unwrap();
        assert_eq!(stat.comm, "Web (Content)");
        assert_eq!(stat.utime, 3);
        assert_eq!(stat.stime, 4);
    }

    #[test]
    fn negative_child_times_clamp_to_zero() {
        let line = "8 (init) S 0 8 8 0 -1 0 0 0 0 0 1 2 -5 -6 20 0 1 0 1 1 1 1";
        let stat = ProcessStat::parse(line, "/proc/8/stat").unwrap();
        assert_eq!(stat.cutime, 0);
        assert_eq!(stat.cstime, 0);
    }

    #[test]
    fn truncated_line_is_an_error() {
        assert!(ProcessStat::parse("42 (worker) S 1 42", "/proc/42/stat").is_err());
    }

    #[test]
    fn missing_parens_is_an_error() {
        assert!(ProcessStat::parse("42 worker S 1 42 42 0 -1", "/proc/42/stat").is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn reads_our_own_stat_file() {
        let pid = std::process::id() as i32;
        let stat = read_stat(&stat_path(pid)).unwrap();
        assert_eq!(stat.pid, pid);
        assert!(!stat.comm.is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn enumeration_includes_ourselves() {
        let pid = std::process::id() as i32;
        assert!(pids().unwrap().contains(&pid));
        // The main thread is excluded from the thread list.
        assert!(!thread_ids(pid).unwrap().contains(&pid));
    }
}
