use crate::proc::{CpuTimes, ProcessStat};

/// One sampling tick: the aggregate counters plus a capacity-bounded snapshot
/// of per-process (and optionally per-thread) accounting, all cumulative.
///
/// Samples are immutable once appended to the buffer; the reporter derives
/// deltas into its own structures.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Tick count from `times(2)` at capture time.
    pub timestamp: u64,
    pub cpu: CpuTimes,
    /// Records in enumeration order: each process followed by its threads.
    pub records: Vec<ProcessStat>,
    /// Records discarded after the per-tick capacity was reached.
    pub dropped: u32,
}

impl Sample {
    pub fn new(timestamp: u64, cpu: CpuTimes) -> Self {
        Sample {
            timestamp,
            cpu,
            records: Vec::new(),
            dropped: 0,
        }
    }

    /// Append a record, or count it as dropped once `capacity` is reached.
    pub fn push_record(&mut self, record: ProcessStat, capacity: usize) {
        if self.records.len() < capacity {
            self.records.push(record);
        } else {
            self.dropped += 1;
        }
    }
}

/// The ordered, append-only sample sequence. Sized once at startup, filled by
/// the sampler, then handed to the reporter.
#[derive(Debug)]
pub struct SampleBuffer {
    samples: Vec<Sample>,
}

impl SampleBuffer {
    pub fn with_capacity(max_samples: usize) -> Self {
        SampleBuffer {
            samples: Vec::with_capacity(max_samples),
        }
    }

    pub fn push(&mut self, sample: Sample) {
        debug_assert!(
            self.samples
                .last()
                .is_none_or(|prev| prev.timestamp <= sample.timestamp)
        );
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total records dropped across all ticks to the capacity limit.
    pub fn total_dropped(&self) -> u64 {
        self.samples.iter().map(|s| u64::from(s.dropped)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pid: i32) -> ProcessStat {
        ProcessStat {
            pid,
            pgid: pid,
            comm: "proc".to_string(),
            utime: 0,
            stime: 0,
            cutime: 0,
            cstime: 0,
        }
    }

    #[test]
    fn capacity_overflow_is_counted_not_grown() {
        let mut sample = Sample::new(0, CpuTimes::default());
        for pid in 0..10 {
            sample.push_record(record(pid), 4);
        }

        assert_eq!(sample.records.len(), 4);
        assert_eq!(sample.dropped, 6);
        // The kept records are the first ones in enumeration order.
        assert_eq!(sample.records[3].pid, 3);
    }

    #[test]
    fn buffer_reports_dropped_across_ticks() {
        let mut buf = SampleBuffer::with_capacity(2);
        for ts in [100, 150] {
            let mut sample = Sample::new(ts, CpuTimes::default());
            for pid in 0..3 {
                sample.push_record(record(pid), 2);
            }
            buf.push(sample);
        }

        assert_eq!(buf.len(), 2);
        assert_eq!(buf.total_dropped(), 2);
    }
}
