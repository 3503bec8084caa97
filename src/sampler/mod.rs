//! The sampling loop: at a fixed interval, capture the aggregate CPU
//! counters and a snapshot of every process's (and optionally thread's)
//! cumulative CPU accounting.

mod record;

pub use record::{Sample, SampleBuffer};

use crate::error::{Error, Result};
use crate::proc::{CpuTimes, clock, process};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Sampling configuration, built once from the CLI and never modified.
#[derive(Debug, Clone)]
pub struct Config {
    pub interval: Duration,
    pub samples: usize,
    /// Also record one entry per thread (excluding main threads).
    pub threads: bool,
    /// Per-tick record capacity; records beyond it are counted as dropped.
    pub max_records: usize,
}

pub struct Sampler {
    config: Config,
}

impl Sampler {
    pub fn new(config: Config) -> Self {
        Sampler { config }
    }

    /// Take samples until the configured count is reached, a fatal read
    /// error occurs, or `stop` is raised. Whatever was collected is returned
    /// for reporting either way.
    ///
    /// The end-of-tick sleep is a fixed duration, not wall-clock corrected:
    /// drift accumulates across ticks in exchange for the sampler itself
    /// staying off the CPU.
    pub fn run(&self, stop: &AtomicBool) -> SampleBuffer {
        let mut buffer = SampleBuffer::with_capacity(self.config.samples);

        for tick in 0..self.config.samples {
            if stop.load(Ordering::SeqCst) {
                eprintln!("Interrupted after {} samples", buffer.len());
                break;
            }

            match self.take_sample() {
                Ok(sample) => buffer.push(sample),
                Err(e) => {
                    log::warn!("sampling stopped early at tick {tick}: {e}");
                    break;
                }
            }

            if tick + 1 < self.config.samples {
                std::thread::sleep(self.config.interval);
            }
        }

        buffer
    }

    /// One tick. Errors reading the aggregate counters, the clock, or the
    /// process table itself are fatal to the loop; errors reading a single
    /// process or thread are routine (it exited under us) and skip just that
    /// record.
    fn take_sample(&self) -> Result<Sample> {
        let timestamp = clock::ticks_now().map_err(Error::Clock)?;
        let cpu = CpuTimes::read()?;
        let mut sample = Sample::new(timestamp, cpu);

        for pid in process::pids()? {
            match process::read_stat(&process::stat_path(pid)) {
                Ok(stat) => sample.push_record(stat, self.config.max_records),
                Err(e) => {
                    log::debug!("skipping pid {pid}: {e}");
                    continue;
                }
            }

            if self.config.threads {
                self.sample_threads(pid, &mut sample);
            }
        }

        Ok(sample)
    }

    fn sample_threads(&self, pid: i32, sample: &mut Sample) {
        let tids = match process::thread_ids(pid) {
            Ok(tids) => tids,
            Err(e) => {
                log::debug!("skipping threads of pid {pid}: {e}");
                return;
            }
        };

        for tid in tids {
            match process::read_stat(&process::task_stat_path(pid, tid)) {
                Ok(stat) => sample.push_record(stat, self.config.max_records),
                Err(e) => log::debug!("skipping tid {tid} of pid {pid}: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn collects_the_requested_number_of_samples() {
        let sampler = Sampler::new(Config {
            interval: Duration::from_millis(1),
            samples: 2,
            threads: false,
            max_records: 256,
        });

        let stop = AtomicBool::new(false);
        let buffer = sampler.run(&stop);

        assert_eq!(buffer.len(), 2);
        let samples = buffer.samples();
        assert!(samples[0].timestamp <= samples[1].timestamp);
        // We are running, so at least this process shows up.
        assert!(!samples[0].records.is_empty());
        // Cumulative counters never decrease between ticks.
        assert!(samples[1].cpu.user >= samples[0].cpu.user);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn stop_flag_wins_before_the_first_tick() {
        let sampler = Sampler::new(Config {
            interval: Duration::from_millis(1),
            samples: 5,
            threads: false,
            max_records: 256,
        });

        let stop = AtomicBool::new(true);
        assert!(sampler.run(&stop).is_empty());
    }
}
