use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "cpumeter")]
#[command(about = "Low-overhead CPU usage sampler producing tab-separated reports")]
#[command(version)]
pub struct Cli {
    /// Sample threads in addition to processes
    #[arg(long, short = 't')]
    pub threads: bool,

    /// Output file path
    #[arg(long, short = 'o', default_value = "cpumeter.txt")]
    pub output: PathBuf,

    /// Sampling interval
    #[arg(long, short = 'i', default_value = "500ms", value_parser = parse_duration)]
    pub interval: Duration,

    /// Total sampling duration
    #[arg(long, short = 'd', default_value = "20s", value_parser = parse_duration)]
    pub duration: Duration,

    /// Maximum process/thread records kept per sample
    #[arg(long, default_value = "256")]
    pub max_records: usize,
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    // Try humantime first
    if let Ok(d) = humantime::parse_duration(s) {
        return Ok(d);
    }

    // Try bare number as seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    Err(format!(
        "Invalid duration '{}'. Examples: 500ms, 20s, 1m30s, 90",
        s
    ))
}

impl Cli {
    pub fn validate(&self) -> Result<(), String> {
        if self.interval.is_zero() {
            return Err("Sampling interval must be non-zero".to_string());
        }

        if self.max_records == 0 {
            return Err("--max-records must be at least 1".to_string());
        }

        Ok(())
    }

    /// Number of samples to take: whole intervals in the duration, at least one.
    pub fn sample_count(&self) -> usize {
        let count = self.duration.as_millis() / self.interval.as_millis();
        (count as usize).max(1)
    }
}
