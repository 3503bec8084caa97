//! Report generation: one pass over the completed sample sequence, emitting
//! a tab-separated table with one column per sample.
//!
//! Aggregate counters become first-difference series; per-process rows are
//! timelines reconstructed by matching records across samples on (pid, comm).
//! The samples themselves are never mutated; deltas and consumed flags live
//! in structures derived here, so re-running the writer on the same buffer
//! produces byte-identical output.

use crate::sampler::Sample;
use std::io::{self, Write};

const LABEL_WIDTH: usize = 20;

const CPU_ROW_LABELS: [&str; 8] = [
    "CPU User",
    "CPU Nice",
    "CPU System",
    "CPU Idle",
    "CPU I/O Wait",
    "CPU IRQ",
    "CPU Softirq",
    "CPU Steal",
];

pub fn write_report<W: Write>(
    mut out: W,
    samples: &[Sample],
    ticks_per_second: u64,
) -> io::Result<()> {
    write_time_row(&mut out, samples, ticks_per_second)?;
    write_cpu_rows(&mut out, samples)?;
    write_process_rows(&mut out, samples)?;
    Ok(())
}

/// Offsets from the first sample's timestamp, as seconds and hundredths.
fn write_time_row<W: Write>(
    out: &mut W,
    samples: &[Sample],
    ticks_per_second: u64,
) -> io::Result<()> {
    write!(out, "{:<width$}", "Time", width = LABEL_WIDTH)?;

    let start = samples.first().map_or(0, |s| s.timestamp);
    for sample in samples {
        let offset = sample.timestamp.saturating_sub(start);
        let secs = offset / ticks_per_second;
        let hundredths = (offset % ticks_per_second) * 100 / ticks_per_second;
        write!(out, "\t{secs}.{hundredths:02}")?;
    }
    writeln!(out)
}

/// First-difference series for each aggregate counter, plus their sum.
/// Sample 0 is compared against itself and yields zero.
fn write_cpu_rows<W: Write>(out: &mut W, samples: &[Sample]) -> io::Result<()> {
    let deltas = aggregate_deltas(samples);

    for (row, label) in CPU_ROW_LABELS.iter().enumerate() {
        write!(out, "{label:<width$}", width = LABEL_WIDTH)?;
        for column in &deltas {
            write!(out, "\t{}", column[row])?;
        }
        writeln!(out)?;
    }

    write!(out, "{:<width$}", "CPU Total", width = LABEL_WIDTH)?;
    for column in &deltas {
        write!(out, "\t{}", column.iter().sum::<u64>())?;
    }
    writeln!(out)
}

fn aggregate_deltas(samples: &[Sample]) -> Vec<[u64; 8]> {
    let mut deltas = Vec::with_capacity(samples.len());
    let mut last = samples.first().map_or([0; 8], |s| s.cpu.fields());

    for sample in samples {
        let current = sample.cpu.fields();
        let mut delta = [0u64; 8];
        for (d, (cur, prev)) in delta.iter_mut().zip(current.iter().zip(last.iter())) {
            // Counters are cumulative; saturate rather than wrap if the
            // kernel ever hands back a smaller value.
            *d = cur.saturating_sub(*prev);
        }
        deltas.push(delta);
        last = current;
    }

    deltas
}

/// One reconstructed process/thread usage row.
struct Timeline {
    label: String,
    /// Sample index at which the timeline starts; rendered as that many
    /// leading empty columns.
    start: usize,
    /// Per-interval (user+system) deltas for consecutive matched samples.
    values: Vec<u64>,
}

/// Walk every sample in order; every record not yet consumed by an earlier
/// timeline starts a new one. Matching scans forward one sample at a time
/// for the first unconsumed record with the same pid and comm whose
/// cumulative busy time has not decreased; a decrease means the pid was
/// reused by a new process with the same name, which ends the timeline (the
/// impostor record starts its own row later). The first sample without an
/// acceptable match ends the row.
fn timelines(samples: &[Sample]) -> Vec<Timeline> {
    let mut consumed: Vec<Vec<bool>> = samples
        .iter()
        .map(|s| vec![false; s.records.len()])
        .collect();
    let mut rows = Vec::new();

    for si in 0..samples.len() {
        for ri in 0..samples[si].records.len() {
            if consumed[si][ri] {
                continue;
            }
            consumed[si][ri] = true;

            let origin = &samples[si].records[ri];
            let mut last_busy = origin.busy();
            let mut values = Vec::new();

            'forward: for (sj, sample) in samples.iter().enumerate().skip(si + 1) {
                for (rj, candidate) in sample.records.iter().enumerate() {
                    if consumed[sj][rj] {
                        continue;
                    }
                    if candidate.pid != origin.pid || candidate.comm != origin.comm {
                        continue;
                    }
                    if candidate.busy() < last_busy {
                        break 'forward;
                    }

                    values.push(candidate.busy() - last_busy);
                    last_busy = candidate.busy();
                    consumed[sj][rj] = true;
                    continue 'forward;
                }
                break;
            }

            rows.push(Timeline {
                label: format!("{}_{}", origin.comm, origin.pid),
                start: si,
                values,
            });
        }
    }

    rows
}

fn write_process_rows<W: Write>(out: &mut W, samples: &[Sample]) -> io::Result<()> {
    for timeline in timelines(samples) {
        write!(out, "{:<width$}", timeline.label, width = LABEL_WIDTH)?;
        for _ in 0..timeline.start {
            write!(out, "\t")?;
        }
        for value in &timeline.values {
            write!(out, "\t{value}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}
