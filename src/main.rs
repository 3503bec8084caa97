use anyhow::Context;
use clap::Parser;
use cpumeter::cli::Cli;
use cpumeter::error::exit_code;
use cpumeter::proc::clock;
use cpumeter::report;
use cpumeter::sampler::{Config, Sampler};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::from(exit_code::SUCCESS as u8),
        Err(e) => {
            eprintln!("Error: {e:#}");
            if let Some(cpumeter_err) = e.downcast_ref::<cpumeter::Error>() {
                ExitCode::from(cpumeter_err.exit_code() as u8)
            } else {
                ExitCode::from(exit_code::GENERAL_ERROR as u8)
            }
        }
    }
}

fn run() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    cli.validate()
        .map_err(cpumeter::Error::InvalidArgument)
        .context("Invalid arguments")?;

    let config = Config {
        interval: cli.interval,
        samples: cli.sample_count(),
        threads: cli.threads,
        max_records: cli.max_records,
    };

    eprintln!(
        "Sampling every {} for {} ({} samples{}), started {}",
        humantime::format_duration(cli.interval),
        humantime::format_duration(cli.duration),
        config.samples,
        if config.threads { ", with threads" } else { "" },
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
    );

    let stop = Arc::new(AtomicBool::new(false));
    let s = stop.clone();
    ctrlc::set_handler(move || {
        s.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl-C handler")?;

    let sampler = Sampler::new(config);
    let buffer = sampler.run(&stop);

    if buffer.total_dropped() > 0 {
        log::warn!(
            "{} process records dropped at the per-sample capacity of {}",
            buffer.total_dropped(),
            cli.max_records
        );
    }

    // Partial results are still a report: an early stop above never reaches
    // here as an error.
    let file = File::create(&cli.output)
        .with_context(|| format!("Failed to create {}", cli.output.display()))?;
    let mut writer = BufWriter::new(file);
    report::write_report(&mut writer, buffer.samples(), clock::ticks_per_second())
        .and_then(|()| writer.flush())
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    eprintln!(
        "Wrote {} samples to {}",
        buffer.len(),
        cli.output.display()
    );

    Ok(())
}
