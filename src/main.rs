use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use mesi_coresim::cli::Cli;
use mesi_coresim::config::SimConfig;
use mesi_coresim::report::RunReport;
use mesi_coresim::trace::{TraceFormat, TraceReader};
use mesi_coresim::Simulator;

fn load_file_config(path: &std::path::Path) -> Result<SimConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
}

fn run(cli: Cli) -> Result<()> {
    let file_config = cli
        .config
        .as_ref()
        .map(|path| load_file_config(path))
        .transpose()?;
    let config = cli.resolve_config(file_config);

    let format = cli
        .format
        .map(TraceFormat::from)
        .unwrap_or_else(|| TraceFormat::from_extension(&cli.trace));

    info!(
        "starting run: trace={} cores={} cache_size={}B block_size={}B associativity={}",
        cli.trace.display(),
        config.num_cores,
        config.cache_size_bytes,
        config.block_size_bytes,
        config.associativity,
    );

    let mut sim = Simulator::new(config).context("building simulator")?;

    let trace_file = File::open(&cli.trace)
        .with_context(|| format!("opening trace file {}", cli.trace.display()))?;
    let reader = TraceReader::new(BufReader::new(trace_file), format);

    let mut event_index = 0usize;
    for event in reader {
        event_index += 1;
        let event = event.with_context(|| format!("reading trace event #{event_index}"))?;
        sim.perform_access_at(event, event_index)
            .with_context(|| format!("processing trace event #{event_index}"))?;
    }
    sim.flush();

    info!("run complete: {event_index} events processed");

    let report = RunReport::new(*sim.config(), sim.stats().to_vec());
    let rendered = match cli.report {
        mesi_coresim::cli::ReportFormat::Text => report.to_text(),
        mesi_coresim::cli::ReportFormat::Json => {
            report.to_json().context("serializing report as JSON")?
        }
    };

    match cli.output {
        Some(path) => {
            let mut out = BufWriter::new(
                File::create(&path)
                    .with_context(|| format!("creating output file {}", path.display()))?,
            );
            out.write_all(rendered.as_bytes())
                .with_context(|| format!("writing report to {}", path.display()))?;
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
