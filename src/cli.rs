//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::SimConfig;
use crate::trace::TraceFormat;

/// Output format for the rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Input format for the trace file, as a CLI-facing mirror of
/// [`TraceFormat`] (clap needs its own enum to derive `ValueEnum`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TraceFormatArg {
    Text,
    Json,
}

impl From<TraceFormatArg> for TraceFormat {
    fn from(arg: TraceFormatArg) -> Self {
        match arg {
            TraceFormatArg::Text => TraceFormat::Text,
            TraceFormatArg::Json => TraceFormat::JsonLines,
        }
    }
}

/// Trace-driven multi-core MESI cache coherence simulator.
#[derive(Debug, Parser)]
#[command(name = "coresim", version, about)]
pub struct Cli {
    /// Path to the trace file. Text format by default; `.jsonl`/`.json`
    /// extensions are read as JSON lines.
    pub trace: PathBuf,

    /// Path to a TOML config file overriding the built-in defaults. CLI
    /// flags below, when given, take precedence over both.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub num_cores: Option<usize>,

    #[arg(long)]
    pub cache_size: Option<usize>,

    #[arg(long)]
    pub block_size: Option<usize>,

    #[arg(long)]
    pub associativity: Option<usize>,

    #[arg(long)]
    pub word_size: Option<usize>,

    /// Trace input format. Defaults to auto-detecting from the trace file's
    /// extension (`.jsonl`/`.json` read as JSON Lines, anything else as
    /// plain text).
    #[arg(long, value_enum)]
    pub format: Option<TraceFormatArg>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub report: ReportFormat,

    /// Write the report here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Increase log verbosity; repeat for more (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Fold an optionally-loaded file config with CLI overrides into a
    /// single [`SimConfig`]: CLI flags win, then the file, then defaults.
    pub fn resolve_config(&self, from_file: Option<SimConfig>) -> SimConfig {
        let mut config = from_file.unwrap_or_default();
        if let Some(v) = self.num_cores {
            config.num_cores = v;
        }
        if let Some(v) = self.cache_size {
            config.cache_size_bytes = v;
        }
        if let Some(v) = self.block_size {
            config.block_size_bytes = v;
        }
        if let Some(v) = self.associativity {
            config.associativity = v;
        }
        if let Some(v) = self.word_size {
            config.word_size_bytes = v;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parses_minimal_invocation() {
        let cli = Cli::parse_from(["coresim", "trace.txt"]);
        assert_eq!(cli.trace, PathBuf::from("trace.txt"));
        assert_eq!(cli.report, ReportFormat::Text);
        assert_eq!(cli.num_cores, None);
    }

    #[test]
    fn cli_overrides_win_over_file_config() {
        let cli = Cli::parse_from(["coresim", "trace.txt", "--num-cores", "4"]);
        let file_cfg = SimConfig {
            num_cores: 1,
            ..SimConfig::default()
        };
        let resolved = cli.resolve_config(Some(file_cfg));
        assert_eq!(resolved.num_cores, 4);
    }

    #[test]
    fn file_config_used_when_no_override() {
        let cli = Cli::parse_from(["coresim", "trace.txt"]);
        let file_cfg = SimConfig {
            associativity: 8,
            ..SimConfig::default()
        };
        let resolved = cli.resolve_config(Some(file_cfg));
        assert_eq!(resolved.associativity, 8);
    }

    #[test]
    fn json_report_format_parses() {
        let cli = Cli::parse_from(["coresim", "trace.txt", "--report", "json"]);
        assert_eq!(cli.report, ReportFormat::Json);
    }

    #[test]
    fn format_flag_defaults_to_none_for_auto_detect() {
        let cli = Cli::parse_from(["coresim", "trace.txt"]);
        assert_eq!(cli.format, None);
    }

    #[test]
    fn format_flag_overrides_extension_detection() {
        let cli = Cli::parse_from(["coresim", "trace.txt", "--format", "json"]);
        assert_eq!(cli.format, Some(TraceFormatArg::Json));
    }
}
