//! CLI argument definitions for the pipeline.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "pv-pipeline",
    version,
    about = "Resolve reported drug names to ingredients and score drug-event signals",
    long_about = "Resolve free-text drug names from adverse-event reports to standardized \
                  ingredient concepts, then compute disproportionality statistics \
                  (PRR, ROR, IC, chi-squared) for every drug-event pair.\n\n\
                  Options are read from a TOML file (--config or PV_PIPELINE_CONFIG); \
                  command-line flags override file values."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow raw drug strings in trace-level logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve drug records, then build the contingency and score tables.
    Run(RunArgs),

    /// Resolve drug records only.
    Resolve(ResolveArgs),

    /// Print the cleaned string and lookup candidates of raw drug names.
    Normalize(NormalizeArgs),
}

/// Inputs and resolution options shared by `run` and `resolve`.
#[derive(Args)]
pub struct InputArgs {
    /// Drug record file (headered CSV or FAERS `$`-delimited DRUG file).
    #[arg(long = "drugs", value_name = "PATH")]
    pub drugs: PathBuf,

    /// Terminology atoms (`RXNCONSO.RRF` or concepts CSV).
    #[arg(long = "concepts", value_name = "PATH")]
    pub concepts: PathBuf,

    /// Terminology relations (`RXNREL.RRF` or relations CSV).
    #[arg(long = "relations", value_name = "PATH")]
    pub relations: Option<PathBuf>,

    /// Application-number / string cross-reference table.
    #[arg(long = "xref", value_name = "PATH")]
    pub xref: Option<PathBuf>,

    /// Curated manual override table.
    #[arg(long = "overrides", value_name = "PATH")]
    pub overrides: Option<PathBuf>,

    /// Seed the working table from an earlier mapping file.
    #[arg(long = "resume", value_name = "PATH")]
    pub resume: Option<PathBuf>,

    /// Output directory for tables and the run log.
    #[arg(long = "output-dir", value_name = "DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// TOML options file (default: $PV_PIPELINE_CONFIG).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Field delimiter of the cohort files (`$` for FAERS ASCII files).
    #[arg(long = "delimiter", value_name = "CHAR", default_value_t = ',')]
    pub delimiter: char,

    /// Vocabulary whose ingredient atoms are the resolution target.
    #[arg(long = "preferred-vocabulary", value_name = "SAB")]
    pub preferred_vocabulary: Option<String>,

    /// Unresolved keys seen more often than this are queued for curation.
    #[arg(long = "curation-threshold", value_name = "COUNT")]
    pub curation_threshold: Option<usize>,
}

#[derive(Parser)]
pub struct RunArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Adverse-event file (headered CSV or FAERS `$`-delimited REAC file).
    #[arg(long = "events", value_name = "PATH")]
    pub events: PathBuf,

    /// Only count drug records with these role codes (e.g. PS,SS).
    #[arg(long = "roles", value_name = "CODES", value_delimiter = ',')]
    pub roles: Vec<String>,

    /// Only count drug records from these reporting periods.
    #[arg(long = "periods", value_name = "PERIODS", value_delimiter = ',')]
    pub periods: Vec<String>,

    /// Minimum co-report count for a pair to be scored.
    #[arg(long = "min-cooccurrence", value_name = "COUNT")]
    pub min_cooccurrence: Option<i64>,

    /// Number of signals listed in the summary.
    #[arg(long = "top", value_name = "COUNT", default_value_t = 10)]
    pub top: usize,
}

#[derive(Parser)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
}

#[derive(Parser)]
pub struct NormalizeArgs {
    /// Raw drug names as they appear in reports.
    #[arg(value_name = "NAME", required = true)]
    pub names: Vec<String>,

    /// Cap on cleaning rounds (default from config, else 5).
    #[arg(long = "max-rounds", value_name = "COUNT")]
    pub max_rounds: Option<usize>,

    /// TOML options file (default: $PV_PIPELINE_CONFIG).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
