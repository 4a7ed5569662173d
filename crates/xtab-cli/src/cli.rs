//! CLI argument definitions.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{Args, ColorChoice, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use tracing::level_filters::LevelFilter;

use xtab_cli::logging::{LogConfig, LogFormat};
use xtab_cli::request::RequestOverrides;

#[derive(Parser)]
#[command(
    name = "xtab",
    version,
    about = "Survey cross-tabulation with significance testing",
    long_about = "Cross-tabulate survey variables and test them for independence.\n\n\
                  Reads CSV files (optionally with a question-label row above the\n\
                  variable names), runs chi-square, phi / Cramér's V, contingency\n\
                  coefficient, and Fisher's exact tests, and executes analysis plans."
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

    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow respondent values in trace-level logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

impl Cli {
    /// Logging setup implied by the global flags.
    ///
    /// `--log-level` beats `-v`/`-q`; either one disables `RUST_LOG`. ANSI
    /// colors follow `--color`, and `auto` only colors a terminal stderr.
    pub fn log_config(&self) -> LogConfig {
        let level_filter = self
            .log_level
            .map_or_else(|| self.verbosity.tracing_level_filter(), LevelFilter::from);
        let with_ansi = match self.color.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.log_file.is_none() && io::stderr().is_terminal(),
        };
        LogConfig {
            level_filter,
            use_env_filter: !self.verbosity.is_present() && self.log_level.is_none(),
            with_ansi,
            format: self.log_format.into(),
            log_file: self.log_file.clone(),
            log_data: self.log_data,
            ..LogConfig::default()
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Cross-tabulate row variables against column variables.
    Crosstab(CrosstabArgs),

    /// Execute an analysis plan descriptor (for example an assistant's JSON reply).
    Plan(PlanArgs),

    /// Summarize one variable, or every numeric variable.
    Describe(DescribeArgs),
}

/// Options shared by commands that read a dataset.
#[derive(Args)]
pub struct DataArgs {
    /// Survey data file.
    #[arg(value_name = "DATA")]
    pub data: PathBuf,

    /// The CSV file has a question-label row above the variable names.
    #[arg(long = "label-row")]
    pub label_row: bool,

    /// Print the result as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct CrosstabArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// JSON request file; flags below override its values.
    #[arg(long = "request", value_name = "FILE")]
    pub request: Option<PathBuf>,

    /// Row variable (repeat for nested rows).
    #[arg(long = "row", value_name = "VAR")]
    pub rows: Vec<String>,

    /// Column variable (repeat for nested columns).
    #[arg(long = "col", value_name = "VAR")]
    pub cols: Vec<String>,

    /// Frequency weight column.
    #[arg(long = "weight", value_name = "VAR")]
    pub weight: Option<String>,

    /// Statistic to compute: chi-square, phi-cramer, contingency, fisher.
    #[arg(long = "stat", value_name = "NAME")]
    pub statistics: Vec<String>,

    /// Show row percentages.
    #[arg(long = "row-pct")]
    pub row_pct: bool,

    /// Show column percentages.
    #[arg(long = "col-pct")]
    pub col_pct: bool,

    /// Show percentages of the grand total.
    #[arg(long = "total-pct")]
    pub total_pct: bool,

    /// Decimal places for counts and percentages.
    #[arg(long = "decimals", value_name = "N")]
    pub decimals: Option<u32>,

    /// Keep missing values as their own category.
    #[arg(long = "include-missing")]
    pub include_missing: bool,

    /// Hide all-zero rows and columns.
    #[arg(long = "hide-empty")]
    pub hide_empty: bool,

    /// Run the chi-square test and mark significance.
    #[arg(long = "significance")]
    pub significance: bool,

    /// Significance level for the `*` band (`**` below a tenth of it).
    #[arg(long = "level", value_name = "ALPHA")]
    pub level: Option<f64>,

    /// Apply Yates' continuity correction to 2x2 chi-square tests.
    #[arg(long = "yates")]
    pub yates: bool,
}

impl CrosstabArgs {
    pub fn overrides(&self) -> RequestOverrides {
        RequestOverrides {
            rows: self.rows.clone(),
            cols: self.cols.clone(),
            weight: self.weight.clone(),
            statistics: self.statistics.clone(),
            row_pct: self.row_pct,
            col_pct: self.col_pct,
            total_pct: self.total_pct,
            decimal_places: self.decimals,
            include_missing: self.include_missing,
            hide_empty: self.hide_empty,
            significance: self.significance,
            level: self.level,
            continuity_correction: self.yates,
        }
    }
}

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// File holding the plan descriptor; `-` reads standard input.
    #[arg(long = "plan", value_name = "FILE")]
    pub plan: PathBuf,
}

#[derive(Args)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Variable to describe; all numeric variables when omitted.
    #[arg(value_name = "VARIABLE")]
    pub variable: Option<String>,
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

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        }
    }
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}
