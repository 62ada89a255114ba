//! These structs provide the CLI interface for the finny CLI.

use crate::model::{Amount, TimeRange};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// finny: spending statistics and savings goals from the command line.
///
/// Record expenses with `finny add` or `finny import`, then see where the money went with
/// `finny stats`: totals per month, totals per category, the grand total and the average spent in
/// the months that had any spending. `finny watch` keeps those numbers on screen and redraws them
/// whenever the expenses change.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory, the configuration file and an empty database.
    ///
    /// This is the first command you should run. By default the data directory is $HOME/finny,
    /// pass --finny-home (or set FINNY_HOME) to put it somewhere else.
    Init,
    /// Record a single expense.
    Add(AddArgs),
    /// Record every expense in a CSV file with the headers Date,Amount,Description.
    Import(ImportArgs),
    /// Print every recorded expense, newest first.
    List,
    /// Remove an expense by its id, as shown by `finny list`.
    Delete(DeleteArgs),
    /// Print spending statistics for a time range.
    Stats(StatsArgs),
    /// Print spending statistics and print them again whenever they change. Stop with Ctrl-C.
    Watch(WatchArgs),
    /// Manage savings goals.
    Goal(GoalArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where finny data and configuration is held. Defaults to ~/finny
    #[arg(long, env = "FINNY_HOME", default_value_t = default_finny_home())]
    finny_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, finny_home: PathBuf) -> Self {
        Self {
            log_level,
            finny_home: finny_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn finny_home(&self) -> &DisplayPath {
        &self.finny_home
    }
}

/// Args for the `finny add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// The day the money was spent, e.g. 2025-03-14. Defaults to today.
    #[arg(long)]
    date: Option<String>,

    /// How much was spent, e.g. 42.50 or "$1,200.00".
    #[arg(long, allow_hyphen_values = true)]
    amount: Amount,

    /// What the money was spent on. This is also the expense's category.
    #[arg(long)]
    description: Option<String>,
}

impl AddArgs {
    pub fn new(date: Option<String>, amount: Amount, description: Option<String>) -> Self {
        Self {
            date,
            amount,
            description,
        }
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Args for the `finny import` command.
#[derive(Debug, Parser, Clone)]
pub struct ImportArgs {
    /// The CSV file to read.
    file: PathBuf,
}

impl ImportArgs {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// Args for the `finny delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    id: String,
}

impl DeleteArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// How `finny stats` prints its results.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned tables for reading.
    #[default]
    Text,
    /// The full report as JSON.
    Json,
}

serde_plain::derive_display_from_serialize!(OutputFormat);
serde_plain::derive_fromstr_from_deserialize!(OutputFormat);

/// Args for the `finny stats` command.
#[derive(Debug, Parser, Clone)]
pub struct StatsArgs {
    /// One of 6months, 1year or all. Defaults to default_range in config.json.
    #[arg(long)]
    range: Option<TimeRange>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl StatsArgs {
    pub fn new(range: Option<TimeRange>, format: OutputFormat) -> Self {
        Self { range, format }
    }

    pub fn range(&self) -> Option<TimeRange> {
        self.range
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

/// Args for the `finny watch` command.
#[derive(Debug, Parser, Clone)]
pub struct WatchArgs {
    /// One of 6months, 1year or all. Defaults to default_range in config.json.
    #[arg(long)]
    range: Option<TimeRange>,

    /// Seconds between re-reads of the expenses. Defaults to poll_interval_secs in config.json.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,
}

impl WatchArgs {
    pub fn new(range: Option<TimeRange>, interval: Option<u64>) -> Self {
        Self { range, interval }
    }

    pub fn range(&self) -> Option<TimeRange> {
        self.range
    }

    pub fn interval(&self) -> Option<u64> {
        self.interval
    }
}

/// Args for the `finny goal` command.
#[derive(Debug, Parser, Clone)]
pub struct GoalArgs {
    #[command(subcommand)]
    action: GoalCommand,
}

impl GoalArgs {
    pub fn new(action: GoalCommand) -> Self {
        Self { action }
    }

    pub fn action(&self) -> &GoalCommand {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum GoalCommand {
    /// Start saving toward something.
    Add(GoalAddArgs),
    /// Show every goal and the combined progress.
    List,
    /// Put money toward a goal, or take it out with a negative amount.
    Contribute(ContributeArgs),
}

/// Args for the `finny goal add` command.
#[derive(Debug, Parser, Clone)]
pub struct GoalAddArgs {
    /// The goal's name, e.g. "New Laptop". Must be unique.
    title: String,

    /// How much the goal needs.
    #[arg(long)]
    target: Amount,

    #[arg(long)]
    description: Option<String>,

    /// When the goal should be reached, free text such as "December 2025".
    #[arg(long)]
    deadline: Option<String>,
}

impl GoalAddArgs {
    pub fn new(
        title: impl Into<String>,
        target: Amount,
        description: Option<String>,
        deadline: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            target,
            description,
            deadline,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn target(&self) -> Amount {
        self.target
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn deadline(&self) -> Option<&str> {
        self.deadline.as_deref()
    }
}

/// Args for the `finny goal contribute` command.
#[derive(Debug, Parser, Clone)]
pub struct ContributeArgs {
    /// The goal's title or id.
    goal: String,

    /// How much to add. Use a negative amount to withdraw.
    #[arg(allow_hyphen_values = true)]
    amount: Amount,
}

impl ContributeArgs {
    pub fn new(goal: impl Into<String>, amount: Amount) -> Self {
        Self {
            goal: goal.into(),
            amount,
        }
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }
}

fn default_finny_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("finny"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --finny-home or FINNY_HOME instead of relying on the default \
                finny home directory.",
            );
            PathBuf::from("finny")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}
