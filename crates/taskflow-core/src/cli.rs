use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::builder::ValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::task::{DueDate, Priority};
use crate::view::{SortBy, StatusFilter};

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

fn priority_parser() -> ValueParser {
    ValueParser::new(|s: &str| s.parse::<Priority>())
}

fn due_date_parser() -> ValueParser {
    ValueParser::new(|s: &str| s.parse::<DueDate>())
}

fn filter_parser() -> ValueParser {
    ValueParser::new(|s: &str| s.parse::<StatusFilter>())
}

fn sort_parser() -> ValueParser {
    ValueParser::new(|s: &str| s.parse::<SortBy>())
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "taskflow",
    version,
    about = "TaskFlow: organize your tasks from the terminal"
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Override a config key for this run.
    #[arg(
        long = "rc",
        value_name = "KEY=VALUE",
        value_parser = ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "rc-file", global = true)]
    pub rc_file: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Add a task.
    Add(AddArgs),
    /// Show tasks through the filter, search and sort pipeline.
    List(ListArgs),
    /// Flip a task between done and active.
    Toggle { id: u64 },
    /// Change a task's text, priority or due date.
    Edit(EditArgs),
    /// Delete a task after confirmation.
    Delete {
        id: u64,
        /// Skip the confirmation prompt.
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
    /// Show total, done and progress.
    Stats,
    /// Interactive session reading commands from stdin.
    Shell,
}

impl Default for Command {
    fn default() -> Self {
        Command::List(ListArgs::default())
    }
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,

    #[arg(short = 'p', long = "priority", value_parser = priority_parser())]
    pub priority: Option<Priority>,

    #[arg(short = 'd', long = "due", value_name = "YYYY-MM-DD", value_parser = due_date_parser())]
    pub due: Option<DueDate>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[arg(short = 'f', long = "filter", value_parser = filter_parser())]
    pub filter: Option<StatusFilter>,

    #[arg(short = 's', long = "search")]
    pub search: Option<String>,

    #[arg(long = "sort", value_parser = sort_parser())]
    pub sort: Option<SortBy>,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    pub id: u64,

    #[arg(long = "text")]
    pub text: Option<String>,

    #[arg(short = 'p', long = "priority", value_parser = priority_parser())]
    pub priority: Option<Priority>,

    #[arg(
        short = 'd',
        long = "due",
        value_name = "YYYY-MM-DD",
        value_parser = due_date_parser(),
        conflicts_with = "clear_due"
    )]
    pub due: Option<DueDate>,

    #[arg(long = "clear-due")]
    pub clear_due: bool,
}

/// One line typed into the interactive shell; the first word names the
/// command.
#[derive(Parser, Debug)]
#[command(multicall = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Subcommand, Debug)]
pub enum ShellCommand {
    /// Add a task from the form, optionally setting its text first.
    #[command(alias = "submit")]
    Add {
        text: Vec<String>,
        #[arg(short = 'p', long = "priority", value_parser = priority_parser())]
        priority: Option<Priority>,
        #[arg(short = 'd', long = "due", value_parser = due_date_parser())]
        due: Option<DueDate>,
    },
    /// Set the form priority.
    Priority {
        #[arg(value_parser = priority_parser())]
        priority: Priority,
    },
    /// Step the form priority Low, Medium, High, Low.
    Cycle,
    /// Set the form due date; no date clears it.
    Due {
        #[arg(value_parser = due_date_parser())]
        date: Option<DueDate>,
    },
    /// Show the add form.
    Form,
    Toggle { id: u64 },
    /// Start editing a task, discarding any open draft.
    Edit { id: u64 },
    /// Set the draft text.
    Text { text: Vec<String> },
    DraftPriority {
        #[arg(value_parser = priority_parser())]
        priority: Priority,
    },
    /// Set the draft due date; no date clears it.
    DraftDue {
        #[arg(value_parser = due_date_parser())]
        date: Option<DueDate>,
    },
    /// Show the open draft.
    Draft,
    Save,
    Cancel,
    Delete {
        id: u64,
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
    Filter {
        #[arg(value_parser = filter_parser())]
        filter: StatusFilter,
    },
    /// Set the search text; no words clears it.
    Search { text: Vec<String> },
    Sort {
        #[arg(value_parser = sort_parser())]
        sort_by: SortBy,
    },
    List,
    Stats,
    #[command(alias = "exit")]
    Quit,
}

pub fn default_log_level(verbose: u8, quiet: u8) -> &'static str {
    match (quiet, verbose) {
        (q, _) if q >= 2 => "error",
        (1, _) => "warn",
        (_, v) if v >= 3 => "trace",
        (_, 2) => "debug",
        (_, 1) => "info",
        _ => "warn",
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_log_level(verbose, quiet)))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_with_priority_and_due() {
        let cli = GlobalCli::try_parse_from([
            "taskflow", "--data", "/tmp/tf", "add", "buy", "milk", "-p", "high", "-d", "2024-05-01",
        ])
        .expect("parse");

        let Some(Command::Add(args)) = cli.command else {
            panic!("expected add command");
        };
        assert_eq!(args.text, vec!["buy", "milk"]);
        assert_eq!(args.priority, Some(Priority::High));
        assert_eq!(args.due.map(|d| d.to_string()).as_deref(), Some("2024-05-01"));
        assert_eq!(cli.data, Some(PathBuf::from("/tmp/tf")));
    }

    #[test]
    fn rejects_bad_priority_and_date() {
        assert!(GlobalCli::try_parse_from(["taskflow", "add", "x", "-p", "urgent"]).is_err());
        assert!(GlobalCli::try_parse_from(["taskflow", "add", "x", "-d", "tomorrow"]).is_err());
        assert!(
            GlobalCli::try_parse_from(["taskflow", "edit", "1", "-d", "2024-01-01", "--clear-due"])
                .is_err()
        );
    }

    #[test]
    fn rc_overrides_accumulate() {
        let cli = GlobalCli::try_parse_from([
            "taskflow", "--rc", "color=off", "--rc", "default.sort = due", "stats",
        ])
        .expect("parse");
        let pairs: Vec<_> = cli
            .rc_overrides
            .iter()
            .map(|kv| (kv.key.as_str(), kv.value.as_str()))
            .collect();
        assert_eq!(pairs, vec![("color", "off"), ("default.sort", "due")]);
        assert!(matches!(cli.command, Some(Command::Stats)));
    }

    #[test]
    fn shell_lines_dispatch_on_first_word() {
        let line = ShellLine::try_parse_from(["draft-due", "2024-01-02"]).expect("parse");
        assert!(matches!(line.command, ShellCommand::DraftDue { date: Some(_) }));

        let line = ShellLine::try_parse_from(["exit"]).expect("parse");
        assert!(matches!(line.command, ShellCommand::Quit));

        assert!(ShellLine::try_parse_from(["frobnicate"]).is_err());
    }

    #[test]
    fn log_level_follows_flags() {
        assert_eq!(default_log_level(0, 0), "warn");
        assert_eq!(default_log_level(1, 0), "info");
        assert_eq!(default_log_level(2, 0), "debug");
        assert_eq!(default_log_level(5, 0), "trace");
        assert_eq!(default_log_level(3, 1), "warn");
        assert_eq!(default_log_level(0, 2), "error");
    }
}
