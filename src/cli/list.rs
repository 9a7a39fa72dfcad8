//! List subcommand for planit CLI
//!
//! Maps the listing flags onto store list options and picks the heading and
//! empty-state message shown to the user.

use crate::config::{DisplayConfig, ListStyle};
use crate::format::OutputFormat;
use crate::store::{ListOptions, SortOrder, StatusFilter};
use clap::{Args, ValueEnum};

/// Sibling ordering accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    /// Insertion order
    Tree,
    /// Active, open, completed, clean; newest first within each group
    Status,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Tree => SortOrder::Tree,
            SortArg::Status => SortOrder::Status,
        }
    }
}

/// Arguments for the list subcommand
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Show only completed tasks
    #[arg(long)]
    pub done: bool,

    /// Show only incomplete tasks
    #[arg(long)]
    pub undone: bool,

    /// Show only active tasks (with their parents)
    #[arg(long)]
    pub active: bool,

    /// Show only clean tasks
    #[arg(long)]
    pub clean: bool,

    /// Show only non-clean tasks (default)
    #[arg(long)]
    pub unclean: bool,

    /// Show all tasks including clean ones
    #[arg(long)]
    pub all: bool,

    /// Show simplified output
    #[arg(long, conflicts_with = "json")]
    pub simple: bool,

    /// Print rows as JSON
    #[arg(long)]
    pub json: bool,

    /// Sibling order
    #[arg(long, value_enum)]
    pub sort: Option<SortArg>,
}

/// What to list and how to talk about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListView {
    pub options: ListOptions,
    pub heading: &'static str,
    pub empty: &'static str,
}

impl ListArgs {
    /// Resolve flags in priority order: done, undone, active, clean, unclean, all.
    pub fn view(&self, display: &DisplayConfig) -> ListView {
        let sort = self.sort.map(SortOrder::from).unwrap_or(if display.sort_by_status {
            SortOrder::Status
        } else {
            SortOrder::Tree
        });

        let (status, include_clean, heading, empty) = if self.done {
            (StatusFilter::Completed, false, "Completed tasks", "No completed tasks in the project")
        } else if self.undone {
            (StatusFilter::Incomplete, false, "Incomplete tasks", "No incomplete tasks in the project")
        } else if self.active {
            (StatusFilter::Active, false, "Active tasks", "No active tasks in the project")
        } else if self.clean {
            (StatusFilter::Clean, true, "Clean tasks", "No clean tasks in the project")
        } else if self.unclean {
            (StatusFilter::All, false, "Non-clean tasks", "No non-clean tasks in the project")
        } else if self.all {
            (StatusFilter::All, true, "All tasks", "No tasks in the project")
        } else {
            (StatusFilter::All, false, "Tasks", "No tasks in the project")
        };

        ListView {
            options: ListOptions::new(status)
                .include_clean(include_clean)
                .sorted(sort),
            heading,
            empty,
        }
    }

    pub fn output_format(&self, display: &DisplayConfig) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.simple || display.style == ListStyle::Simple {
            OutputFormat::Simple
        } else {
            OutputFormat::Table
        }
    }
}
