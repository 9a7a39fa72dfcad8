//! CLI command definitions for planit
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod commands;
pub mod list;
pub mod prompt;

use clap::{Args, Parser, Subcommand};
use list::ListArgs;
use std::path::PathBuf;

/// Hierarchical task tracker for your project
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the project document (overrides config)
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a new project in the current directory
    Init,

    /// List tasks
    List(ListArgs),

    /// Create a task, or activate it if a task with that name exists
    Task(TaskArgs),

    /// Show active tasks with their parents
    Active,

    /// Mark a task and its subtasks as completed
    Done(NameArg),

    /// Mark a task and its subtasks as not completed
    Undone(NameArg),

    /// Archive a task and its subtasks
    Clean(NameArg),

    /// Restore an archived task and its subtasks
    Unclean(NameArg),

    /// Start working on a task
    Take(NameArg),

    /// Stop working on a task
    Untake(NameArg),

    /// Delete a task and its subtasks
    Delete(NameArg),

    /// Move a task under a different parent
    Move(MoveArgs),

    /// Find tasks whose title contains the given text
    Find(FindArgs),
}

/// A task picked by name, or interactively when omitted.
#[derive(Args, Debug, Default)]
pub struct NameArg {
    /// Task name (case-insensitive); prompts when omitted
    pub name: Option<String>,
}

/// Arguments for the task subcommand
#[derive(Args, Debug)]
pub struct TaskArgs {
    /// Task name
    pub name: String,

    /// Task description
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Parent task name (skips the parent menu)
    #[arg(short, long, conflicts_with = "root")]
    pub parent: Option<String>,

    /// Create at root level (skips the parent menu)
    #[arg(long)]
    pub root: bool,
}

/// Arguments for the move subcommand
#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Task name to move; prompts when omitted
    pub name: Option<String>,

    /// New parent task name; prompts when neither --to nor --root is given
    #[arg(long, conflicts_with = "root")]
    pub to: Option<String>,

    /// Move to root level
    #[arg(long)]
    pub root: bool,
}

/// Arguments for the find subcommand
#[derive(Args, Debug)]
pub struct FindArgs {
    /// Text to look for in task titles
    pub text: String,
}
