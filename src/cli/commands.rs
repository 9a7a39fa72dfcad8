//! Subcommand handlers.
//!
//! Handlers talk to the user only through a [`Prompt`], so the whole CLI can
//! be driven from tests with in-memory input and output.

use super::prompt::{MenuEntry, Prompt, Selection};
use super::{Command, MoveArgs, TaskArgs};
use crate::config::Config;
use crate::format::{self, OutputFormat, format_menu_row};
use crate::store::{EligibleRow, ListOptions, SortOrder, StatusFilter, TaskStore, TreeRow};
use anyhow::{Result, bail};
use std::io::{BufRead, Write};
use tracing::debug;

/// How to ask for a task when no name was given.
struct Pick {
    heading: &'static str,
    question: &'static str,
    empty: &'static str,
    /// Show ineligible rows unnumbered instead of hiding them.
    show_ineligible: bool,
}

const DONE: Pick = Pick {
    heading: "Available tasks to mark as completed",
    question: "Select the task number to mark as completed",
    empty: "No incomplete tasks in the project",
    show_ineligible: false,
};

const UNDONE: Pick = Pick {
    heading: "Available tasks to mark as not completed",
    question: "Select the task number to mark as not completed",
    empty: "No completed tasks in the project",
    show_ineligible: false,
};

const CLEAN: Pick = Pick {
    heading: "Available tasks to mark as clean",
    question: "Select the task number to mark as clean",
    empty: "No unclean tasks in the project",
    show_ineligible: false,
};

const UNCLEAN: Pick = Pick {
    heading: "Available tasks to mark as not clean",
    question: "Select the task number to mark as not clean",
    empty: "No clean tasks in the project",
    show_ineligible: false,
};

const TAKE: Pick = Pick {
    heading: "Available tasks to activate",
    question: "Select the task number to activate",
    empty: "No tasks available to activate",
    show_ineligible: false,
};

const UNTAKE: Pick = Pick {
    heading: "Available tasks to deactivate",
    question: "Select the task number to deactivate",
    empty: "No tasks available to deactivate",
    show_ineligible: true,
};

const DELETE: Pick = Pick {
    heading: "Available tasks to delete",
    question: "Select the task number to delete",
    empty: "No tasks in the project",
    show_ineligible: false,
};

const MOVE: Pick = Pick {
    heading: "Available tasks to move",
    question: "Select the task number to move",
    empty: "No tasks in the project",
    show_ineligible: false,
};

/// Run one subcommand against the project named in `config`.
pub fn run<R: BufRead, W: Write>(
    command: Command,
    config: &Config,
    prompt: &mut Prompt<R, W>,
) -> Result<()> {
    let path = &config.project.file;
    let load = || TaskStore::load(path);
    let sort = if config.display.sort_by_status {
        SortOrder::Status
    } else {
        SortOrder::Tree
    };
    debug!(command = ?command, path = %path.display(), "Running command");

    match command {
        Command::Init => {
            TaskStore::initialize(path, &config.project.name)?;
            prompt.say(format!("Project initialized in {}", path.display()))?;
        }
        Command::List(args) => {
            let store = load()?;
            let view = args.view(&config.display);
            let rows = store.list(view.options);
            print_rows(
                prompt,
                &store,
                &rows,
                view.heading,
                view.empty,
                args.output_format(&config.display),
                config,
            )?;
        }
        Command::Active => {
            let store = load()?;
            let rows = store.list(ListOptions::new(StatusFilter::Active).sorted(sort));
            print_rows(
                prompt,
                &store,
                &rows,
                "Active tasks",
                "No active tasks in the project",
                OutputFormat::Table,
                config,
            )?;
        }
        Command::Task(args) => create_or_activate(&mut load()?, args, sort, prompt)?,
        Command::Done(arg) => {
            let mut store = load()?;
            let rows = eligible(&store, sort, false, |_, t| !t.completed && !t.clean);
            if let Some((id, title)) = pick_task(&store, arg.name.as_deref(), rows, &DONE, prompt)? {
                store.complete(&id)?;
                prompt.say(format!("Task marked as completed: {}", title))?;
            }
        }
        Command::Undone(arg) => {
            let mut store = load()?;
            let rows = eligible(&store, sort, true, |_, t| t.completed && !t.clean);
            if let Some((id, title)) = pick_task(&store, arg.name.as_deref(), rows, &UNDONE, prompt)? {
                store.uncomplete(&id)?;
                prompt.say(format!("Task marked as not completed: {}", title))?;
            }
        }
        Command::Clean(arg) => {
            let mut store = load()?;
            let rows = eligible(&store, sort, false, |_, t| !t.clean);
            if let Some((id, title)) = pick_task(&store, arg.name.as_deref(), rows, &CLEAN, prompt)? {
                store.mark_clean(&id)?;
                prompt.say(format!("Task marked as clean: {}", title))?;
            }
        }
        Command::Unclean(arg) => {
            let mut store = load()?;
            let rows = eligible(&store, sort, true, |_, t| t.clean);
            if let Some((id, title)) = pick_task(&store, arg.name.as_deref(), rows, &UNCLEAN, prompt)? {
                store.mark_unclean(&id)?;
                prompt.say(format!("Task marked as not clean: {}", title))?;
            }
        }
        Command::Take(arg) => {
            let mut store = load()?;
            let rows = store.takeable(sort);
            if let Some((id, title)) = pick_task(&store, arg.name.as_deref(), rows, &TAKE, prompt)? {
                store.add_active(&id)?;
                prompt.say(format!("Task activated: {}", title))?;
            }
        }
        Command::Untake(arg) => {
            let mut store = load()?;
            let rows = store.untakeable(sort);
            if let Some((id, title)) = pick_task(&store, arg.name.as_deref(), rows, &UNTAKE, prompt)? {
                store.remove_active(&id)?;
                prompt.say(format!("Task deactivated: {}", title))?;
            }
        }
        Command::Delete(arg) => {
            let mut store = load()?;
            let rows = eligible(&store, sort, true, |_, _| true);
            if let Some((id, title)) = pick_task(&store, arg.name.as_deref(), rows, &DELETE, prompt)? {
                let removed = store.delete(&id)?;
                prompt.say(format!("Task deleted: {} ({} total)", title, removed))?;
            }
        }
        Command::Move(args) => move_task(&mut load()?, args, sort, prompt)?,
        Command::Find(args) => {
            let store = load()?;
            let matches = store.find_by_partial_name(&args.text);
            if matches.is_empty() {
                prompt.say(format!("No tasks matching '{}'", args.text))?;
            }
            for task in matches {
                prompt.say(format_menu_row(task, 0, store.is_active(&task.id)))?;
            }
        }
    }

    Ok(())
}

fn print_rows<R: BufRead, W: Write>(
    prompt: &mut Prompt<R, W>,
    store: &TaskStore,
    rows: &[TreeRow<'_>],
    heading: &str,
    empty: &str,
    output: OutputFormat,
    config: &Config,
) -> Result<()> {
    if output == OutputFormat::Json {
        prompt.say(format::format_json(rows, store)?)?;
        return Ok(());
    }
    if rows.is_empty() {
        prompt.say(empty)?;
        return Ok(());
    }
    let text = match output {
        OutputFormat::Simple => format::format_simple(heading, rows, store),
        _ => format::format_table(heading, rows, store, config.display.description_width),
    };
    prompt.print(text)?;
    Ok(())
}

/// Walk of the forest annotated by `is_eligible`.
fn eligible<'a, F>(
    store: &'a TaskStore,
    sort: SortOrder,
    include_clean: bool,
    is_eligible: F,
) -> Vec<EligibleRow<'a>>
where
    F: Fn(&TaskStore, &crate::types::Task) -> bool,
{
    store
        .list(ListOptions::default().include_clean(include_clean).sorted(sort))
        .into_iter()
        .map(|(task, depth)| (task, depth, is_eligible(store, task)))
        .collect()
}

/// Resolve a task by exact name, or ask the user to pick one of `rows`.
///
/// Returns `None` when the user cancels or makes an invalid choice.
fn pick_task<R: BufRead, W: Write>(
    store: &TaskStore,
    name: Option<&str>,
    rows: Vec<EligibleRow<'_>>,
    pick: &Pick,
    prompt: &mut Prompt<R, W>,
) -> Result<Option<(String, String)>> {
    if let Some(name) = name {
        return match store.find_by_exact_name(name) {
            Some(task) => Ok(Some((task.id.clone(), task.title.clone()))),
            None => bail!("Task '{}' not found", name),
        };
    }

    if !rows.iter().any(|(_, _, ok)| *ok) {
        prompt.say(pick.empty)?;
        return Ok(None);
    }

    let shown: Vec<&EligibleRow<'_>> = rows
        .iter()
        .filter(|(_, _, ok)| *ok || pick.show_ineligible)
        .collect();
    let entries: Vec<MenuEntry> = shown
        .iter()
        .map(|(task, depth, ok)| MenuEntry {
            line: format_menu_row(task, *depth, store.is_active(&task.id)),
            selectable: *ok,
        })
        .collect();

    match prompt.select(pick.heading, pick.question, &entries, None)? {
        Selection::Item(index) => {
            let (task, _, _) = shown[index];
            Ok(Some((task.id.clone(), task.title.clone())))
        }
        Selection::Invalid => {
            prompt.say("Invalid selection")?;
            Ok(None)
        }
        Selection::Zero | Selection::Cancelled => {
            prompt.say("\nOperation cancelled")?;
            Ok(None)
        }
    }
}

/// Ask for a parent among `rows`; `Ok(Some(None))` means root level.
fn pick_parent<R: BufRead, W: Write>(
    store: &TaskStore,
    rows: &[EligibleRow<'_>],
    heading: &str,
    question: &str,
    prompt: &mut Prompt<R, W>,
) -> Result<Option<Option<(String, String)>>> {
    let entries: Vec<MenuEntry> = rows
        .iter()
        .map(|(task, depth, ok)| MenuEntry {
            line: format_menu_row(task, *depth, store.is_active(&task.id)),
            selectable: *ok,
        })
        .collect();

    match prompt.select(heading, question, &entries, Some("Root level (no parent)"))? {
        Selection::Zero => Ok(Some(None)),
        Selection::Item(index) => {
            let (task, _, _) = rows[index];
            Ok(Some(Some((task.id.clone(), task.title.clone()))))
        }
        Selection::Invalid => {
            prompt.say("Invalid selection")?;
            Ok(None)
        }
        Selection::Cancelled => {
            prompt.say("\nOperation cancelled")?;
            Ok(None)
        }
    }
}

fn create_or_activate<R: BufRead, W: Write>(
    store: &mut TaskStore,
    args: TaskArgs,
    sort: SortOrder,
    prompt: &mut Prompt<R, W>,
) -> Result<()> {
    if let Some(existing) = store.find_by_exact_name(&args.name) {
        let (id, title) = (existing.id.clone(), existing.title.clone());
        store.add_active(&id)?;
        prompt.say(format!("Task activated: {}", title))?;
        return Ok(());
    }

    let parent = if args.root {
        None
    } else if let Some(parent_name) = args.parent.as_deref() {
        match store.find_by_exact_name(parent_name) {
            Some(task) => Some((task.id.clone(), task.title.clone())),
            None => bail!("Task '{}' not found", parent_name),
        }
    } else {
        let rows = eligible(store, sort, false, |_, t| !t.completed);
        match pick_parent(
            store,
            &rows,
            "Select parent task (0 for root level)",
            "Select the parent task number",
            prompt,
        )? {
            Some(parent) => parent,
            None => return Ok(()),
        }
    };

    match parent {
        Some((parent_id, parent_title)) => {
            store.create_task(&args.name, &args.description, Some(&parent_id))?;
            prompt.say(format!("Subtask created: {} (of {})", args.name.trim(), parent_title))?;
        }
        None => {
            store.create_task(&args.name, &args.description, None)?;
            prompt.say(format!("Task created: {}", args.name.trim()))?;
        }
    }
    Ok(())
}

fn move_task<R: BufRead, W: Write>(
    store: &mut TaskStore,
    args: MoveArgs,
    sort: SortOrder,
    prompt: &mut Prompt<R, W>,
) -> Result<()> {
    let rows = eligible(store, sort, false, |_, _| true);
    let Some((task_id, title)) = pick_task(store, args.name.as_deref(), rows, &MOVE, prompt)?
    else {
        return Ok(());
    };

    let target = if args.root {
        None
    } else if let Some(to) = args.to.as_deref() {
        match store.find_by_exact_name(to) {
            Some(task) => Some((task.id.clone(), task.title.clone())),
            None => bail!("Task '{}' not found", to),
        }
    } else {
        // Tasks inside the moving subtree and clean tasks are shown but not offered.
        let rows = eligible(store, sort, false, |s, t| {
            !t.clean && !s.is_ancestor_or_self(&task_id, &t.id)
        });
        match pick_parent(
            store,
            &rows,
            &format!("Select new parent for '{}' (0 for root level)", title),
            "Select the new parent task number",
            prompt,
        )? {
            Some(target) => target,
            None => return Ok(()),
        }
    };

    match target {
        Some((parent_id, parent_title)) => {
            store.move_task(&task_id, Some(&parent_id))?;
            prompt.say(format!("Task moved: {} (under {})", title, parent_title))?;
        }
        None => {
            store.move_task(&task_id, None)?;
            prompt.say(format!("Task moved to root level: {}", title))?;
        }
    }
    Ok(())
}
