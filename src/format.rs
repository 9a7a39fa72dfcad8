//! Output formatting for listings and menus.

use crate::clock::Timestamp;
use crate::store::{TaskStore, TreeRow};
use crate::types::Task;
use serde::Serialize;

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Simple,
    Json,
}

const TABLE_RULE: usize = 120;
const MENU_RULE: usize = 50;

/// Single-character status marker: `*` active, `C` clean, `✓` done, `◯` open.
pub fn status_glyph(task: &Task, active: bool) -> &'static str {
    if active {
        "*"
    } else if task.clean {
        "C"
    } else if task.completed {
        "✓"
    } else {
        "◯"
    }
}

fn format_date(ts: Option<Timestamp>) -> String {
    ts.map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

/// Cut `text` to `width` characters, ending with `...` when shortened.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Prefix `content` with its number, right-aligned to the widest number.
pub fn format_numbered_item(number: usize, total: usize, content: &str) -> String {
    let width = total.to_string().len();
    format!("{:>width$}. {}", number, content, width = width)
}

/// One menu line: status, indented title and short id.
pub fn format_menu_row(task: &Task, depth: usize, active: bool) -> String {
    let short_id: String = task.id.chars().take(8).collect();
    format!(
        "{} {}{} [{}]",
        status_glyph(task, active),
        indent(depth),
        task.title,
        short_id
    )
}

/// Columns with status, title/description and lifecycle dates.
pub fn format_table(heading: &str, rows: &[TreeRow<'_>], store: &TaskStore, width: usize) -> String {
    let rule = "-".repeat(TABLE_RULE);
    let mut out = String::new();

    out.push_str(&format!("\n{}:\n{}\n", heading, rule));
    out.push_str(&format!(
        "{:<2} {:<1} {:<width$} {:<12} {:<12} {:<12}\n",
        "",
        "",
        "Description",
        "Created",
        "Completed",
        "Cleaned",
        width = width
    ));
    out.push_str(&rule);
    out.push('\n');

    for (task, depth) in rows {
        let mut combined = format!("{}{}", indent(*depth), task.title);
        if task.has_description() {
            combined.push_str(": ");
            combined.push_str(&task.description);
        }
        // Pad by characters, not bytes, so glyphs and accents line up.
        let combined = truncate(&combined, width);
        let pad = width.saturating_sub(combined.chars().count());

        out.push_str(&format!(
            "{:<2} {:<1} {}{} {:<12} {:<12} {:<12}\n",
            "",
            status_glyph(task, store.is_active(&task.id)),
            combined,
            " ".repeat(pad),
            format_date(Some(task.created_at)),
            format_date(task.completed_at),
            format_date(task.cleaned_at),
        ));
    }
    out
}

/// Indented titles with creation date and description underneath.
pub fn format_simple(heading: &str, rows: &[TreeRow<'_>], store: &TaskStore) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}:\n{}\n", heading, "-".repeat(MENU_RULE)));

    for (task, depth) in rows {
        let pad = indent(*depth);
        out.push_str(&format!(
            "  {} {}{} [{}]\n",
            status_glyph(task, store.is_active(&task.id)),
            pad,
            task.title,
            format_date(Some(task.created_at)),
        ));
        if task.has_description() {
            out.push_str(&format!("     {}{}\n", pad, task.description));
        }
    }
    out
}

#[derive(Serialize)]
struct JsonRow<'a> {
    depth: usize,
    active: bool,
    #[serde(flatten)]
    task: &'a Task,
}

/// Rows as a JSON array; each task record gains `depth` and `active`.
pub fn format_json(rows: &[TreeRow<'_>], store: &TaskStore) -> serde_json::Result<String> {
    let rows: Vec<JsonRow<'_>> = rows
        .iter()
        .map(|(task, depth)| JsonRow {
            depth: *depth,
            active: store.is_active(&task.id),
            task: *task,
        })
        .collect();
    serde_json::to_string_pretty(&rows)
}
