//! Interactive numbered menus.

use crate::format::format_numbered_item;
use std::io::{self, BufRead, Write};

/// One line of a menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub line: String,
    /// Unselectable entries are shown without a number, for context.
    pub selectable: bool,
}

/// Outcome of a menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Index into the entries passed to [`Prompt::select`].
    Item(usize),
    /// The extra `0` option was picked.
    Zero,
    /// A number outside the menu was entered.
    Invalid,
    /// Non-numeric input or end of input.
    Cancelled,
}

/// Reads answers from `input` and writes menus and messages to `output`.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print a line.
    pub fn say(&mut self, message: impl AsRef<str>) -> io::Result<()> {
        writeln!(self.output, "{}", message.as_ref())
    }

    /// Print text as-is.
    pub fn print(&mut self, text: impl AsRef<str>) -> io::Result<()> {
        write!(self.output, "{}", text.as_ref())
    }

    /// Show a numbered menu and read the user's choice.
    ///
    /// Only selectable entries get a number; `zero`, when given, is offered as
    /// option `0` above the list.
    pub fn select(
        &mut self,
        heading: &str,
        question: &str,
        entries: &[MenuEntry],
        zero: Option<&str>,
    ) -> io::Result<Selection> {
        let total = entries.iter().filter(|e| e.selectable).count();
        let pad = " ".repeat(total.to_string().len() + 2);

        writeln!(self.output, "\n{}:", heading)?;
        writeln!(self.output, "{}", "-".repeat(50))?;
        if let Some(zero) = zero {
            writeln!(self.output, "0. {}", zero)?;
        }

        let mut numbered: Vec<usize> = Vec::with_capacity(total);
        for (index, entry) in entries.iter().enumerate() {
            if entry.selectable {
                numbered.push(index);
                writeln!(
                    self.output,
                    "{}",
                    format_numbered_item(numbered.len(), total, &entry.line)
                )?;
            } else {
                writeln!(self.output, "{}{}", pad, entry.line)?;
            }
        }

        write!(self.output, "\n{}: ", question)?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Ok(Selection::Cancelled);
        }
        let Ok(choice) = answer.trim().parse::<usize>() else {
            return Ok(Selection::Cancelled);
        };

        Ok(match choice {
            0 if zero.is_some() => Selection::Zero,
            n if (1..=numbered.len()).contains(&n) => Selection::Item(numbered[n - 1]),
            _ => Selection::Invalid,
        })
    }

    pub fn into_output(self) -> W {
        self.output
    }
}
