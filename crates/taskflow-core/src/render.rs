use std::io::{self, IsTerminal, Write};

use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::session::Draft;
use crate::stats::Stats;
use crate::task::Task;

pub const EMPTY_STATE: &str =
    "Ready to be productive? Add your first task to get started with TaskFlow.";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.color()? && io::stdout().is_terminal();
        Ok(Self { color })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    /// Task table followed by the stats line, or the empty-state message.
    #[tracing::instrument(skip_all, fields(rows = tasks.len()))]
    pub fn write_view<W: Write>(
        &self,
        out: &mut W,
        tasks: &[Task],
        stats: Stats,
        today: NaiveDate,
        editing: Option<u64>,
    ) -> anyhow::Result<()> {
        if tasks.is_empty() {
            writeln!(out, "{EMPTY_STATE}")?;
        } else {
            self.write_task_table(out, tasks, today, editing)?;
        }
        self.write_stats(out, stats)
    }

    pub fn write_task_table<W: Write>(
        &self,
        out: &mut W,
        tasks: &[Task],
        today: NaiveDate,
        editing: Option<u64>,
    ) -> anyhow::Result<()> {
        let headers = ["ID", "Done", "Priority", "Due", "Text"]
            .map(str::to_string)
            .to_vec();

        let mut rows = Vec::with_capacity(tasks.len());
        for task in tasks {
            let id = self.paint(&task.id.to_string(), "33");
            let done = if task.completed { "[x]" } else { "[ ]" }.to_string();

            let due = task.due_date.map(|due| due.to_string()).unwrap_or_default();
            let due = if task.is_overdue(today) {
                self.paint(&due, "31")
            } else {
                due
            };

            let text = if editing == Some(task.id) {
                format!("{} (editing)", task.text)
            } else {
                task.text.clone()
            };

            rows.push(vec![id, done, task.priority.to_string(), due, text]);
        }

        write_table(out, headers, rows)
    }

    pub fn write_stats<W: Write>(&self, out: &mut W, stats: Stats) -> anyhow::Result<()> {
        writeln!(
            out,
            "Total {}  Done {}  Progress {}%",
            stats.total, stats.done, stats.progress_percent
        )?;
        Ok(())
    }

    pub fn write_draft<W: Write>(&self, out: &mut W, draft: &Draft) -> anyhow::Result<()> {
        writeln!(out, "editing   {}", draft.task_id)?;
        writeln!(out, "text      {}", draft.text)?;
        writeln!(out, "priority  {}", draft.priority)?;
        writeln!(
            out,
            "due       {}",
            draft.due_date.map(|due| due.to_string()).unwrap_or_default()
        )?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || text.is_empty() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    writer: &mut W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(header.as_str()))
        .collect();

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    write_row(writer, &headers, &widths)?;
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    write_row(writer, &rule, &widths)?;
    for row in &rows {
        write_row(writer, row, &widths)?;
    }

    Ok(())
}

fn write_row<W: Write>(writer: &mut W, cells: &[String], widths: &[usize]) -> anyhow::Result<()> {
    let last = cells.len().saturating_sub(1);
    for (idx, cell) in cells.iter().enumerate() {
        if idx == last {
            write!(writer, "{cell}")?;
        } else {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
    }
    writeln!(writer)?;
    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
