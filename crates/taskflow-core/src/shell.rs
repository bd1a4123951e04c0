use std::io::{BufRead, Write};

use chrono::NaiveDate;
use clap::Parser;
use tracing::{debug, info, warn};

use crate::app::App;
use crate::cli::{ShellCommand, ShellLine};
use crate::commands::{cmd_delete, cmd_toggle};
use crate::ids::IdSource;
use crate::prompt::{AssumeYes, LineConfirm};
use crate::render::Renderer;
use crate::session::SaveOutcome;
use crate::storage::KeyValueStore;

pub const PROMPT: &str = "taskflow> ";

enum Flow {
    Continue,
    Quit,
}

/// Reads commands line by line until `quit` or end of input. State such as
/// the add form, the edit session and view preferences lives in `app` for
/// the whole loop.
#[tracing::instrument(skip_all)]
pub fn run_shell<S, I, R, W>(
    app: &mut App<S, I>,
    renderer: &Renderer,
    mut input: R,
    mut out: W,
    today: NaiveDate,
) -> anyhow::Result<()>
where
    S: KeyValueStore,
    I: IdSource,
    R: BufRead,
    W: Write,
{
    info!("shell started");
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }

        let words = match shell_words::split(line.trim()) {
            Ok(words) => words,
            Err(err) => {
                writeln!(out, "error: {err}")?;
                continue;
            }
        };
        if words.is_empty() {
            continue;
        }

        let parsed = match ShellLine::try_parse_from(&words) {
            Ok(parsed) => parsed,
            Err(err) => {
                write!(out, "{err}")?;
                continue;
            }
        };

        match execute(app, renderer, parsed.command, &mut input, &mut out, today) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "shell command failed");
                writeln!(out, "error: {err:#}")?;
            }
        }
    }
    info!("shell finished");
    Ok(())
}

fn execute<S, I, R, W>(
    app: &mut App<S, I>,
    renderer: &Renderer,
    command: ShellCommand,
    input: &mut R,
    out: &mut W,
    today: NaiveDate,
) -> anyhow::Result<Flow>
where
    S: KeyValueStore,
    I: IdSource,
    R: BufRead,
    W: Write,
{
    debug!(?command, "shell command");

    match command {
        ShellCommand::Add { text, priority, due } => {
            if !text.is_empty() {
                app.set_form_text(text.join(" "));
            }
            if let Some(priority) = priority {
                app.set_form_priority(priority);
            }
            if due.is_some() {
                app.set_form_due_date(due);
            }
            if let Some(task) = app.submit_new_task()? {
                writeln!(out, "Created task {}.", task.id)?;
            }
        }
        ShellCommand::Priority { priority } => app.set_form_priority(priority),
        ShellCommand::Cycle => {
            let priority = app.cycle_form_priority();
            writeln!(out, "Priority {priority}")?;
        }
        ShellCommand::Due { date } => app.set_form_due_date(date),
        ShellCommand::Form => {
            let form = app.form();
            writeln!(out, "text      {}", form.text)?;
            writeln!(out, "priority  {}", form.priority)?;
            writeln!(
                out,
                "due       {}",
                form.due_date.map(|due| due.to_string()).unwrap_or_default()
            )?;
        }
        ShellCommand::Toggle { id } => cmd_toggle(app, id, out)?,
        ShellCommand::Edit { id } => {
            if !app.start_edit(id) {
                writeln!(out, "No task with id {id}.")?;
            }
        }
        ShellCommand::Text { text } => {
            if !app.set_draft_text(text.join(" ")) {
                writeln!(out, "Not editing.")?;
            }
        }
        ShellCommand::DraftPriority { priority } => {
            if !app.set_draft_priority(priority) {
                writeln!(out, "Not editing.")?;
            }
        }
        ShellCommand::DraftDue { date } => {
            if !app.set_draft_due_date(date) {
                writeln!(out, "Not editing.")?;
            }
        }
        ShellCommand::Draft => match app.session().draft() {
            Some(draft) => renderer.write_draft(out, draft)?,
            None => writeln!(out, "Not editing.")?,
        },
        ShellCommand::Save => match app.save_edit()? {
            SaveOutcome::Saved { task_id, .. } => writeln!(out, "Modified task {task_id}.")?,
            SaveOutcome::Refused => {}
            SaveOutcome::NotEditing => writeln!(out, "Not editing.")?,
        },
        ShellCommand::Cancel => {
            app.cancel_edit();
        }
        ShellCommand::Delete { id, yes } => {
            if yes || app.store().get(id).is_none() {
                cmd_delete(app, id, &mut AssumeYes, out)?;
            } else {
                let removed = {
                    let mut confirm = LineConfirm::new(&mut *input, &mut *out);
                    app.delete_with_confirmation(id, &mut confirm)?
                };
                if removed {
                    writeln!(out, "Deleted task {id}.")?;
                } else {
                    writeln!(out, "Task {id} kept.")?;
                }
            }
        }
        ShellCommand::Filter { filter } => app.set_filter(filter),
        ShellCommand::Search { text } => app.set_search(text.join(" ")),
        ShellCommand::Sort { sort_by } => app.set_sort(sort_by),
        ShellCommand::List => {
            let rows = app.visible_tasks();
            renderer.write_view(out, &rows, app.stats(), today, app.editing_task_id())?;
        }
        ShellCommand::Stats => renderer.write_stats(out, app.stats())?,
        ShellCommand::Quit => return Ok(Flow::Quit),
    }

    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::ids::SequentialIds;
    use crate::storage::MemoryStore;
    use crate::task::Priority;

    fn session(app: &mut App<MemoryStore, SequentialIds>, script: &str) -> String {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date");
        let mut out = Vec::new();
        run_shell(app, &Renderer::plain(), Cursor::new(script.to_string()), &mut out, today)
            .expect("shell");
        String::from_utf8(out).expect("utf8")
    }

    fn new_app() -> App<MemoryStore, SequentialIds> {
        App::open(MemoryStore::new(), SequentialIds::new())
    }

    #[test]
    fn form_state_carries_across_lines() {
        let mut app = new_app();
        let out = session(
            &mut app,
            "priority high\ndue 2024-05-01\nadd \"call the bank\"\nform\nquit\nadd ignored\n",
        );

        assert!(out.contains("Created task 1."));
        let task = &app.tasks()[0];
        assert_eq!(task.text, "call the bank");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.due_date.map(|d| d.to_string()).as_deref(), Some("2024-05-01"));
        assert!(out.contains("priority  Medium"));
        assert_eq!(app.tasks().len(), 1);
    }

    #[test]
    fn edit_session_discards_draft_when_switching_tasks() {
        let mut app = new_app();
        session(
            &mut app,
            "add first\nadd second\nedit 1\ntext changed first\ndraft-priority high\nedit 2\ntext changed second\nsave\n",
        );

        assert_eq!(app.tasks()[0].text, "first");
        assert_eq!(app.tasks()[0].priority, Priority::Medium);
        assert_eq!(app.tasks()[1].text, "changed second");
        assert_eq!(app.editing_task_id(), None);
    }

    #[test]
    fn blank_save_keeps_editing() {
        let mut app = new_app();
        let out = session(&mut app, "add keep\nedit 1\ntext\nsave\nlist\n");
        assert_eq!(app.editing_task_id(), Some(1));
        assert_eq!(app.tasks()[0].text, "keep");
        assert!(out.contains("keep (editing)"));
    }

    #[test]
    fn delete_prompt_reads_next_line() {
        let mut app = new_app();
        let out = session(&mut app, "add a\nadd b\ndelete 1\nno\ndelete 2\ny\nstats\n");
        assert!(out.contains("Are you sure you want to delete this task? [y/N] "));
        assert!(out.contains("Task 1 kept."));
        assert!(out.contains("Deleted task 2."));
        assert_eq!(app.tasks().len(), 1);
        assert!(out.contains("Total 1  Done 0  Progress 0%"));
    }

    #[test]
    fn view_commands_change_the_listing() {
        let mut app = new_app();
        let out = session(
            &mut app,
            "add -p high Alpha\nadd -p low beta\nadd -d 2024-01-01 gamma\ntoggle 2\nfilter active\nsearch A\nsort due-date\nlist\n",
        );
        let listing = out
            .rsplit("ID Done Priority")
            .next()
            .expect("table printed");
        let gamma = listing.find("gamma").expect("gamma listed");
        let alpha = listing.find("Alpha").expect("alpha listed");
        assert!(gamma < alpha);
        assert!(!listing.contains("beta"));
    }

    #[test]
    fn bad_lines_report_and_continue() {
        let mut app = new_app();
        let out = session(&mut app, "frobnicate\nadd \"unterminated\npriority urgent\nadd ok\n");
        assert!(out.contains("error"));
        assert_eq!(app.tasks().len(), 1);
        assert_eq!(app.tasks()[0].text, "ok");
    }
}
