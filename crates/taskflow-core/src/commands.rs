use std::io::{self, BufRead, Write};

use chrono::{Local, NaiveDate};
use tracing::{debug, info, instrument};

use crate::app::{App, Confirm};
use crate::cli::{AddArgs, Command, EditArgs, ListArgs};
use crate::config::Config;
use crate::ids::IdSource;
use crate::prompt::{AssumeYes, LineConfirm};
use crate::render::Renderer;
use crate::session::SaveOutcome;
use crate::shell;
use crate::storage::KeyValueStore;

/// Runs `command` against the terminal.
#[instrument(skip_all)]
pub fn dispatch<S: KeyValueStore, I: IdSource>(
    app: &mut App<S, I>,
    cfg: &Config,
    renderer: &Renderer,
    command: Command,
) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();
    execute(app, cfg, renderer, command, stdin, stdout, today)
}

pub fn execute<S, I, R, W>(
    app: &mut App<S, I>,
    cfg: &Config,
    renderer: &Renderer,
    command: Command,
    input: R,
    mut out: W,
    today: NaiveDate,
) -> anyhow::Result<()>
where
    S: KeyValueStore,
    I: IdSource,
    R: BufRead,
    W: Write,
{
    debug!(?command, "dispatching command");

    match command {
        Command::Add(args) => cmd_add(app, args, &mut out),
        Command::List(args) => cmd_list(app, renderer, args, today, &mut out),
        Command::Toggle { id } => cmd_toggle(app, id, &mut out),
        Command::Edit(args) => cmd_edit(app, args, &mut out),
        Command::Delete { id, yes } => {
            if yes || !cfg.confirm_delete()? {
                cmd_delete(app, id, &mut AssumeYes, &mut out)
            } else {
                let mut confirm = LineConfirm::new(input, io::stderr());
                cmd_delete(app, id, &mut confirm, &mut out)
            }
        }
        Command::Stats => renderer.write_stats(&mut out, app.stats()),
        Command::Shell => shell::run_shell(app, renderer, input, out, today),
    }
}

#[instrument(skip_all)]
fn cmd_add<S: KeyValueStore, I: IdSource, W: Write>(
    app: &mut App<S, I>,
    args: AddArgs,
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command add");

    app.set_form_text(args.text.join(" "));
    if let Some(priority) = args.priority {
        app.set_form_priority(priority);
    }
    app.set_form_due_date(args.due);

    if let Some(task) = app.submit_new_task()? {
        writeln!(out, "Created task {}.", task.id)?;
    }
    Ok(())
}

#[instrument(skip_all)]
fn cmd_list<S: KeyValueStore, I: IdSource, W: Write>(
    app: &mut App<S, I>,
    renderer: &Renderer,
    args: ListArgs,
    today: NaiveDate,
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command list");

    if let Some(filter) = args.filter {
        app.set_filter(filter);
    }
    if let Some(search) = args.search {
        app.set_search(search);
    }
    if let Some(sort_by) = args.sort {
        app.set_sort(sort_by);
    }

    let rows = app.visible_tasks();
    renderer.write_view(out, &rows, app.stats(), today, app.editing_task_id())
}

#[instrument(skip(app, out))]
pub(crate) fn cmd_toggle<S: KeyValueStore, I: IdSource, W: Write>(
    app: &mut App<S, I>,
    id: u64,
    out: &mut W,
) -> anyhow::Result<()> {
    if !app.toggle_complete(id)? {
        writeln!(out, "No task with id {id}.")?;
        return Ok(());
    }

    let done = app
        .tasks()
        .iter()
        .find(|task| task.id == id)
        .map(|task| task.completed)
        .unwrap_or_default();
    let state = if done { "done" } else { "active" };
    writeln!(out, "Task {id} marked {state}.")?;
    Ok(())
}

#[instrument(skip(app, args, out), fields(id = args.id))]
fn cmd_edit<S: KeyValueStore, I: IdSource, W: Write>(
    app: &mut App<S, I>,
    args: EditArgs,
    out: &mut W,
) -> anyhow::Result<()> {
    if !app.start_edit(args.id) {
        writeln!(out, "No task with id {}.", args.id)?;
        return Ok(());
    }

    if let Some(text) = args.text {
        app.set_draft_text(text);
    }
    if let Some(priority) = args.priority {
        app.set_draft_priority(priority);
    }
    if args.clear_due {
        app.set_draft_due_date(None);
    } else if args.due.is_some() {
        app.set_draft_due_date(args.due);
    }

    match app.save_edit()? {
        SaveOutcome::Saved { task_id, .. } => writeln!(out, "Modified task {task_id}.")?,
        SaveOutcome::Refused | SaveOutcome::NotEditing => {
            app.cancel_edit();
            writeln!(out, "Task {} unchanged.", args.id)?;
        }
    }
    Ok(())
}

#[instrument(skip(app, confirm, out))]
pub(crate) fn cmd_delete<S, I, C, W>(
    app: &mut App<S, I>,
    id: u64,
    confirm: &mut C,
    out: &mut W,
) -> anyhow::Result<()>
where
    S: KeyValueStore,
    I: IdSource,
    C: Confirm + ?Sized,
    W: Write,
{
    if app.store().get(id).is_none() {
        writeln!(out, "No task with id {id}.")?;
        return Ok(());
    }

    if app.delete_with_confirmation(id, confirm)? {
        writeln!(out, "Deleted task {id}.")?;
    } else {
        writeln!(out, "Task {id} kept.")?;
    }
    Ok(())
}
