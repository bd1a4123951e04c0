use tracing::{debug, info, instrument};

use crate::form::NewTaskForm;
use crate::ids::{ClockIds, IdSource};
use crate::session::{Draft, EditSession, SaveOutcome};
use crate::stats::Stats;
use crate::storage::KeyValueStore;
use crate::store::TaskStore;
use crate::task::{DueDate, Priority, Task};
use crate::view::{SortBy, StatusFilter, ViewQuery, visible_tasks};

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this task?";

/// Yes/no question asked before destructive actions.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> anyhow::Result<bool>;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, message: &str) -> anyhow::Result<bool> {
        Ok(self(message))
    }
}

/// Task store, edit session, view preferences and the add form, mutated
/// only through the methods below.
#[derive(Debug)]
pub struct App<S, I = ClockIds> {
    store: TaskStore<S, I>,
    session: EditSession,
    query: ViewQuery,
    form: NewTaskForm,
}

impl<S: KeyValueStore, I: IdSource> App<S, I> {
    pub fn open(storage: S, ids: I) -> Self {
        Self::with_store(TaskStore::open(storage, ids))
    }

    pub fn with_store(store: TaskStore<S, I>) -> Self {
        Self {
            store,
            session: EditSession::default(),
            query: ViewQuery::default(),
            form: NewTaskForm::default(),
        }
    }

    pub fn store(&self) -> &TaskStore<S, I> {
        &self.store
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn form(&self) -> &NewTaskForm {
        &self.form
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn editing_task_id(&self) -> Option<u64> {
        self.session.editing_task_id()
    }

    pub fn visible_tasks(&self) -> Vec<Task> {
        visible_tasks(self.store.tasks(), &self.query)
    }

    pub fn stats(&self) -> Stats {
        Stats::from_tasks(self.store.tasks())
    }

    pub fn set_form_text(&mut self, text: impl Into<String>) {
        self.form.text = text.into();
    }

    pub fn set_form_priority(&mut self, priority: Priority) {
        self.form.priority = priority;
    }

    pub fn cycle_form_priority(&mut self) -> Priority {
        self.form.cycle_priority()
    }

    pub fn set_form_due_date(&mut self, due_date: Option<DueDate>) {
        self.form.due_date = due_date;
    }

    /// Adds a task from the form and resets it. Blank text leaves the form
    /// untouched so it can be corrected.
    #[instrument(skip(self))]
    pub fn submit_new_task(&mut self) -> anyhow::Result<Option<Task>> {
        let added = self
            .store
            .add(&self.form.text, self.form.priority, self.form.due_date)?;
        if let Some(task) = &added {
            info!(id = task.id, "task created");
            self.form.reset();
        }
        Ok(added)
    }

    pub fn toggle_complete(&mut self, id: u64) -> anyhow::Result<bool> {
        self.store.toggle_complete(id)
    }

    /// Returns `false` when no task has this id.
    pub fn start_edit(&mut self, id: u64) -> bool {
        let Some(task) = self.store.get(id) else {
            debug!(id, "edit requested for unknown id");
            return false;
        };
        self.session.start(task);
        true
    }

    pub fn set_draft_text(&mut self, text: impl Into<String>) -> bool {
        self.session.set_text(text)
    }

    pub fn set_draft_priority(&mut self, priority: Priority) -> bool {
        self.session.set_priority(priority)
    }

    pub fn set_draft_due_date(&mut self, due_date: Option<DueDate>) -> bool {
        self.session.set_due_date(due_date)
    }

    pub fn save_edit(&mut self) -> anyhow::Result<SaveOutcome> {
        self.session.save(&mut self.store)
    }

    pub fn cancel_edit(&mut self) -> Option<Draft> {
        self.session.cancel()
    }

    /// Deletes only after `confirm` agrees.
    #[instrument(skip(self, confirm))]
    pub fn delete_with_confirmation<C>(&mut self, id: u64, confirm: &mut C) -> anyhow::Result<bool>
    where
        C: Confirm + ?Sized,
    {
        if !confirm.confirm(DELETE_PROMPT)? {
            debug!("delete declined");
            return Ok(false);
        }
        let removed = self.store.delete(id)?;
        if removed {
            info!("task deleted");
        }
        Ok(removed)
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.query.filter = filter;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
    }

    pub fn set_sort(&mut self, sort_by: SortBy) {
        self.query.sort_by = sort_by;
    }
}
