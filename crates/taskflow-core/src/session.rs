use std::mem;

use tracing::debug;

use crate::ids::IdSource;
use crate::storage::KeyValueStore;
use crate::store::TaskStore;
use crate::task::{DueDate, Priority, Task};

/// Uncommitted copy of a task's editable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub task_id: u64,
    pub text: String,
    pub priority: Priority,
    pub due_date: Option<DueDate>,
}

impl Draft {
    fn of(task: &Task) -> Self {
        Self {
            task_id: task.id,
            text: task.text.clone(),
            priority: task.priority,
            due_date: task.due_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Drafts were committed. `updated` is false when the task was deleted
    /// while the session was open.
    Saved { task_id: u64, updated: bool },
    /// Draft text was blank; the session stays open.
    Refused,
    NotEditing,
}

/// At most one task in edit at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditSession {
    #[default]
    Idle,
    Editing(Draft),
}

impl EditSession {
    /// Opens a session on `task`. An already open session is dropped without
    /// committing and its draft is returned.
    pub fn start(&mut self, task: &Task) -> Option<Draft> {
        let previous = mem::replace(self, EditSession::Editing(Draft::of(task)));
        match previous {
            EditSession::Editing(discarded) => {
                debug!(
                    discarded = discarded.task_id,
                    editing = task.id,
                    "edit started while another was open; unsaved draft discarded"
                );
                Some(discarded)
            }
            EditSession::Idle => {
                debug!(editing = task.id, "edit started");
                None
            }
        }
    }

    pub fn editing_task_id(&self) -> Option<u64> {
        self.draft().map(|draft| draft.task_id)
    }

    pub fn draft(&self) -> Option<&Draft> {
        match self {
            EditSession::Editing(draft) => Some(draft),
            EditSession::Idle => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, EditSession::Editing(_))
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        self.with_draft(|draft| draft.text = text.into())
    }

    pub fn set_priority(&mut self, priority: Priority) -> bool {
        self.with_draft(|draft| draft.priority = priority)
    }

    pub fn set_due_date(&mut self, due_date: Option<DueDate>) -> bool {
        self.with_draft(|draft| draft.due_date = due_date)
    }

    /// Discards the draft; the task itself is untouched.
    pub fn cancel(&mut self) -> Option<Draft> {
        match mem::take(self) {
            EditSession::Editing(draft) => {
                debug!(task_id = draft.task_id, "edit cancelled");
                Some(draft)
            }
            EditSession::Idle => None,
        }
    }

    /// Commits the draft through [`TaskStore::update`] and closes the
    /// session, unless the draft text is blank.
    pub fn save<S, I>(&mut self, store: &mut TaskStore<S, I>) -> anyhow::Result<SaveOutcome>
    where
        S: KeyValueStore,
        I: IdSource,
    {
        match self {
            EditSession::Idle => return Ok(SaveOutcome::NotEditing),
            EditSession::Editing(draft) if draft.text.trim().is_empty() => {
                debug!(task_id = draft.task_id, "refusing to save blank draft");
                return Ok(SaveOutcome::Refused);
            }
            EditSession::Editing(_) => {}
        }

        let EditSession::Editing(draft) = mem::take(self) else {
            return Ok(SaveOutcome::NotEditing);
        };
        let updated = store.update(draft.task_id, &draft.text, draft.priority, draft.due_date)?;
        debug!(task_id = draft.task_id, updated, "edit saved");
        Ok(SaveOutcome::Saved {
            task_id: draft.task_id,
            updated,
        })
    }

    fn with_draft(&mut self, apply: impl FnOnce(&mut Draft)) -> bool {
        match self {
            EditSession::Editing(draft) => {
                apply(draft);
                true
            }
            EditSession::Idle => false,
        }
    }
}
