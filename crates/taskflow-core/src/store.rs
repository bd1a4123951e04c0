use tracing::{debug, info};

use crate::ids::{ClockIds, IdSource};
use crate::persistence;
use crate::storage::KeyValueStore;
use crate::task::{DueDate, Priority, Task};

/// Ordered task collection, written back to storage after every mutation.
///
/// Mutations never fail because an id is missing; they report whether
/// anything matched. The only errors come from the storage medium.
#[derive(Debug)]
pub struct TaskStore<S, I = ClockIds> {
    tasks: Vec<Task>,
    storage: S,
    ids: I,
}

impl<S: KeyValueStore, I: IdSource> TaskStore<S, I> {
    #[tracing::instrument(skip_all)]
    pub fn open(storage: S, mut ids: I) -> Self {
        let tasks = persistence::load_tasks(&storage);
        if let Some(max_id) = tasks.iter().map(|task| task.id).max() {
            ids.reserve_above(max_id);
        }
        info!(count = tasks.len(), "opened task store");
        Self { tasks, storage, ids }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Returns `None` without touching the collection when `text` is blank.
    #[tracing::instrument(skip(self, text))]
    pub fn add(
        &mut self,
        text: &str,
        priority: Priority,
        due_date: Option<DueDate>,
    ) -> anyhow::Result<Option<Task>> {
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring blank task text");
            return Ok(None);
        }

        let id = self.ids.next_id()?;
        let task = Task::new(id, text.to_string(), priority, due_date);
        self.tasks.push(task.clone());
        debug!(id = task.id, count = self.tasks.len(), "task added");
        self.persist()?;
        Ok(Some(task))
    }

    #[tracing::instrument(skip(self))]
    pub fn toggle_complete(&mut self, id: u64) -> anyhow::Result<bool> {
        let found = match self.tasks.iter_mut().find(|task| task.id == id) {
            Some(task) => {
                task.completed = !task.completed;
                debug!(completed = task.completed, "task toggled");
                true
            }
            None => {
                debug!("toggle on unknown id");
                false
            }
        };
        self.persist()?;
        Ok(found)
    }

    /// Replaces text, priority and due date; `id` and `completed` stay.
    #[tracing::instrument(skip(self, text))]
    pub fn update(
        &mut self,
        id: u64,
        text: &str,
        priority: Priority,
        due_date: Option<DueDate>,
    ) -> anyhow::Result<bool> {
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring update with blank text");
            return Ok(false);
        }

        let found = match self.tasks.iter_mut().find(|task| task.id == id) {
            Some(task) => {
                task.text = text.to_string();
                task.priority = priority;
                task.due_date = due_date;
                true
            }
            None => {
                debug!("update on unknown id");
                false
            }
        };
        self.persist()?;
        Ok(found)
    }

    /// Unconditional removal; confirmation is the caller's job.
    #[tracing::instrument(skip(self))]
    pub fn delete(&mut self, id: u64) -> anyhow::Result<bool> {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        let removed = self.tasks.len() != before;
        debug!(removed, count = self.tasks.len(), "delete applied");
        self.persist()?;
        Ok(removed)
    }

    fn persist(&mut self) -> anyhow::Result<()> {
        persistence::save_tasks(&mut self.storage, &self.tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::persistence::{TASKS_KEY, load_tasks};
    use crate::storage::MemoryStore;

    fn empty_store() -> TaskStore<MemoryStore, SequentialIds> {
        TaskStore::open(MemoryStore::new(), SequentialIds::new())
    }

    #[test]
    fn add_appends_trimmed_incomplete_task() {
        let mut store = empty_store();
        let task = store
            .add("  water plants  ", Priority::High, None)
            .expect("add")
            .expect("non-blank text is accepted");

        assert_eq!(task.text, "water plants");
        assert!(!task.completed);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(store.tasks(), &[task]);
        assert_eq!(load_tasks(store.storage()), store.tasks());
    }

    #[test]
    fn blank_add_is_a_no_op_without_a_write() {
        let mut store = empty_store();
        assert!(store.add("", Priority::Medium, None).expect("add").is_none());
        assert!(store.add("   ", Priority::Medium, None).expect("add").is_none());
        assert!(store.tasks().is_empty());
        assert_eq!(store.storage().writes(), 0);
    }

    #[test]
    fn ids_are_unique_and_survive_deletes() {
        let mut store = empty_store();
        let a = store.add("a", Priority::Low, None).expect("add").expect("task");
        let b = store.add("b", Priority::Low, None).expect("add").expect("task");
        store.delete(b.id).expect("delete");
        let c = store.add("c", Priority::Low, None).expect("add").expect("task");
        assert_ne!(a.id, b.id);
        assert_ne!(c.id, b.id);
        assert_ne!(c.id, a.id);
    }

    #[test]
    fn reopened_store_does_not_reuse_loaded_ids() {
        let raw = r#"[{"id":10,"text":"loaded","completed":false,"priority":"Low"}]"#;
        let storage = MemoryStore::new().with_entry(TASKS_KEY, raw);
        let mut store = TaskStore::open(storage, SequentialIds::new());
        let fresh = store.add("new", Priority::Low, None).expect("add").expect("task");
        assert_eq!(fresh.id, 11);
    }

    #[test]
    fn add_after_largest_stored_id_fails_without_writing() {
        let raw = format!(
            r#"[{{"id":{},"text":"last","completed":false,"priority":"Low"}}]"#,
            u64::MAX
        );
        let storage = MemoryStore::new().with_entry(TASKS_KEY, &raw);
        let mut store = TaskStore::open(storage, ClockIds::new());
        assert_eq!(store.tasks().len(), 1);

        let err = store.add("next", Priority::Low, None).expect_err("no id left");
        assert!(err.to_string().contains("exhausted"));
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.storage().writes(), 0);

        let last = store.tasks()[0].id;
        assert!(store.toggle_complete(last).expect("toggle"));
    }

    #[test]
    fn toggle_twice_restores_and_unknown_id_changes_nothing() {
        let mut store = empty_store();
        let task = store.add("read", Priority::Medium, None).expect("add").expect("task");

        assert!(store.toggle_complete(task.id).expect("toggle"));
        assert!(store.get(task.id).expect("present").completed);
        assert!(store.toggle_complete(task.id).expect("toggle"));
        assert!(!store.get(task.id).expect("present").completed);

        let snapshot = store.tasks().to_vec();
        assert!(!store.toggle_complete(task.id + 100).expect("toggle"));
        assert_eq!(store.tasks(), snapshot.as_slice());
    }

    #[test]
    fn update_keeps_id_and_completion() {
        let mut store = empty_store();
        let task = store.add("draft", Priority::Low, None).expect("add").expect("task");
        store.toggle_complete(task.id).expect("toggle");

        let due = "2024-06-01".parse().ok();
        assert!(store.update(task.id, " final ", Priority::High, due).expect("update"));
        let updated = store.get(task.id).expect("present");
        assert_eq!(updated.text, "final");
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.due_date, due);
        assert!(updated.completed);

        assert!(!store.update(task.id, "  ", Priority::Low, None).expect("update"));
        assert_eq!(store.get(task.id).expect("present").text, "final");
    }

    #[test]
    fn delete_removes_exactly_one() {
        let mut store = empty_store();
        let a = store.add("a", Priority::Low, None).expect("add").expect("task");
        store.add("b", Priority::Low, None).expect("add");

        assert!(!store.delete(a.id + 100).expect("delete"));
        assert_eq!(store.tasks().len(), 2);
        assert!(store.delete(a.id).expect("delete"));
        assert_eq!(store.tasks().len(), 1);
        assert!(store.get(a.id).is_none());
    }

    #[test]
    fn every_accepted_mutation_writes_a_snapshot() {
        let mut store = empty_store();
        let task = store.add("a", Priority::Low, None).expect("add").expect("task");
        store.toggle_complete(task.id).expect("toggle");
        store.update(task.id, "b", Priority::Low, None).expect("update");
        store.delete(task.id).expect("delete");
        assert_eq!(store.storage().writes(), 4);
        assert!(load_tasks(store.storage()).is_empty());
    }
}
