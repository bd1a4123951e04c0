use std::collections::HashSet;

use anyhow::{Context, anyhow};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::storage::KeyValueStore;
use crate::task::Task;

/// Storage slot holding the whole collection.
pub const TASKS_KEY: &str = "tasks";

pub fn encode_tasks(tasks: &[Task]) -> anyhow::Result<String> {
    serde_json::to_string(tasks).context("failed to serialize tasks")
}

/// Strict decoding: the payload must be a JSON array of task objects.
pub fn decode_tasks(raw: &str) -> anyhow::Result<Vec<Task>> {
    let value: Value = serde_json::from_str(raw).context("stored tasks are not valid JSON")?;
    if !value.is_array() {
        return Err(anyhow!(
            "stored tasks payload is not an array (found {})",
            json_kind(&value)
        ));
    }

    serde_json::from_value(value).context("stored tasks do not match the task schema")
}

/// Reads the collection from `storage`. Every failure degrades to an empty
/// collection and is logged, never returned.
#[tracing::instrument(skip(storage))]
pub fn load_tasks<S: KeyValueStore + ?Sized>(storage: &S) -> Vec<Task> {
    let raw = match storage.get(TASKS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            info!("no stored tasks; starting empty");
            return Vec::new();
        }
        Err(err) => {
            error!(error = %format!("{err:#}"), "failed to read stored tasks; starting empty");
            return Vec::new();
        }
    };

    match decode_tasks(&raw) {
        Ok(tasks) => {
            let tasks = drop_invalid_tasks(tasks);
            debug!(count = tasks.len(), "loaded tasks");
            tasks
        }
        Err(err) => {
            error!(error = %format!("{err:#}"), "failed to load stored tasks; starting empty");
            Vec::new()
        }
    }
}

#[tracing::instrument(skip(storage, tasks), fields(count = tasks.len()))]
pub fn save_tasks<S: KeyValueStore + ?Sized>(storage: &mut S, tasks: &[Task]) -> anyhow::Result<()> {
    let payload = encode_tasks(tasks)?;
    storage
        .set(TASKS_KEY, &payload)
        .context("failed to write tasks to storage")
}

/// Drops blank-text tasks and repeated ids (first occurrence wins), and
/// trims the text of what is kept.
fn drop_invalid_tasks(tasks: Vec<Task>) -> Vec<Task> {
    let mut seen = HashSet::with_capacity(tasks.len());
    tasks
        .into_iter()
        .filter_map(|mut task| {
            let text = task.text.trim();
            if text.is_empty() {
                warn!(id = task.id, "dropping stored task with blank text");
                return None;
            }
            if text.len() != task.text.len() {
                task.text = text.to_string();
            }
            if !seen.insert(task.id) {
                warn!(id = task.id, "dropping stored task with duplicate id");
                return None;
            }
            Some(task)
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
