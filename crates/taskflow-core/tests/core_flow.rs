use std::fs;

use taskflow_core::app::App;
use taskflow_core::ids::{ClockIds, SequentialIds};
use taskflow_core::persistence::{TASKS_KEY, load_tasks};
use taskflow_core::storage::{FileStore, KeyValueStore};
use taskflow_core::store::TaskStore;
use taskflow_core::task::Priority;
use taskflow_core::view::{SortBy, StatusFilter, ViewQuery, visible_tasks};
use tempfile::tempdir;

#[test]
fn file_store_survives_restart() {
    let temp = tempdir().expect("tempdir");

    let written = {
        let storage = FileStore::open(temp.path()).expect("open storage");
        let mut store = TaskStore::open(storage, ClockIds::new());
        let report = store
            .add("Write quarterly report", Priority::High, "2024-04-15".parse().ok())
            .expect("add")
            .expect("task");
        store.add("Buy stamps", Priority::Low, None).expect("add");
        store.toggle_complete(report.id).expect("toggle");
        store.tasks().to_vec()
    };

    let storage = FileStore::open(temp.path()).expect("reopen storage");
    let mut reopened = TaskStore::open(storage, ClockIds::new());
    assert_eq!(reopened.tasks(), written.as_slice());

    let fresh = reopened
        .add("Post letters", Priority::Medium, None)
        .expect("add")
        .expect("task");
    assert!(written.iter().all(|task| task.id < fresh.id));
}

#[test]
fn persisted_json_matches_wire_format() {
    let temp = tempdir().expect("tempdir");
    let storage = FileStore::open(temp.path()).expect("open storage");
    let mut store = TaskStore::open(storage, SequentialIds::new());
    store
        .add("dated", Priority::High, "2024-01-01".parse().ok())
        .expect("add");
    store.add("undated", Priority::Low, None).expect("add");

    let raw = fs::read_to_string(temp.path().join("tasks.json")).expect("read slot");
    assert_eq!(
        raw,
        concat!(
            r#"[{"id":1,"text":"dated","completed":false,"priority":"High","dueDate":"2024-01-01"},"#,
            r#"{"id":2,"text":"undated","completed":false,"priority":"Low"}]"#
        )
    );
}

#[test]
fn corrupt_slot_starts_empty_and_is_overwritten() {
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join("tasks.json"), r#"{"not":"an array"}"#).expect("seed slot");

    let storage = FileStore::open(temp.path()).expect("open storage");
    let mut store = TaskStore::open(storage, SequentialIds::new());
    assert!(store.tasks().is_empty());

    store.add("recovered", Priority::Medium, None).expect("add");
    let reloaded = load_tasks(store.storage());
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded[0].text, "recovered");
}

#[test]
fn original_order_is_kept_in_storage_while_views_sort() {
    let temp = tempdir().expect("tempdir");
    let storage = FileStore::open(temp.path()).expect("open storage");
    let mut app = App::open(storage, SequentialIds::new());

    for (text, priority, due) in [
        ("high", Priority::High, None),
        ("low one", Priority::Low, Some("2024-03-01")),
        ("medium", Priority::Medium, Some("2024-01-15")),
        ("low two", Priority::Low, None),
    ] {
        app.set_form_text(text);
        app.set_form_priority(priority);
        app.set_form_due_date(due.and_then(|raw| raw.parse().ok()));
        app.submit_new_task().expect("submit").expect("task");
    }

    let texts = |rows: Vec<taskflow_core::task::Task>| -> Vec<String> {
        rows.into_iter().map(|task| task.text).collect()
    };

    app.set_sort(SortBy::Priority);
    assert_eq!(texts(app.visible_tasks()), ["low one", "low two", "medium", "high"]);

    app.set_sort(SortBy::DueDate);
    assert_eq!(texts(app.visible_tasks()), ["medium", "low one", "high", "low two"]);

    let stored = load_tasks(app.store().storage());
    assert_eq!(texts(stored), ["high", "low one", "medium", "low two"]);
}

#[test]
fn switching_edits_loses_unsaved_draft() {
    let temp = tempdir().expect("tempdir");
    let storage = FileStore::open(temp.path()).expect("open storage");
    let mut app = App::open(storage, SequentialIds::new());
    for text in ["task a", "task b"] {
        app.set_form_text(text);
        app.submit_new_task().expect("submit");
    }
    let (a, b) = (app.tasks()[0].clone(), app.tasks()[1].clone());

    assert!(app.start_edit(a.id));
    app.set_draft_text("a with unsaved edits");
    app.set_draft_due_date("2030-01-01".parse().ok());
    assert!(app.start_edit(b.id));
    app.save_edit().expect("save");
    assert!(app.cancel_edit().is_none());

    let stored_a = load_tasks(app.store().storage())
        .into_iter()
        .find(|task| task.id == a.id)
        .expect("a is stored");
    assert_eq!(stored_a, a);
}

#[test]
fn filters_partition_a_stored_collection() {
    let temp = tempdir().expect("tempdir");
    let mut storage = FileStore::open(temp.path()).expect("open storage");
    storage
        .set(
            TASKS_KEY,
            r#"[
                {"id":1,"text":"a","completed":true,"priority":"Low"},
                {"id":2,"text":"b","completed":false,"priority":"High","dueDate":"2024-01-01"},
                {"id":3,"text":"c","completed":true,"priority":"Medium","dueDate":null}
            ]"#,
        )
        .expect("seed");
    let tasks = load_tasks(&storage);
    assert_eq!(tasks.len(), 3);

    let view = |filter: StatusFilter| {
        let query = ViewQuery {
            filter,
            ..ViewQuery::default()
        };
        visible_tasks(&tasks, &query)
            .into_iter()
            .map(|task| task.id)
            .collect::<Vec<_>>()
    };
    let mut union = view(StatusFilter::Active);
    let completed = view(StatusFilter::Completed);
    assert!(union.iter().all(|id| !completed.contains(id)));
    union.extend(completed);
    union.sort_unstable();
    assert_eq!(union, vec![1, 2, 3]);
    assert_eq!(view(StatusFilter::All).len(), 3);
}
