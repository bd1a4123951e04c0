use crate::task::Task;

/// Counts over the whole collection, ignoring any view filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub done: usize,
    pub progress_percent: u8,
}

impl Stats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let done = tasks.iter().filter(|task| task.completed).count();
        Self {
            total,
            done,
            progress_percent: percent(done, total),
        }
    }
}

// round(100 * done / total), halves rounded up
fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let rounded = (200 * done + total) / (2 * total);
    u8::try_from(rounded.min(100)).unwrap_or(100)
}
