use crate::task::{DueDate, Priority};

/// Input fields for the next task to add.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTaskForm {
    pub text: String,
    pub priority: Priority,
    pub due_date: Option<DueDate>,
}

impl NewTaskForm {
    pub fn cycle_priority(&mut self) -> Priority {
        self.priority = self.priority.cycle();
        self.priority
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
