//! Task list filtering by status and priority.

use crate::fields::{Priority, Selection, Status};
use crate::task::Task;

/// Status and priority selections applied to the task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Selection<Status>,
    pub priority: Selection<Priority>,
}

impl TaskFilter {
    pub fn new(status: Selection<Status>, priority: Selection<Priority>) -> Self {
        TaskFilter { status, priority }
    }

    /// Whether `task` passes both selections.
    pub fn matches(&self, task: &Task) -> bool {
        self.status.matches(task.status) && self.priority.matches(task.priority)
    }

    /// Tasks passing the filter, in their original order.
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|t| self.matches(t)).collect()
    }

    pub fn is_unfiltered(&self) -> bool {
        self.status == Selection::All && self.priority == Selection::All
    }

    pub fn cycle_status(&mut self) {
        self.status = self.status.cycle(&Status::ALL);
    }

    pub fn cycle_priority(&mut self) {
        self.priority = self.priority.cycle(&Priority::ALL);
    }
}
