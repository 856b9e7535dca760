//! Dashboard statistics derived from the task collection.

use crate::fields::{Priority, Status};
use crate::task::Task;

/// Counts per status and per priority, indexed by `Status::index` and
/// `Priority::index`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    by_status: [usize; 3],
    by_priority: [usize; 3],
}

impl DashboardStats {
    pub fn compute(tasks: &[Task]) -> Self {
        let mut stats = DashboardStats { total: tasks.len(), ..Default::default() };
        for t in tasks {
            stats.by_status[t.status.index()] += 1;
            stats.by_priority[t.priority.index()] += 1;
        }
        stats
    }

    pub fn status(&self, status: Status) -> usize {
        self.by_status[status.index()]
    }

    pub fn priority(&self, priority: Priority) -> usize {
        self.by_priority[priority.index()]
    }

    /// Share of all tasks with `status`, 0.0 when there are no tasks.
    pub fn ratio(&self, status: Status) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.status(status) as f64 / self.total as f64
        }
    }
}

/// Recomputes statistics only when the store revision changes.
#[derive(Debug, Default)]
pub struct StatsCache {
    cached: Option<(u64, DashboardStats)>,
}

impl StatsCache {
    pub fn get(&mut self, revision: u64, tasks: &[Task]) -> DashboardStats {
        match self.cached {
            Some((rev, stats)) if rev == revision => stats,
            _ => {
                let stats = DashboardStats::compute(tasks);
                self.cached = Some((revision, stats));
                stats
            }
        }
    }
}
