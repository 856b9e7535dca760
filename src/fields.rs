//! Enumerations and field types for task management.
//!
//! Priority and status are closed sets. Their serialized form is the display
//! label ("High", "Not Started", ...) so stored collections stay readable.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Priority classification for task importance.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Every priority in display order.
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Position in [`Priority::ALL`], used to index fixed-size count tables.
    pub fn index(self) -> usize {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

/// Task completion status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    #[default]
    #[serde(rename = "Not Started", alias = "NotStarted")]
    NotStarted,
    #[serde(rename = "In Progress", alias = "InProgress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl Status {
    /// Every status in display order.
    pub const ALL: [Status; 3] = [Status::NotStarted, Status::InProgress, Status::Completed];

    /// Position in [`Status::ALL`].
    pub fn index(self) -> usize {
        match self {
            Status::NotStarted => 0,
            Status::InProgress => 1,
            Status::Completed => 2,
        }
    }

    /// Next status in the Not Started -> In Progress -> Completed cycle.
    pub fn next(self) -> Status {
        match self {
            Status::NotStarted => Status::InProgress,
            Status::InProgress => Status::Completed,
            Status::Completed => Status::NotStarted,
        }
    }
}

/// A filter selection over one closed-set dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T: PartialEq + Copy> Selection<T> {
    /// Whether `value` passes this selection.
    pub fn matches(&self, value: T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => *wanted == value,
        }
    }

    /// Step through All -> values[0] -> ... -> values[n-1] -> All.
    pub fn cycle(self, values: &[T]) -> Self {
        match self {
            Selection::All => values.first().map_or(Selection::All, |v| Selection::Only(*v)),
            Selection::Only(current) => {
                match values.iter().position(|v| *v == current) {
                    Some(i) if i + 1 < values.len() => Selection::Only(values[i + 1]),
                    _ => Selection::All,
                }
            }
        }
    }
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

impl<T> From<Option<T>> for Selection<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Selection::Only(v),
            None => Selection::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_as_display_label() {
        let json = serde_json::to_string(&Status::NotStarted).unwrap();
        assert_eq!(json, "\"Not Started\"");
        let back: Status = serde_json::from_str("\"In Progress\"").unwrap();
        assert_eq!(back, Status::InProgress);
        let alias: Status = serde_json::from_str("\"NotStarted\"").unwrap();
        assert_eq!(alias, Status::NotStarted);
    }

    #[test]
    fn priority_round_trips_through_label() {
        for p in Priority::ALL {
            let json = serde_json::to_string(&p).unwrap();
            assert_eq!(serde_json::from_str::<Priority>(&json).unwrap(), p);
        }
        assert!(serde_json::from_str::<Priority>("\"Urgent\"").is_err());
    }

    #[test]
    fn defaults_match_new_task_defaults() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(Status::default(), Status::NotStarted);
    }

    #[test]
    fn index_follows_all_order() {
        for (i, s) in Status::ALL.iter().enumerate() {
            assert_eq!(s.index(), i);
        }
        for (i, p) in Priority::ALL.iter().enumerate() {
            assert_eq!(p.index(), i);
        }
    }

    #[test]
    fn selection_cycles_back_to_all() {
        let mut sel = Selection::All;
        let mut seen = Vec::new();
        for _ in 0..4 {
            sel = sel.cycle(&Status::ALL);
            seen.push(sel);
        }
        assert_eq!(
            seen,
            vec![
                Selection::Only(Status::NotStarted),
                Selection::Only(Status::InProgress),
                Selection::Only(Status::Completed),
                Selection::All,
            ]
        );
    }

    #[test]
    fn selection_all_matches_everything() {
        assert!(Selection::<Priority>::All.matches(Priority::Low));
        assert!(Selection::Only(Priority::Low).matches(Priority::Low));
        assert!(!Selection::Only(Priority::Low).matches(Priority::High));
    }
}
