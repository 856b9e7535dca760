//! Task data structure and related functionality.
//!
//! This module defines the `Task` record that the store persists, its opaque
//! `TaskId`, and the fixed seed collection used on first start.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::*;
use crate::image::ImagePayload;

/// Opaque unique identifier of a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        TaskId(id.into())
    }

    /// A fresh random (v4 UUID) identifier.
    pub fn generate() -> Self {
        TaskId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

/// A single to-do record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, with = "due_date_text")]
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImagePayload>,
}

impl Task {
    /// A task with default priority and status and no optional fields.
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        Task {
            id,
            title: title.into(),
            description: String::new(),
            due_date: None,
            priority: Priority::default(),
            status: Status::default(),
            image: None,
        }
    }
}

/// Due dates are stored as `YYYY-MM-DD` text, with the empty string meaning unset.
///
/// Text that is not a date reads as unset so one bad record cannot make the
/// whole collection unreadable.
mod due_date_text {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::warn;

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Ok(Some(date)),
            Err(e) => {
                warn!(due_date = raw, error = %e, "ignoring stored due date that is not a date");
                Ok(None)
            }
        }
    }
}

/// Example tasks used when storage holds no collection yet.
pub fn seed_tasks() -> Vec<Task> {
    fn seed(id: &str, title: &str, description: &str, due: Option<(i32, u32, u32)>, priority: Priority, status: Status) -> Task {
        Task {
            id: TaskId::new(id),
            title: title.to_string(),
            description: description.to_string(),
            due_date: due.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            priority,
            status,
            image: None,
        }
    }

    vec![
        seed(
            "1",
            "Design Landing Page",
            "Create mockups and style guide for the new landing page.",
            Some((2024, 8, 15)),
            Priority::High,
            Status::InProgress,
        ),
        seed(
            "2",
            "Develop API Endpoints",
            "Set up Node.js server and create REST API for user authentication.",
            Some((2024, 8, 20)),
            Priority::High,
            Status::NotStarted,
        ),
        seed(
            "3",
            "Write Documentation",
            "Document the API endpoints and component library.",
            Some((2024, 9, 1)),
            Priority::Medium,
            Status::NotStarted,
        ),
        seed(
            "4",
            "Test Application",
            "Write unit and integration tests for all new features.",
            None,
            Priority::Low,
            Status::Completed,
        ),
    ]
}
