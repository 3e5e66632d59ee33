//! Task domain types.
//!
//! A task is the only entity on the board. Status and priority are closed
//! enums carrying their wire labels; ids are ULIDs assigned by storage.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};

pub const HEADING_MAX_CHARS: usize = 100;
pub const DETAILS_MAX_CHARS: usize = 1000;

/// Opaque task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(Ulid);

impl TaskId {
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    /// Parse a caller-supplied id, rejecting anything that is not a ULID.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidId("task id cannot be empty".to_string()));
        }
        Ulid::from_string(trimmed)
            .map(Self)
            .map_err(|_| Error::InvalidId(trimmed.to_string()))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for TaskId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Done")]
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::ToDo, TaskStatus::InProgress, TaskStatus::Done];

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }

    /// Board column order.
    pub fn rank(self) -> u8 {
        match self {
            TaskStatus::ToDo => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Done => 2,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.label() == value)
            .ok_or_else(|| format!("'{value}' is not a valid status (expected To Do|In Progress|Done)"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskPriority {
    #[default]
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    pub fn label(self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            TaskPriority::Low => 0,
            TaskPriority::Medium => 1,
            TaskPriority::High => 2,
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        TaskPriority::ALL
            .into_iter()
            .find(|priority| priority.label() == value)
            .ok_or_else(|| format!("'{value}' is not a valid priority (expected Low|Medium|High)"))
    }
}

/// Stored task record, as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub heading: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub creation_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Materialize a validated draft under a storage-assigned id.
    pub fn from_new(id: TaskId, draft: NewTask) -> Self {
        Self {
            id,
            heading: draft.heading,
            details: draft.details,
            status: draft.status,
            priority: draft.priority,
            creation_date: draft.creation_date,
            due_date: draft.due_date,
            updated_at: draft.creation_date,
        }
    }

    /// Apply the supplied fields of a patch; `id` and `creation_date` never change.
    pub fn apply(&mut self, patch: &TaskPatch, now: DateTime<Utc>) {
        if let Some(heading) = &patch.heading {
            self.heading = heading.clone();
        }
        if let Some(details) = &patch.details {
            self.details = details.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        self.updated_at = now;
    }
}

/// A validated task awaiting an id from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub heading: String,
    pub details: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub creation_date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Validated partial update. The outer `Option` means "supplied"; for
/// `details` and `due_date` an inner `None` clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub heading: Option<String>,
    pub details: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

#[cfg(test)]
impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.heading.is_none()
            && self.details.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }
}

/// Compare optional timestamps with a missing value ordered first.
pub(crate) fn cmp_optional_date(
    left: Option<&DateTime<Utc>>,
    right: Option<&DateTime<Utc>>,
) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(left), Some(right)) => left.cmp(right),
    }
}
