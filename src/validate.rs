//! Validation rules for task payloads.
//!
//! Both validators are pure: they take the raw payload and the current
//! instant, and return either a normalized value or every violated rule.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Error, FieldError, Result};
use crate::task::{NewTask, TaskPatch, TaskPriority, TaskStatus, DETAILS_MAX_CHARS, HEADING_MAX_CHARS};

/// A payload field as it arrived, before any type check.
///
/// Non-string values are kept so they can be reported alongside every
/// other violation instead of failing the whole body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Other(Value),
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        FieldValue::Text(text)
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        FieldValue::Text(text.to_string())
    }
}

/// Raw task payload as supplied by a client.
///
/// `details` and `due_date` distinguish "absent" (`None`) from "explicitly
/// empty or null" (`Some(None)`), which clears the field on update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    #[serde(default, alias = "taskHeading")]
    pub heading: Option<FieldValue>,
    #[serde(default, alias = "taskDetails", deserialize_with = "present")]
    pub details: Option<Option<FieldValue>>,
    #[serde(default, alias = "taskStatus")]
    pub status: Option<FieldValue>,
    #[serde(default, alias = "taskPriority")]
    pub priority: Option<FieldValue>,
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<FieldValue>>,
}

fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn text<'a>(value: &'a FieldValue, field: &str, errors: &mut Vec<FieldError>) -> Option<&'a str> {
    match value {
        FieldValue::Text(text) => Some(text),
        FieldValue::Other(_) => {
            errors.push(FieldError::new(field, format!("{field} must be a string")));
            None
        }
    }
}

/// Validate a full payload for task creation.
pub fn validate_for_create(payload: &TaskPayload, now: DateTime<Utc>) -> Result<NewTask> {
    let mut errors = Vec::new();

    let heading = match &payload.heading {
        Some(value) => {
            text(value, "heading", &mut errors).and_then(|raw| check_heading(raw, &mut errors))
        }
        None => {
            errors.push(FieldError::new("heading", "heading is required"));
            None
        }
    };
    let details = match payload.details.as_ref().and_then(Option::as_ref) {
        Some(value) => text(value, "details", &mut errors)
            .and_then(|raw| check_details(raw, &mut errors))
            .flatten(),
        None => None,
    };
    let status = check_status(payload.status.as_ref(), &mut errors);
    let priority = check_priority(payload.priority.as_ref(), &mut errors);
    let due_date = match &payload.due_date {
        Some(value) => check_due_date(value.as_ref(), now, &mut errors).flatten(),
        None => None,
    };

    match heading {
        Some(heading) if errors.is_empty() => Ok(NewTask {
            heading,
            details,
            status: status.unwrap_or_default(),
            priority: priority.unwrap_or_default(),
            creation_date: now,
            due_date,
        }),
        _ => Err(Error::ValidationFailed(errors)),
    }
}

/// Validate a partial payload for task update. Absent fields stay absent.
pub fn validate_for_update(payload: &TaskPayload, now: DateTime<Utc>) -> Result<TaskPatch> {
    let mut errors = Vec::new();

    let heading = match &payload.heading {
        Some(value) => {
            text(value, "heading", &mut errors).and_then(|raw| check_heading(raw, &mut errors))
        }
        None => None,
    };
    let details = match &payload.details {
        Some(Some(value)) => {
            text(value, "details", &mut errors).and_then(|raw| check_details(raw, &mut errors))
        }
        Some(None) => Some(None),
        None => None,
    };
    let status = check_status(payload.status.as_ref(), &mut errors);
    let priority = check_priority(payload.priority.as_ref(), &mut errors);
    let due_date = match &payload.due_date {
        Some(value) => check_due_date(value.as_ref(), now, &mut errors),
        None => None,
    };

    if !errors.is_empty() {
        return Err(Error::ValidationFailed(errors));
    }

    Ok(TaskPatch {
        heading,
        details,
        status,
        priority,
        due_date,
    })
}

fn check_heading(raw: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let heading = raw.trim();
    if heading.is_empty() {
        errors.push(FieldError::new("heading", "heading is required"));
        return None;
    }
    if heading.chars().count() > HEADING_MAX_CHARS {
        errors.push(FieldError::new(
            "heading",
            format!("heading cannot exceed {HEADING_MAX_CHARS} characters"),
        ));
        return None;
    }
    Some(heading.to_string())
}

/// `Some(None)` means the details were supplied but blank.
fn check_details(raw: &str, errors: &mut Vec<FieldError>) -> Option<Option<String>> {
    let details = raw.trim();
    if details.chars().count() > DETAILS_MAX_CHARS {
        errors.push(FieldError::new(
            "details",
            format!("details cannot exceed {DETAILS_MAX_CHARS} characters"),
        ));
        return None;
    }
    if details.is_empty() {
        Some(None)
    } else {
        Some(Some(details.to_string()))
    }
}

/// Blank labels count as not supplied, the same as blank list filters.
fn label<'a>(
    value: Option<&'a FieldValue>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<&'a str> {
    let raw = text(value?, field, errors)?;
    (!raw.trim().is_empty()).then_some(raw)
}

fn check_status(value: Option<&FieldValue>, errors: &mut Vec<FieldError>) -> Option<TaskStatus> {
    let raw = label(value, "status", errors)?;
    match raw.parse() {
        Ok(status) => Some(status),
        Err(message) => {
            errors.push(FieldError::new("status", message));
            None
        }
    }
}

fn check_priority(value: Option<&FieldValue>, errors: &mut Vec<FieldError>) -> Option<TaskPriority> {
    let raw = label(value, "priority", errors)?;
    match raw.parse() {
        Ok(priority) => Some(priority),
        Err(message) => {
            errors.push(FieldError::new("priority", message));
            None
        }
    }
}

/// `Some(None)` means the due date was supplied empty and should be cleared.
fn check_due_date(
    value: Option<&FieldValue>,
    now: DateTime<Utc>,
    errors: &mut Vec<FieldError>,
) -> Option<Option<DateTime<Utc>>> {
    let raw = match value {
        Some(value) => Some(text(value, "dueDate", errors)?),
        None => None,
    };
    let raw = match raw.map(str::trim) {
        None | Some("") => return Some(None),
        Some(raw) => raw,
    };
    let due = match parse_due_date(raw) {
        Some(due) => due,
        None => {
            errors.push(FieldError::new(
                "dueDate",
                format!("'{raw}' is not a valid date"),
            ));
            return None;
        }
    };
    if due <= now {
        errors.push(FieldError::new("dueDate", "due date must be in the future"));
        return None;
    }
    Some(Some(due))
}

/// Parse an ISO-8601 date or timestamp; naive values are taken as UTC.
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}
