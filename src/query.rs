//! List query building: filter, sort and page window.
//!
//! [`build`] turns raw request parameters into a [`QueryDescriptor`],
//! reporting every malformed parameter at once.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, FieldError, Result};
use crate::task::{cmp_optional_date, Task, TaskPriority, TaskStatus};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Raw list parameters, exactly as received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    Heading,
    Status,
    Priority,
    #[default]
    CreationDate,
    DueDate,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Heading => "heading",
            SortField::Status => "status",
            SortField::Priority => "priority",
            SortField::CreationDate => "creationDate",
            SortField::DueDate => "dueDate",
        }
    }

    fn compare(self, left: &Task, right: &Task) -> Ordering {
        match self {
            SortField::Heading => left.heading.cmp(&right.heading),
            SortField::Status => left.status.rank().cmp(&right.status.rank()),
            SortField::Priority => left.priority.rank().cmp(&right.priority.rank()),
            SortField::CreationDate => left.creation_date.cmp(&right.creation_date),
            SortField::DueDate => {
                cmp_optional_date(left.due_date.as_ref(), right.due_date.as_ref())
            }
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "heading" | "taskHeading" => Ok(SortField::Heading),
            "status" | "taskStatus" => Ok(SortField::Status),
            "priority" | "taskPriority" => Ok(SortField::Priority),
            "creationDate" => Ok(SortField::CreationDate),
            "dueDate" => Ok(SortField::DueDate),
            _ => Err(format!(
                "'{value}' is not a sortable field (expected heading|status|priority|creationDate|dueDate)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(format!("'{value}' is not a sort order (expected asc|desc)")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Total order over tasks; ties fall back to id ascending so pages are stable.
    pub fn compare(&self, left: &Task, right: &Task) -> Ordering {
        let primary = self.field.compare(left, right);
        let primary = match self.direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        primary.then_with(|| left.id.cmp(&right.id))
    }
}

/// Conjunction of optional equality clauses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.status.map_or(true, |status| task.status == status)
            && self.priority.map_or(true, |priority| task.priority == priority)
    }

    pub fn is_unconstrained(&self) -> bool {
        self.status.is_none() && self.priority.is_none()
    }
}

/// Half-open slice `[offset, offset + limit)` of the sorted, filtered set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: usize,
    pub limit: usize,
}

impl Window {
    #[cfg(test)]
    pub fn all() -> Self {
        Self {
            offset: 0,
            limit: usize::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDescriptor {
    pub filter: TaskFilter,
    pub sort: SortSpec,
    pub page: u32,
    pub page_size: u32,
}

impl Default for QueryDescriptor {
    fn default() -> Self {
        Self {
            filter: TaskFilter::default(),
            sort: SortSpec::default(),
            page: DEFAULT_PAGE,
            page_size: DEFAULT_LIMIT,
        }
    }
}

impl QueryDescriptor {
    pub fn window(&self) -> Window {
        let offset = (self.page.saturating_sub(1) as usize).saturating_mul(self.page_size as usize);
        Window {
            offset,
            limit: self.page_size as usize,
        }
    }
}

/// Derived pagination metadata for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub total_items: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub limit: u32,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(u64::from(page_size.max(1)));
        Self {
            current_page: page,
            total_pages,
            total_items,
            has_next_page: u64::from(page) < total_pages,
            has_prev_page: page > 1,
            limit: page_size,
        }
    }
}

/// Validate and normalize list parameters.
pub fn build(params: &ListParams) -> Result<QueryDescriptor> {
    let mut errors = Vec::new();
    let mut query = QueryDescriptor::default();

    if let Some(raw) = supplied(&params.page) {
        match raw.parse::<u64>().map(u32::try_from) {
            Ok(Ok(page)) if page >= 1 => query.page = page,
            Ok(Err(_)) => errors.push(FieldError::new(
                "page",
                format!("page cannot exceed {}", u32::MAX),
            )),
            _ => errors.push(FieldError::new("page", "page must be a positive integer")),
        }
    }
    if let Some(raw) = supplied(&params.limit) {
        match raw.parse::<u32>() {
            Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => query.page_size = limit,
            _ => errors.push(FieldError::new(
                "limit",
                format!("limit must be an integer between 1 and {MAX_LIMIT}"),
            )),
        }
    }
    if let Some(raw) = supplied(&params.sort_by) {
        match raw.parse() {
            Ok(field) => query.sort.field = field,
            Err(message) => errors.push(FieldError::new("sortBy", message)),
        }
    }
    if let Some(raw) = supplied(&params.sort_order) {
        match raw.parse() {
            Ok(direction) => query.sort.direction = direction,
            Err(message) => errors.push(FieldError::new("sortOrder", message)),
        }
    }
    if let Some(raw) = supplied(&params.status) {
        match raw.parse() {
            Ok(status) => query.filter.status = Some(status),
            Err(message) => errors.push(FieldError::new("status", message)),
        }
    }
    if let Some(raw) = supplied(&params.priority) {
        match raw.parse() {
            Ok(priority) => query.filter.priority = Some(priority),
            Err(message) => errors.push(FieldError::new("priority", message)),
        }
    }

    if !errors.is_empty() {
        return Err(Error::InvalidParameter(errors));
    }
    Ok(query)
}

fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|raw| !raw.is_empty())
}

/// Filter, sort and slice an in-memory task set.
pub fn select(
    tasks: impl IntoIterator<Item = Task>,
    filter: &TaskFilter,
    sort: &SortSpec,
    window: Window,
) -> Vec<Task> {
    let mut matching: Vec<Task> = tasks
        .into_iter()
        .filter(|task| filter.matches(task))
        .collect();
    matching.sort_by(|left, right| sort.compare(left, right));
    matching
        .into_iter()
        .skip(window.offset)
        .take(window.limit)
        .collect()
}
