//! Task lifecycle operations.
//!
//! [`TaskService`] composes validation, query building and a
//! [`TaskRepository`]. Both bindings (HTTP and CLI) go through it; neither
//! talks to a repository directly.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::query::{self, ListParams, Pagination};
use crate::repository::TaskRepository;
use crate::task::{Task, TaskId};
use crate::urgency::TaskView;
use crate::validate::{self, TaskPayload};

pub const DELETE_MESSAGE: &str = "Task deleted successfully";

/// Source of "now" for validation and timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock(RwLock<DateTime<Utc>>);

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(RwLock::new(at))
    }

    pub fn set(&self, at: DateTime<Utc>) {
        let mut guard = self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = at;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// One page of a list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPage {
    pub items: Vec<Task>,
    pub pagination: Pagination,
}

impl TaskPage {
    /// Annotate every item for display at `now`.
    pub fn into_views(self, now: DateTime<Utc>) -> TaskPageView {
        TaskPageView {
            tasks: self
                .items
                .into_iter()
                .map(|task| TaskView::at(task, now))
                .collect(),
            pagination: self.pagination,
        }
    }
}

/// Wire shape of a list response.
#[derive(Debug, Clone, Serialize)]
pub struct TaskPageView {
    pub tasks: Vec<TaskView>,
    pub pagination: Pagination,
}

/// Acknowledgement returned by a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteAck {
    pub id: TaskId,
    pub message: String,
}

#[derive(Clone)]
pub struct TaskService {
    repository: Arc<dyn TaskRepository>,
    clock: Arc<dyn Clock>,
}

impl TaskService {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self::with_clock(repository, Arc::new(SystemClock))
    }

    pub fn with_clock(repository: Arc<dyn TaskRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn create(&self, payload: &TaskPayload) -> Result<Task> {
        let draft = validate::validate_for_create(payload, self.now())?;
        self.repository.insert(draft).await
    }

    pub async fn get_one(&self, id: &str) -> Result<Task> {
        let id = TaskId::parse(id)?;
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Page and total count are read concurrently.
    pub async fn get_many(&self, params: &ListParams) -> Result<TaskPage> {
        let query = query::build(params)?;
        let (items, total) = tokio::join!(
            self.repository.find(&query.filter, &query.sort, query.window()),
            self.repository.count(&query.filter),
        );
        Ok(TaskPage {
            items: items?,
            pagination: Pagination::new(query.page, query.page_size, total?),
        })
    }

    pub async fn update(&self, id: &str, payload: &TaskPayload) -> Result<Task> {
        let id = TaskId::parse(id)?;
        let now = self.now();
        let patch = validate::validate_for_update(payload, now)?;
        self.repository
            .update(id, &patch, now)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn delete(&self, id: &str) -> Result<DeleteAck> {
        let id = TaskId::parse(id)?;
        if !self.repository.delete(id).await? {
            return Err(not_found(id));
        }
        Ok(DeleteAck {
            id,
            message: DELETE_MESSAGE.to_string(),
        })
    }
}

fn not_found(id: TaskId) -> Error {
    Error::NotFound(id.to_string())
}
