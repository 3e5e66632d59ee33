use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::TaskRepository;
use crate::error::Result;
use crate::query::{self, SortSpec, TaskFilter, Window};
use crate::task::{NewTask, Task, TaskId, TaskPatch};

/// Process-local task storage.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    tasks: RwLock<BTreeMap<TaskId, Task>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for MemoryRepository {
    async fn insert(&self, draft: NewTask) -> Result<Task> {
        let mut tasks = self.tasks.write().await;
        let mut id = TaskId::generate();
        while tasks.contains_key(&id) {
            id = TaskId::generate();
        }
        let task = Task::from_new(id, draft);
        tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn find(
        &self,
        filter: &TaskFilter,
        sort: &SortSpec,
        window: Window,
    ) -> Result<Vec<Task>> {
        let tasks = self.tasks.read().await;
        Ok(query::select(tasks.values().cloned(), filter, sort, window))
    }

    async fn count(&self, filter: &TaskFilter) -> Result<u64> {
        let tasks = self.tasks.read().await;
        if filter.is_unconstrained() {
            return Ok(tasks.len() as u64);
        }
        Ok(tasks.values().filter(|task| filter.matches(task)).count() as u64)
    }

    async fn update(
        &self,
        id: TaskId,
        patch: &TaskPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks.get_mut(&id).map(|task| {
            task.apply(patch, now);
            task.clone()
        }))
    }

    async fn delete(&self, id: TaskId) -> Result<bool> {
        Ok(self.tasks.write().await.remove(&id).is_some())
    }
}
