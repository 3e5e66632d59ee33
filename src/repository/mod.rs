//! Task persistence.
//!
//! [`TaskRepository`] is the storage seam the lifecycle operations run
//! against. Two backends ship:
//!
//! - [`MemoryRepository`]: process-local map, used for tests and `serve --memory`
//! - [`FileRepository`]: one JSON document guarded by a lock file
//!
//! Repositories assign ids and own `updated_at`; concurrent writers to the
//! same task resolve last-write-wins.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::{StorageBackend, StorageConfig};
use crate::error::Result;
use crate::query::{SortSpec, TaskFilter, Window};
use crate::task::{NewTask, Task, TaskId, TaskPatch};

mod file;
mod memory;

pub use file::FileRepository;
pub use memory::MemoryRepository;

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Store a new task under a freshly assigned, never reused id.
    async fn insert(&self, draft: NewTask) -> Result<Task>;

    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>>;

    /// Matching tasks in sort order, restricted to `window`.
    async fn find(
        &self,
        filter: &TaskFilter,
        sort: &SortSpec,
        window: Window,
    ) -> Result<Vec<Task>>;

    async fn count(&self, filter: &TaskFilter) -> Result<u64>;

    /// Apply `patch` to a stored task. `Ok(None)` when the id is unknown.
    async fn update(
        &self,
        id: TaskId,
        patch: &TaskPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>>;

    /// Remove a task permanently. `Ok(false)` when the id is unknown.
    async fn delete(&self, id: TaskId) -> Result<bool>;
}

/// Open the backend selected by configuration.
pub fn open(config: &StorageConfig) -> Result<Arc<dyn TaskRepository>> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::debug!("using in-memory task storage");
            Ok(Arc::new(MemoryRepository::new()))
        }
        StorageBackend::File => {
            let repository = FileRepository::new(config.resolve_path()?);
            tracing::debug!(path = %repository.path().display(), "using file task storage");
            Ok(Arc::new(repository))
        }
    }
}
