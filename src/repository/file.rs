//! JSON file task storage.
//!
//! The whole board lives in one document:
//!
//! ```text
//! tasks.json        # {"schema_version": "taskboard.tasks.v1", "tasks": [...]}
//! tasks.json.lock   # exclusive lock held around every read and write cycle
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TaskRepository;
use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};
use crate::query::{self, SortSpec, TaskFilter, Window};
use crate::task::{NewTask, Task, TaskId, TaskPatch};

const SCHEMA_VERSION: &str = "taskboard.tasks.v1";

#[derive(Debug, Serialize, Deserialize)]
struct BoardDocument {
    schema_version: String,
    #[serde(default)]
    tasks: Vec<Task>,
}

/// Task storage backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct FileRepository {
    path: PathBuf,
    lock_timeout_ms: u64,
}

impl FileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `op` on the blocking pool while holding the store lock.
    async fn locked<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&Path) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        let timeout_ms = self.lock_timeout_ms;
        let outcome = tokio::task::spawn_blocking(move || {
            lock::with_store_lock(&path, timeout_ms, || op(&path))
        })
        .await
        .map_err(|err| Error::PersistenceUnavailable(format!("storage worker failed: {err}")))?;
        outcome.map_err(|err| unavailable(&self.path, err))
    }
}

fn unavailable(path: &Path, err: Error) -> Error {
    match err {
        Error::Io(err) => {
            tracing::debug!(path = %path.display(), error = %err, "task file io failed");
            Error::PersistenceUnavailable(format!("{}: {err}", path.display()))
        }
        Error::Json(err) => Error::PersistenceUnavailable(format!(
            "{} is not a valid task file: {err}",
            path.display()
        )),
        Error::LockFailed(lock_path) => Error::PersistenceUnavailable(format!(
            "timed out waiting for {}",
            lock_path.display()
        )),
        other => other,
    }
}

fn load(path: &Path) -> Result<Vec<Task>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let document: BoardDocument = serde_json::from_str(&content)?;
    if document.schema_version != SCHEMA_VERSION {
        tracing::warn!(
            path = %path.display(),
            found = %document.schema_version,
            expected = SCHEMA_VERSION,
            "task file schema version mismatch"
        );
    }
    Ok(document.tasks)
}

fn save(path: &Path, tasks: Vec<Task>) -> Result<()> {
    let document = BoardDocument {
        schema_version: SCHEMA_VERSION.to_string(),
        tasks,
    };
    let content = serde_json::to_string_pretty(&document)?;
    lock::write_atomic(path, content.as_bytes())?;
    tracing::debug!(path = %path.display(), tasks = document.tasks.len(), "task file written");
    Ok(())
}

#[async_trait]
impl TaskRepository for FileRepository {
    async fn insert(&self, draft: NewTask) -> Result<Task> {
        self.locked(move |path| {
            let mut tasks = load(path)?;
            let mut id = TaskId::generate();
            while tasks.iter().any(|task| task.id == id) {
                id = TaskId::generate();
            }
            let task = Task::from_new(id, draft);
            tasks.push(task.clone());
            save(path, tasks)?;
            Ok(task)
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>> {
        self.locked(move |path| Ok(load(path)?.into_iter().find(|task| task.id == id)))
            .await
    }

    async fn find(
        &self,
        filter: &TaskFilter,
        sort: &SortSpec,
        window: Window,
    ) -> Result<Vec<Task>> {
        let filter = *filter;
        let sort = *sort;
        self.locked(move |path| Ok(query::select(load(path)?, &filter, &sort, window)))
            .await
    }

    async fn count(&self, filter: &TaskFilter) -> Result<u64> {
        let filter = *filter;
        self.locked(move |path| {
            let tasks = load(path)?;
            if filter.is_unconstrained() {
                return Ok(tasks.len() as u64);
            }
            Ok(tasks.iter().filter(|task| filter.matches(task)).count() as u64)
        })
        .await
    }

    async fn update(
        &self,
        id: TaskId,
        patch: &TaskPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>> {
        let patch = patch.clone();
        self.locked(move |path| {
            let mut tasks = load(path)?;
            let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
                return Ok(None);
            };
            task.apply(&patch, now);
            let updated = task.clone();
            save(path, tasks)?;
            Ok(Some(updated))
        })
        .await
    }

    async fn delete(&self, id: TaskId) -> Result<bool> {
        self.locked(move |path| {
            let mut tasks = load(path)?;
            let before = tasks.len();
            tasks.retain(|task| task.id != id);
            if tasks.len() == before {
                return Ok(false);
            }
            save(path, tasks)?;
            Ok(true)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::FileLock;
    use crate::task::{TaskPriority, TaskStatus};
    use tempfile::TempDir;

    fn draft(heading: &str) -> NewTask {
        NewTask {
            heading: heading.to_string(),
            details: Some("notes".to_string()),
            status: TaskStatus::ToDo,
            priority: TaskPriority::High,
            creation_date: Utc::now(),
            due_date: None,
        }
    }

    #[tokio::test]
    async fn missing_file_is_empty_board() {
        let dir = TempDir::new().expect("tempdir");
        let repo = FileRepository::new(dir.path().join("tasks.json"));
        assert_eq!(repo.count(&TaskFilter::default()).await.expect("count"), 0);
        assert!(!repo.path().exists());
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("board").join("tasks.json");
        let created = FileRepository::new(&path)
            .insert(draft("persisted"))
            .await
            .expect("insert");

        let reopened = FileRepository::new(&path);
        let found = reopened.find_by_id(created.id).await.expect("find");
        assert_eq!(found, Some(created));

        let raw = fs::read_to_string(&path).expect("read file");
        assert!(raw.contains(SCHEMA_VERSION));
        assert!(raw.contains("\"heading\": \"persisted\""));
    }

    #[tokio::test]
    async fn update_then_delete() {
        let dir = TempDir::new().expect("tempdir");
        let repo = FileRepository::new(dir.path().join("tasks.json"));
        let task = repo.insert(draft("first")).await.expect("insert");

        let patch = TaskPatch {
            status: Some(TaskStatus::Done),
            details: Some(None),
            ..TaskPatch::default()
        };
        let now = Utc::now();
        let updated = repo
            .update(task.id, &patch, now)
            .await
            .expect("update")
            .expect("present");
        assert_eq!(updated.status, TaskStatus::Done);
        assert_eq!(updated.details, None);
        assert_eq!(updated.updated_at, now);

        assert!(repo.delete(task.id).await.expect("delete"));
        assert!(!repo.delete(task.id).await.expect("second delete"));
        assert_eq!(repo.find_by_id(task.id).await.expect("find"), None);
    }

    #[tokio::test]
    async fn corrupt_file_reports_unavailable() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("tasks.json");
        fs::write(&path, "{not json").expect("write");
        let err = FileRepository::new(&path)
            .count(&TaskFilter::default())
            .await
            .expect_err("corrupt");
        assert!(matches!(err, Error::PersistenceUnavailable(_)));
    }

    #[tokio::test]
    async fn held_lock_reports_unavailable() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("tasks.json");
        let _held = FileLock::acquire(lock::lock_path_for(&path), 1000).expect("lock");
        let err = FileRepository::new(&path)
            .with_lock_timeout(100)
            .count(&TaskFilter::default())
            .await
            .expect_err("locked");
        assert_eq!(err.kind(), "persistence_unavailable");
    }
}
