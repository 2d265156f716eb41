// store/mod.rs — authoritative task collection with a JSON file mirror.
//
// The store holds the full task list in memory and rewrites
// `{data_dir}/tasks.json` in full before any mutating call returns.
// Expected data volume is tiny; the full overwrite is a simplicity
// choice and must not be mistaken for a write-ahead log.

pub mod views;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// A single to-do item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Assigned by the store at creation. Unique for the store lifetime,
    /// never reused even after deletion.
    pub id: String,
    pub text: String,
    pub completed: bool,
    /// Set once at creation, immutable.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Partial update for [`TaskStore::update`] — absent fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub completed: Option<bool>,
}

/// Errors returned by the task store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("task file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("task file serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

struct Inner {
    tasks: Vec<Task>,
    next_id: u64,
}

/// Owns the task collection and keeps `tasks.json` in sync.
///
/// Instantiated once per process and shared via `Arc`. The write lock is
/// held across the read-modify-write-persist sequence, so mutations are
/// serialized in-process. Two independent processes writing to the same
/// mirror are not protected against.
pub struct TaskStore {
    path: PathBuf,
    inner: RwLock<Inner>,
}

impl TaskStore {
    /// Load the mirror from `{data_dir}/tasks.json`.
    ///
    /// An absent or unreadable file starts an empty collection; the mirror
    /// is written out immediately so it always exists after startup. The id
    /// counter is seeded from the maximum numeric id present (1 if empty),
    /// which keeps ids unique across restarts as long as the mirror is intact.
    pub async fn open(data_dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(data_dir).await?;
        let path = data_dir.join("tasks.json");

        let tasks = match fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<Vec<Task>>(&raw) {
                Ok(tasks) => tasks,
                Err(e) => {
                    warn!(path = %path.display(), err = %e, "tasks.json is not valid — starting with an empty list");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), err = %e, "cannot read tasks.json — starting with an empty list");
                Vec::new()
            }
        };

        let next_id = tasks
            .iter()
            .filter_map(|t| t.id.parse::<u64>().ok())
            .max()
            .map_or(1, |max| max + 1);

        let store = Self {
            path,
            inner: RwLock::new(Inner { tasks, next_id }),
        };

        {
            let inner = store.inner.read().await;
            store.flush(&inner.tasks).await?;
            info!(count = inner.tasks.len(), next_id, "task store loaded");
        }

        Ok(store)
    }

    /// Snapshot of the full collection, in insertion order.
    pub async fn list(&self) -> Vec<Task> {
        self.inner.read().await.tasks.clone()
    }

    /// Allocate the next id, append the task, and persist.
    pub async fn create(&self, text: String, completed: bool) -> Result<Task, StoreError> {
        let mut inner = self.inner.write().await;
        let task = Task {
            id: inner.next_id.to_string(),
            text,
            completed,
            created_at: Utc::now(),
        };
        inner.next_id += 1;
        inner.tasks.push(task.clone());
        self.flush(&inner.tasks).await?;
        Ok(task)
    }

    /// Merge `patch` into the task with the given id and persist.
    /// `id` and `created_at` never change.
    pub async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task, StoreError> {
        let mut inner = self.inner.write().await;
        let task = inner
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if let Some(text) = patch.text {
            task.text = text;
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }
        let task = task.clone();
        self.flush(&inner.tasks).await?;
        Ok(task)
    }

    /// Remove the task with the given id. Persists only when something
    /// was actually removed.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.tasks.len();
        inner.tasks.retain(|t| t.id != id);
        if inner.tasks.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.flush(&inner.tasks).await?;
        Ok(())
    }

    /// Rewrite the mirror in full. Atomic: write to tmp, then rename —
    /// prevents partial reads if the process dies mid-write.
    async fn flush(&self, tasks: &[Task]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(tasks)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).await?;
        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn open_writes_mirror_when_absent() {
        let dir = TempDir::new().unwrap();
        let _store = TaskStore::open(dir.path()).await.unwrap();
        let raw = std::fs::read_to_string(dir.path().join("tasks.json")).unwrap();
        let tasks: Vec<Task> = serde_json::from_str(&raw).unwrap();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn open_recovers_from_corrupt_mirror() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("tasks.json"), "not json {{{").unwrap();
        let store = TaskStore::open(dir.path()).await.unwrap();
        assert!(store.list().await.is_empty());
        // Mirror was rewritten to a valid empty array.
        let raw = std::fs::read_to_string(dir.path().join("tasks.json")).unwrap();
        assert_eq!(serde_json::from_str::<Vec<Task>>(&raw).unwrap(), vec![]);
    }

    #[tokio::test]
    async fn id_counter_seeds_from_max_numeric_id() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::open(dir.path()).await.unwrap();
        store.create("one".into(), false).await.unwrap();
        store.create("two".into(), false).await.unwrap();
        store.delete("1").await.unwrap();
        drop(store);

        // Restart: highest surviving id is "2", so the next id must be "3".
        let store = TaskStore::open(dir.path()).await.unwrap();
        let t = store.create("three".into(), false).await.unwrap();
        assert_eq!(t.id, "3");
    }

    #[tokio::test]
    async fn created_at_survives_update() {
        let dir = TempDir::new().unwrap();
        let store = TaskStore::open(dir.path()).await.unwrap();
        let t = store.create("buy milk".into(), false).await.unwrap();
        let updated = store
            .update(
                &t.id,
                TaskPatch {
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.created_at, t.created_at);
        assert_eq!(updated.text, "buy milk");
        assert!(updated.completed);
    }
}
