//! Task store — persistence layer for tasks.
//!
//! The store is responsible for persisting and retrieving [`Task`] records.
//! Reads and writes deep-copy (via `Clone`) so callers never hold a live
//! reference into the stored value — mutating a value returned by `get`
//! must never affect a subsequent read.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::A2aResult;
use crate::types::{Task, TaskState};

/// Filter + pagination parameters for `List`.
#[derive(Debug, Clone, Default)]
pub struct TaskListFilter {
    /// Only tasks with this `contextId`.
    pub context_id: Option<String>,
    /// Only tasks in this state.
    pub state: Option<TaskState>,
    /// Skip this many matching tasks before collecting results.
    pub offset: usize,
    /// Maximum number of tasks to return. `None` means "all remaining".
    pub limit: Option<usize>,
}

/// Trait for persisting and retrieving tasks.
///
/// Implementations must be `Send + Sync` for use in async server contexts.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new task. Overwriting an existing id is undefined behavior —
    /// callers are expected to route re-entry through `update`.
    async fn create(&self, task: Task) -> A2aResult<()>;

    /// Retrieve a task by id, or `None` if it does not exist.
    async fn get(&self, task_id: &str) -> A2aResult<Option<Task>>;

    /// Shallow-merge `partial` fields into the existing record. A missing
    /// task is a silent no-op so a concurrent delete never raises here.
    async fn update(&self, task_id: &str, partial: serde_json::Value) -> A2aResult<()>;

    /// List tasks matching `filter`, sorted by `status.timestamp` descending
    /// (newest first), then sliced to `[offset, offset+limit)`.
    async fn list(&self, filter: &TaskListFilter) -> A2aResult<Vec<Task>>;

    /// Delete a task by id. Idempotent — deleting a missing task is a
    /// silent no-op.
    async fn delete(&self, task_id: &str) -> A2aResult<()>;
}

/// Shallow-merges `partial`'s top-level object fields onto `task`,
/// re-serializing through `serde_json::Value` so the merge doesn't need to
/// know `Task`'s field list.
fn merge_task(task: &Task, partial: &serde_json::Value) -> A2aResult<Task> {
    let mut value = serde_json::to_value(task)?;
    if let (Some(obj), Some(patch)) = (value.as_object_mut(), partial.as_object()) {
        for (key, v) in patch {
            obj.insert(key.clone(), v.clone());
        }
    }
    Ok(serde_json::from_value(value)?)
}

fn sort_and_paginate(mut tasks: Vec<Task>, filter: &TaskListFilter) -> Vec<Task> {
    tasks.sort_by(|a, b| {
        let a_ts = a.status.timestamp.as_deref().unwrap_or("");
        let b_ts = b.status.timestamp.as_deref().unwrap_or("");
        b_ts.cmp(a_ts)
    });

    let start = filter.offset.min(tasks.len());
    match filter.limit {
        Some(limit) => tasks
            .into_iter()
            .skip(start)
            .take(limit)
            .collect(),
        None => tasks.into_iter().skip(start).collect(),
    }
}

/// In-memory task store backed by a `HashMap`. Data is lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<HashMap<String, Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, task: Task) -> A2aResult<()> {
        let task_id = task.id.clone();
        self.tasks.write().await.insert(task_id.clone(), task);
        debug!(task_id = %task_id, "task created");
        Ok(())
    }

    async fn get(&self, task_id: &str) -> A2aResult<Option<Task>> {
        Ok(self.tasks.read().await.get(task_id).cloned())
    }

    async fn update(&self, task_id: &str, partial: serde_json::Value) -> A2aResult<()> {
        let mut tasks = self.tasks.write().await;
        let Some(existing) = tasks.get(task_id) else {
            debug!(task_id = %task_id, "update on missing task — no-op");
            return Ok(());
        };
        let merged = merge_task(existing, &partial)?;
        tasks.insert(task_id.to_string(), merged);
        Ok(())
    }

    async fn list(&self, filter: &TaskListFilter) -> A2aResult<Vec<Task>> {
        let tasks = self.tasks.read().await;
        let matching: Vec<Task> = tasks
            .values()
            .filter(|t| {
                filter
                    .context_id
                    .as_deref()
                    .is_none_or(|ctx| t.context_id == ctx)
            })
            .filter(|t| filter.state.is_none_or(|s| t.status.state == s))
            .cloned()
            .collect();
        Ok(sort_and_paginate(matching, filter))
    }

    async fn delete(&self, task_id: &str) -> A2aResult<()> {
        self.tasks.write().await.remove(task_id);
        Ok(())
    }
}
