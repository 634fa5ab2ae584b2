//! Key-value backed task store.
//!
//! Wraps an injected [`KvBackend`] so tasks can live in an external cache
//! (Redis, memcached, ...) instead of the process's own heap. The default
//! [`MemoryKvBackend`] keeps everything in-process and exists mainly so the
//! driver can be exercised without a real backend wired in.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::{A2aError, A2aResult};
use crate::server::task_store::{TaskListFilter, TaskStore};
use crate::types::Task;

const DEFAULT_PREFIX: &str = "a2a:task:";

/// A minimal key-value backend contract. Implementations that cannot honor
/// `set_with_ttl` must report that via [`KvBackend::supports_ttl`] so
/// [`KvTaskStore::new`] can refuse a TTL configuration at construction time
/// rather than silently ignoring it.
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn get(&self, key: &str) -> A2aResult<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: Vec<u8>) -> A2aResult<()>;
    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> A2aResult<()>;
    async fn delete(&self, key: &str) -> A2aResult<()>;
    /// Return every stored value whose key starts with `prefix`.
    async fn scan_prefix(&self, prefix: &str) -> A2aResult<Vec<Vec<u8>>>;
    /// Whether this backend can honor `set_with_ttl`. `KvTaskStore::new`
    /// refuses to construct with a TTL configured against a backend that
    /// returns `false` here.
    fn supports_ttl(&self) -> bool;
}

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

/// In-process `KvBackend` with TTL support, for default wiring and tests.
#[derive(Default)]
pub struct MemoryKvBackend {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryKvBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvBackend for MemoryKvBackend {
    async fn get(&self, key: &str) -> A2aResult<Option<Vec<u8>>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at.is_some_and(|exp| exp <= Instant::now()) => Ok(None),
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> A2aResult<()> {
        self.entries.write().await.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> A2aResult<()> {
        self.entries.write().await.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> A2aResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> A2aResult<Vec<Vec<u8>>> {
        let entries = self.entries.read().await;
        let now = Instant::now();
        Ok(entries
            .iter()
            .filter(|(k, e)| k.starts_with(prefix) && e.expires_at.is_none_or(|exp| exp > now))
            .map(|(_, e)| e.value.clone())
            .collect())
    }

    fn supports_ttl(&self) -> bool {
        true
    }
}

/// `TaskStore` driven by an injected [`KvBackend`].
pub struct KvTaskStore {
    backend: Arc<dyn KvBackend>,
    prefix: String,
    ttl: Option<Duration>,
}

impl KvTaskStore {
    /// Construct a store keyed as `<prefix><task-id>`. Returns an error if
    /// `ttl` is set but `backend` cannot honor `set_with_ttl`.
    pub fn new(backend: Arc<dyn KvBackend>, prefix: Option<String>, ttl: Option<Duration>) -> A2aResult<Self> {
        if ttl.is_some() && !backend.supports_ttl() {
            return Err(A2aError::internal_error(
                "KV backend does not support TTL but a TTL was configured",
            ));
        }
        Ok(Self {
            backend,
            prefix: prefix.unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            ttl,
        })
    }

    fn key(&self, task_id: &str) -> String {
        format!("{}{}", self.prefix, task_id)
    }

    async fn put(&self, task: &Task) -> A2aResult<()> {
        let bytes = serde_json::to_vec(task)?;
        let key = self.key(&task.id);
        match self.ttl {
            Some(ttl) => self.backend.set_with_ttl(&key, bytes, ttl).await,
            None => self.backend.set(&key, bytes).await,
        }
    }
}

#[async_trait]
impl TaskStore for KvTaskStore {
    async fn create(&self, task: Task) -> A2aResult<()> {
        self.put(&task).await
    }

    async fn get(&self, task_id: &str) -> A2aResult<Option<Task>> {
        match self.backend.get(&self.key(task_id)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, task_id: &str, partial: serde_json::Value) -> A2aResult<()> {
        let Some(existing) = self.get(task_id).await? else {
            return Ok(());
        };
        let mut value = serde_json::to_value(&existing)?;
        if let (Some(obj), Some(patch)) = (value.as_object_mut(), partial.as_object()) {
            for (k, v) in patch {
                obj.insert(k.clone(), v.clone());
            }
        }
        let merged: Task = serde_json::from_value(value)?;
        self.put(&merged).await
    }

    async fn list(&self, filter: &TaskListFilter) -> A2aResult<Vec<Task>> {
        let raw = self.backend.scan_prefix(&self.prefix).await?;
        let mut tasks: Vec<Task> = raw
            .into_iter()
            .filter_map(|bytes| serde_json::from_slice::<Task>(&bytes).ok())
            .filter(|t| {
                filter
                    .context_id
                    .as_deref()
                    .is_none_or(|ctx| t.context_id == ctx)
            })
            .filter(|t| filter.state.is_none_or(|s| t.status.state == s))
            .collect();

        tasks.sort_by(|a, b| {
            let a_ts = a.status.timestamp.as_deref().unwrap_or("");
            let b_ts = b.status.timestamp.as_deref().unwrap_or("");
            b_ts.cmp(a_ts)
        });

        let start = filter.offset.min(tasks.len());
        Ok(match filter.limit {
            Some(limit) => tasks.into_iter().skip(start).take(limit).collect(),
            None => tasks.into_iter().skip(start).collect(),
        })
    }

    async fn delete(&self, task_id: &str) -> A2aResult<()> {
        self.backend.delete(&self.key(task_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TaskState, TaskStatus};

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            context_id: "ctx".to_string(),
            status: TaskStatus::new(TaskState::Working),
            artifacts: vec![],
            history: vec![],
            metadata: None,
        }
    }

    #[tokio::test]
    async fn round_trips_through_memory_backend() {
        let store = KvTaskStore::new(Arc::new(MemoryKvBackend::new()), None, None).unwrap();
        store.create(task("task_1")).await.unwrap();
        let got = store.get("task_1").await.unwrap().unwrap();
        assert_eq!(got.id, "task_1");
    }

    #[tokio::test]
    async fn keys_use_configured_prefix() {
        let backend = Arc::new(MemoryKvBackend::new());
        let store = KvTaskStore::new(backend.clone(), Some("myapp:".to_string()), None).unwrap();
        store.create(task("task_1")).await.unwrap();
        assert!(backend.get("myapp:task_1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn ttl_expires_entries() {
        let store = KvTaskStore::new(
            Arc::new(MemoryKvBackend::new()),
            None,
            Some(Duration::from_millis(10)),
        )
        .unwrap();
        store.create(task("task_1")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store.get("task_1").await.unwrap().is_none());
    }

    struct NoTtlBackend;

    #[async_trait]
    impl KvBackend for NoTtlBackend {
        async fn get(&self, _key: &str) -> A2aResult<Option<Vec<u8>>> {
            Ok(None)
        }
        async fn set(&self, _key: &str, _value: Vec<u8>) -> A2aResult<()> {
            Ok(())
        }
        async fn set_with_ttl(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> A2aResult<()> {
            unreachable!("backend does not support ttl")
        }
        async fn delete(&self, _key: &str) -> A2aResult<()> {
            Ok(())
        }
        async fn scan_prefix(&self, _prefix: &str) -> A2aResult<Vec<Vec<u8>>> {
            Ok(vec![])
        }
        fn supports_ttl(&self) -> bool {
            false
        }
    }

    #[test]
    fn ttl_on_unsupported_backend_is_rejected() {
        let err = KvTaskStore::new(Arc::new(NoTtlBackend), None, Some(Duration::from_secs(1)));
        assert!(err.is_err());
    }
}
