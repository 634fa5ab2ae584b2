//! Push notification config store — persistence for per-task webhooks.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::A2aResult;
use crate::types::{PushNotificationConfig, PushNotificationConfigInput};

/// Trait for persisting a task's registered push notification webhooks.
///
/// A task may have zero or more configs; each is keyed by `(task_id,
/// config_id)`.
#[async_trait]
pub trait PushNotificationStore: Send + Sync {
    /// Register a new webhook for `task_id`, generating its `id` and
    /// `createdAt`.
    async fn create(
        &self,
        task_id: &str,
        input: PushNotificationConfigInput,
    ) -> A2aResult<PushNotificationConfig>;

    /// Fetch a single config by id.
    async fn get(&self, task_id: &str, config_id: &str) -> A2aResult<Option<PushNotificationConfig>>;

    /// List every config registered for a task.
    async fn list(&self, task_id: &str) -> A2aResult<Vec<PushNotificationConfig>>;

    /// Remove a config. Idempotent.
    async fn delete(&self, task_id: &str, config_id: &str) -> A2aResult<()>;

    /// Remove every config for a task, e.g. when the task itself is deleted.
    async fn delete_all(&self, task_id: &str) -> A2aResult<()>;
}

#[derive(Default)]
pub struct InMemoryPushNotificationStore {
    configs: Arc<RwLock<HashMap<String, HashMap<String, PushNotificationConfig>>>>,
}

impl InMemoryPushNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PushNotificationStore for InMemoryPushNotificationStore {
    async fn create(
        &self,
        task_id: &str,
        input: PushNotificationConfigInput,
    ) -> A2aResult<PushNotificationConfig> {
        let config = PushNotificationConfig {
            id: format!("pnc_{}", Uuid::new_v4()),
            webhook_url: input.webhook_url,
            authentication_info: input.authentication_info,
            created_at: Utc::now().to_rfc3339(),
        };
        self.configs
            .write()
            .await
            .entry(task_id.to_string())
            .or_default()
            .insert(config.id.clone(), config.clone());
        Ok(config)
    }

    async fn get(&self, task_id: &str, config_id: &str) -> A2aResult<Option<PushNotificationConfig>> {
        Ok(self
            .configs
            .read()
            .await
            .get(task_id)
            .and_then(|m| m.get(config_id))
            .cloned())
    }

    async fn list(&self, task_id: &str) -> A2aResult<Vec<PushNotificationConfig>> {
        Ok(self
            .configs
            .read()
            .await
            .get(task_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete(&self, task_id: &str, config_id: &str) -> A2aResult<()> {
        if let Some(m) = self.configs.write().await.get_mut(task_id) {
            m.remove(config_id);
        }
        Ok(())
    }

    async fn delete_all(&self, task_id: &str) -> A2aResult<()> {
        self.configs.write().await.remove(task_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PushNotificationAuthInfo;

    fn input(url: &str) -> PushNotificationConfigInput {
        PushNotificationConfigInput {
            webhook_url: url.to_string(),
            authentication_info: Some(PushNotificationAuthInfo::Bearer {
                token: "tok".to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn create_assigns_id_and_timestamp() {
        let store = InMemoryPushNotificationStore::new();
        let config = store.create("task_1", input("https://example.com/hook")).await.unwrap();
        assert!(config.id.starts_with("pnc_"));
        assert!(!config.created_at.is_empty());
    }

    #[tokio::test]
    async fn list_returns_all_for_task_only() {
        let store = InMemoryPushNotificationStore::new();
        store.create("task_1", input("https://a")).await.unwrap();
        store.create("task_1", input("https://b")).await.unwrap();
        store.create("task_2", input("https://c")).await.unwrap();

        assert_eq!(store.list("task_1").await.unwrap().len(), 2);
        assert_eq!(store.list("task_2").await.unwrap().len(), 1);
        assert_eq!(store.list("task_3").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_scoped_to_task() {
        let store = InMemoryPushNotificationStore::new();
        let config = store.create("task_1", input("https://a")).await.unwrap();

        store.delete("task_2", &config.id).await.unwrap(); // wrong task, no-op
        assert!(store.get("task_1", &config.id).await.unwrap().is_some());

        store.delete("task_1", &config.id).await.unwrap();
        store.delete("task_1", &config.id).await.unwrap(); // idempotent
        assert!(store.get("task_1", &config.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_all_removes_every_config() {
        let store = InMemoryPushNotificationStore::new();
        store.create("task_1", input("https://a")).await.unwrap();
        store.create("task_1", input("https://b")).await.unwrap();
        store.delete_all("task_1").await.unwrap();
        assert_eq!(store.list("task_1").await.unwrap().len(), 0);
    }
}
