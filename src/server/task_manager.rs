//! Task manager — the imperative state machine at the center of the server.
//!
//! Owns the task store, the per-task event bus, and the map of in-flight
//! cancellation handles. Every state-changing operation is serialized
//! through one of this type's methods — there is no other path by which a
//! task's `status` field changes.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{A2aError, A2aResult};
use crate::server::agent::Agent;
use crate::server::event_bus::{EventBusRegistry, TaskEventBus};
use crate::server::runner::{Runner, RunOptions, RunResult, TokenSink};
use crate::server::task_store::{TaskListFilter, TaskStore};
use crate::types::{Artifact, Message, Part, Role, StreamEvent, Task, TaskState, TaskStatus};

/// Orchestrates task creation, continuation, execution, and termination.
pub struct TaskManager {
    store: Arc<dyn TaskStore>,
    event_buses: Arc<EventBusRegistry>,
    cancellation_handles: Mutex<HashMap<String, CancellationToken>>,
}

impl TaskManager {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self {
            store,
            event_buses: Arc::new(EventBusRegistry::new()),
            cancellation_handles: Mutex::new(HashMap::new()),
        }
    }

    /// Get or create the event bus for a task id, for subscribers (SSE,
    /// the push dispatcher) to attach to before or after the task exists.
    pub async fn event_bus(&self, task_id: &str) -> TaskEventBus {
        self.event_buses.get_or_create(task_id).await
    }

    async fn emit(&self, task_id: &str, event: StreamEvent) {
        self.event_buses.get_or_create(task_id).await.publish(event).await;
    }

    /// `CreateTask(message, contextId?) → task`
    pub async fn create_task(&self, message: Message, context_id: Option<String>) -> A2aResult<Task> {
        let task_id = format!("task_{}", Uuid::new_v4());
        let context_id = context_id.unwrap_or_else(|| format!("ctx_{}", Uuid::new_v4()));
        let timestamp = Utc::now().to_rfc3339();

        let mut status = TaskStatus::new(TaskState::Working);
        status.timestamp = Some(timestamp.clone());

        let task = Task {
            id: task_id.clone(),
            context_id,
            status,
            artifacts: vec![],
            history: vec![message],
            metadata: None,
        };

        self.store.create(task.clone()).await?;
        self.emit(
            &task_id,
            StreamEvent::StatusUpdate {
                task_id: task_id.clone(),
                status: task.status.clone(),
                timestamp,
            },
        )
        .await;

        debug!(task_id = %task_id, "task created");
        Ok(task)
    }

    /// `ContinueTask(taskId, message) → task`
    pub async fn continue_task(&self, task_id: &str, message: Message) -> A2aResult<Task> {
        let mut task = self
            .get_task(task_id)
            .await?;

        match task.status.state {
            TaskState::InputRequired | TaskState::Completed => {}
            _ => {
                return Err(A2aError::task_not_continuable(format!(
                    "task {} is in state {} and cannot be continued",
                    task_id, task.status.state
                )));
            }
        }

        task.history.push(message);
        let timestamp = Utc::now().to_rfc3339();
        task.status = TaskStatus::new(TaskState::Working);
        task.status.timestamp = Some(timestamp.clone());

        self.store
            .update(
                task_id,
                serde_json::json!({"status": task.status, "history": task.history}),
            )
            .await?;

        self.emit(
            task_id,
            StreamEvent::StatusUpdate {
                task_id: task_id.to_string(),
                status: task.status.clone(),
                timestamp,
            },
        )
        .await;

        Ok(task)
    }

    /// `ExecuteTask(task, runner, agent, triggeringMessage, onToken?) → task`
    ///
    /// Registers the cancellation handle, runs, and always resolves into
    /// exactly one of `complete_task`/`fail_task`/`cancel_task` — removing
    /// the handle whatever the outcome.
    pub async fn execute_task(
        &self,
        task: &Task,
        runner: Arc<dyn Runner>,
        agent: &Agent,
        triggering_message: &Message,
        on_token: Option<TokenSink>,
    ) -> A2aResult<Task> {
        let task_id = task.id.clone();
        let cancel = CancellationToken::new();
        self.cancellation_handles
            .lock()
            .await
            .insert(task_id.clone(), cancel.clone());

        let input = triggering_message
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        let options = RunOptions {
            input,
            cancel: cancel.clone(),
            stream: on_token.is_some(),
            on_token,
        };

        let run_outcome = runner.run(agent, options).await;

        self.cancellation_handles.lock().await.remove(&task_id);

        match run_outcome {
            Ok(result) => self.complete_task(&task_id, result).await,
            Err(err) => {
                if cancel.is_cancelled() {
                    self.cancel_task(&task_id).await
                } else {
                    self.fail_task(&task_id, err.to_string()).await
                }
            }
        }
    }

    /// `CompleteTask(taskId, result)`
    pub async fn complete_task(&self, task_id: &str, result: RunResult) -> A2aResult<Task> {
        let mut task = self.get_task(task_id).await?;
        let timestamp = Utc::now().to_rfc3339();

        let mut artifacts = Vec::new();
        if !result.output.is_empty() {
            artifacts.push(Artifact {
                artifact_id: format!("art_{}", Uuid::new_v4()),
                name: None,
                mime_type: Some("text/plain".to_string()),
                parts: vec![Part::text(result.output.clone())],
                metadata: None,
            });
        }
        if let Some(ref structured) = result.structured {
            artifacts.push(Artifact {
                artifact_id: format!("art_{}", Uuid::new_v4()),
                name: None,
                mime_type: Some("application/json".to_string()),
                parts: vec![Part::data(structured.clone())],
                metadata: None,
            });
        }

        let mut agent_message_parts = vec![Part::text(result.output.clone())];
        if let Some(structured) = result.structured.clone() {
            agent_message_parts.push(Part::data(structured));
        }
        let agent_message = Message {
            message_id: format!("msg_{}", Uuid::new_v4()),
            role: Role::Agent,
            parts: agent_message_parts,
            context_id: Some(task.context_id.clone()),
            task_id: Some(task_id.to_string()),
            reference_task_ids: None,
            metadata: None,
        };
        task.history.push(agent_message);

        task.status = TaskStatus::new(TaskState::Completed);
        task.status.timestamp = Some(timestamp.clone());
        task.artifacts.extend(artifacts.clone());

        self.store
            .update(
                task_id,
                serde_json::json!({
                    "status": task.status,
                    "history": task.history,
                    "artifacts": task.artifacts,
                }),
            )
            .await?;

        self.emit(
            task_id,
            StreamEvent::StatusUpdate {
                task_id: task_id.to_string(),
                status: task.status.clone(),
                timestamp: timestamp.clone(),
            },
        )
        .await;

        for artifact in artifacts {
            self.emit(
                task_id,
                StreamEvent::ArtifactUpdate {
                    task_id: task_id.to_string(),
                    artifact,
                    timestamp: timestamp.clone(),
                },
            )
            .await;
        }

        Ok(task)
    }

    /// `FailTask(taskId, errorMessage)`
    pub async fn fail_task(&self, task_id: &str, error_message: String) -> A2aResult<Task> {
        let mut task = self.get_task(task_id).await?;
        let timestamp = Utc::now().to_rfc3339();

        let mut status = TaskStatus::new(TaskState::Failed);
        status.timestamp = Some(timestamp.clone());
        status.message = Some(Message::agent_text(format!("msg_{}", Uuid::new_v4()), error_message));
        task.status = status;

        self.store
            .update(task_id, serde_json::json!({"status": task.status}))
            .await?;

        warn!(task_id = %task_id, "task failed");
        self.emit(
            task_id,
            StreamEvent::StatusUpdate {
                task_id: task_id.to_string(),
                status: task.status.clone(),
                timestamp,
            },
        )
        .await;

        Ok(task)
    }

    /// `CancelTask(taskId)`
    pub async fn cancel_task(&self, task_id: &str) -> A2aResult<Task> {
        let mut task = self.get_task(task_id).await?;
        if task.status.state.is_terminal() {
            return Err(A2aError::task_not_cancelable(format!(
                "task {} is already in terminal state {}",
                task_id, task.status.state
            )));
        }

        if let Some(handle) = self.cancellation_handles.lock().await.get(task_id) {
            handle.cancel();
        }

        let timestamp = Utc::now().to_rfc3339();
        task.status = TaskStatus::new(TaskState::Canceled);
        task.status.timestamp = Some(timestamp.clone());

        self.store
            .update(task_id, serde_json::json!({"status": task.status}))
            .await?;

        self.emit(
            task_id,
            StreamEvent::StatusUpdate {
                task_id: task_id.to_string(),
                status: task.status.clone(),
                timestamp,
            },
        )
        .await;

        info!(task_id = %task_id, "task canceled");
        Ok(task)
    }

    /// `GetTask(taskId)` — fails with `task-not-found` if unknown.
    pub async fn get_task(&self, task_id: &str) -> A2aResult<Task> {
        self.store
            .get(task_id)
            .await?
            .ok_or_else(|| A2aError::task_not_found(task_id.to_string()))
    }

    /// `ListTasks(filter)` — pass-through to the store.
    pub async fn list_tasks(&self, filter: &TaskListFilter) -> A2aResult<Vec<Task>> {
        self.store.list(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::task_store::InMemoryTaskStore;
    use async_trait::async_trait;

    struct StubRunner {
        output: String,
    }

    #[async_trait]
    impl Runner for StubRunner {
        async fn run(&self, _agent: &Agent, _options: RunOptions) -> A2aResult<RunResult> {
            Ok(RunResult {
                output: self.output.clone(),
                ..Default::default()
            })
        }
    }

    struct FailingRunner;

    #[async_trait]
    impl Runner for FailingRunner {
        async fn run(&self, _agent: &Agent, _options: RunOptions) -> A2aResult<RunResult> {
            Err(A2aError::internal_error("boom"))
        }
    }

    struct CancelingRunner;

    #[async_trait]
    impl Runner for CancelingRunner {
        async fn run(&self, _agent: &Agent, options: RunOptions) -> A2aResult<RunResult> {
            options.cancel.cancel();
            Err(A2aError::internal_error("canceled"))
        }
    }

    fn manager() -> TaskManager {
        TaskManager::new(Arc::new(InMemoryTaskStore::new()))
    }

    fn test_agent() -> Agent {
        Agent {
            name: "test".to_string(),
            card: crate::types::AgentCard {
                name: "test".to_string(),
                description: String::new(),
                url: String::new(),
                version: "0.1.0".to_string(),
                capabilities: Default::default(),
                skills: vec![],
                default_input_modes: vec![],
                default_output_modes: vec![],
                provider: None,
                security_schemes: None,
                signature: None,
            },
        }
    }

    #[tokio::test]
    async fn create_task_starts_working_with_one_history_entry() {
        let mgr = manager();
        let msg = Message::user_text("m1", "hello");
        let task = mgr.create_task(msg, None).await.unwrap();
        assert_eq!(task.status.state, TaskState::Working);
        assert_eq!(task.history.len(), 1);
    }

    #[tokio::test]
    async fn continue_task_rejected_from_working() {
        let mgr = manager();
        let task = mgr.create_task(Message::user_text("m1", "hi"), None).await.unwrap();
        let err = mgr
            .continue_task(&task.id, Message::user_text("m2", "more"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), crate::error::TASK_NOT_CONTINUABLE);
    }

    #[tokio::test]
    async fn continue_task_allowed_from_completed() {
        let mgr = manager();
        let task = mgr.create_task(Message::user_text("m1", "hi"), None).await.unwrap();
        let runner: Arc<dyn Runner> = Arc::new(StubRunner {
            output: "done".to_string(),
        });
        let completed = mgr
            .execute_task(&task, runner, &test_agent(), &task.history[0].clone(), None)
            .await
            .unwrap();
        assert_eq!(completed.status.state, TaskState::Completed);

        let continued = mgr
            .continue_task(&completed.id, Message::user_text("m2", "again"))
            .await
            .unwrap();
        assert_eq!(continued.status.state, TaskState::Working);
        assert_eq!(continued.history.len(), 3); // original + agent reply + new
    }

    #[tokio::test]
    async fn execute_task_success_completes_with_text_artifact() {
        let mgr = manager();
        let task = mgr.create_task(Message::user_text("m1", "hello"), None).await.unwrap();
        let runner: Arc<dyn Runner> = Arc::new(StubRunner {
            output: "world".to_string(),
        });

        let completed = mgr
            .execute_task(&task, runner, &test_agent(), &task.history[0].clone(), None)
            .await
            .unwrap();

        assert_eq!(completed.status.state, TaskState::Completed);
        assert_eq!(completed.artifacts.len(), 1);
        assert_eq!(completed.artifacts[0].mime_type.as_deref(), Some("text/plain"));
        assert_eq!(completed.history.len(), 2);
    }

    #[tokio::test]
    async fn execute_task_structured_output_yields_two_artifacts() {
        let mgr = manager();
        let task = mgr.create_task(Message::user_text("m1", "hello"), None).await.unwrap();

        struct StructuredRunner;
        #[async_trait]
        impl Runner for StructuredRunner {
            async fn run(&self, _agent: &Agent, _options: RunOptions) -> A2aResult<RunResult> {
                Ok(RunResult {
                    output: "x".to_string(),
                    structured: Some(serde_json::json!({"total": 42})),
                    ..Default::default()
                })
            }
        }

        let completed = mgr
            .execute_task(&task, Arc::new(StructuredRunner), &test_agent(), &task.history[0].clone(), None)
            .await
            .unwrap();

        assert_eq!(completed.artifacts.len(), 2);
        assert_eq!(completed.artifacts[1].mime_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn execute_task_failure_fails_task() {
        let mgr = manager();
        let task = mgr.create_task(Message::user_text("m1", "hello"), None).await.unwrap();
        let outcome = mgr
            .execute_task(&task, Arc::new(FailingRunner), &test_agent(), &task.history[0].clone(), None)
            .await
            .unwrap();
        assert_eq!(outcome.status.state, TaskState::Failed);
    }

    #[tokio::test]
    async fn execute_task_cancel_signal_classified_as_canceled() {
        let mgr = manager();
        let task = mgr.create_task(Message::user_text("m1", "hello"), None).await.unwrap();
        let outcome = mgr
            .execute_task(&task, Arc::new(CancelingRunner), &test_agent(), &task.history[0].clone(), None)
            .await
            .unwrap();
        assert_eq!(outcome.status.state, TaskState::Canceled);
    }

    #[tokio::test]
    async fn cancel_task_fails_when_already_terminal() {
        let mgr = manager();
        let task = mgr.create_task(Message::user_text("m1", "hello"), None).await.unwrap();
        mgr.execute_task(&task, Arc::new(StubRunner { output: "done".into() }), &test_agent(), &task.history[0].clone(), None)
            .await
            .unwrap();

        let err = mgr.cancel_task(&task.id).await.unwrap_err();
        assert_eq!(err.code(), crate::error::TASK_NOT_CANCELABLE);
    }

    #[tokio::test]
    async fn get_task_missing_is_task_not_found() {
        let mgr = manager();
        let err = mgr.get_task("nope").await.unwrap_err();
        assert_eq!(err.code(), crate::error::TASK_NOT_FOUND);
    }

    #[tokio::test]
    async fn event_bus_receives_status_then_artifact_events_in_order() {
        let mgr = manager();
        let task = mgr.create_task(Message::user_text("m1", "hello"), None).await.unwrap();
        let mut sub = mgr.event_bus(&task.id).await.subscribe().await;

        mgr.execute_task(
            &task,
            Arc::new(StubRunner { output: "world".into() }),
            &test_agent(),
            &task.history[0].clone(),
            None,
        )
        .await
        .unwrap();

        let first = sub.next().await.unwrap();
        let second = sub.next().await.unwrap();
        assert!(matches!(first, StreamEvent::StatusUpdate { .. }));
        assert!(matches!(second, StreamEvent::ArtifactUpdate { .. }));
        assert!(first.is_terminal());
    }
}
