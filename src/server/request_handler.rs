//! Request handler — the service layer behind the JSON-RPC dispatch table.
//!
//! Where the teacher split this concern into a `RequestHandler` trait plus
//! a `DefaultRequestHandler` wired to a single `AgentExecutor`, this crate
//! has no second implementation to abstract over — every method here is a
//! thin, concrete composition of [`TaskManager`], [`AgentRegistry`], and
//! [`PushNotificationStore`]. The trait layer is dropped; the method
//! bodies are kept and rewritten against the new state machine.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;

use crate::error::A2aResult;
use crate::server::agent::AgentRegistry;
use crate::server::push_dispatcher::PushNotificationDispatcher;
use crate::server::push_store::PushNotificationStore;
use crate::server::task_manager::TaskManager;
use crate::server::task_store::TaskListFilter;
use crate::types::{
    AgentCard, CancelTaskParams, CreatePushNotificationParams, DeletePushNotificationParams,
    GetExtendedCardParams, GetPushNotificationParams, GetTaskParams, ListPushNotificationParams,
    ListTasksParams, ListTasksResult, PushNotificationConfig, SendMessageParams, StreamEvent,
    Task,
};

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Composes the server's collaborators into the ten operations the JSON-RPC
/// dispatcher calls into.
pub struct A2aService {
    pub task_manager: Arc<TaskManager>,
    pub agents: Arc<AgentRegistry>,
    pub push_store: Arc<dyn PushNotificationStore>,
    pub push_dispatcher: Arc<PushNotificationDispatcher>,
}

impl A2aService {
    pub fn new(
        task_manager: Arc<TaskManager>,
        agents: Arc<AgentRegistry>,
        push_store: Arc<dyn PushNotificationStore>,
        push_dispatcher: Arc<PushNotificationDispatcher>,
    ) -> Self {
        Self {
            task_manager,
            agents,
            push_store,
            push_dispatcher,
        }
    }

    /// Spawns a webhook-dispatch watcher for a task's event bus. Called once
    /// per run, right after the task is created/continued — harmless if the
    /// task has no registered webhooks yet, since `list` is re-checked per
    /// event rather than cached at subscribe time.
    async fn spawn_dispatch_watcher(&self, task_id: &str) {
        let bus = self.task_manager.event_bus(task_id).await;
        let dispatcher = Arc::clone(&self.push_dispatcher);
        let push_store = Arc::clone(&self.push_store);
        let task_id = task_id.to_string();
        tokio::spawn(async move { dispatcher.watch(task_id, bus, push_store).await });
    }

    /// `message/send` — continuation if the message carries a `taskId`,
    /// otherwise a fresh task. Blocks until the run reaches a terminal
    /// state and returns that task.
    pub async fn message_send(&self, params: SendMessageParams) -> A2aResult<Task> {
        let (agent, runner) = self.agents.resolve_owned(params.agent_name.as_deref())?;
        let message = params.message;

        let task = match message.task_id.clone() {
            Some(task_id) => self.task_manager.continue_task(&task_id, message.clone()).await?,
            None => {
                self.task_manager
                    .create_task(message.clone(), message.context_id.clone())
                    .await?
            }
        };
        self.spawn_dispatch_watcher(&task.id).await;

        self.task_manager
            .execute_task(&task, runner, &agent, &message, None)
            .await
    }

    /// `message/stream` — same task setup as `message_send`, but returns a
    /// lazy event sequence instead of blocking for the final task.
    ///
    /// Per §4.4: a synthetic initial `status-update` reflecting the
    /// post-create/continue status, then bus events (including tokens) in
    /// arrival order, terminating after the first terminal `status-update`.
    pub async fn message_stream(
        &self,
        params: SendMessageParams,
    ) -> A2aResult<mpsc::Receiver<StreamEvent>> {
        let (agent, runner) = self.agents.resolve_owned(params.agent_name.as_deref())?;
        let message = params.message;

        let task = match message.task_id.clone() {
            Some(task_id) => self.task_manager.continue_task(&task_id, message.clone()).await?,
            None => {
                self.task_manager
                    .create_task(message.clone(), message.context_id.clone())
                    .await?
            }
        };
        self.spawn_dispatch_watcher(&task.id).await;

        // Subscribe before spawning the run so no event emitted by
        // `execute_task` can be missed.
        let bus = self.task_manager.event_bus(&task.id).await;
        let mut subscription = bus.subscribe().await;

        let initial = StreamEvent::StatusUpdate {
            task_id: task.id.clone(),
            status: task.status.clone(),
            timestamp: task.status.timestamp.clone().unwrap_or_else(now_rfc3339),
        };

        let (out_tx, out_rx) = mpsc::channel(256);
        let manager = Arc::clone(&self.task_manager);
        let task_id = task.id.clone();

        tokio::spawn(async move {
            if out_tx.send(initial).await.is_err() {
                return;
            }

            // Drive the run concurrently with forwarding its token events,
            // so tokens reach the subscriber live rather than being
            // buffered until the run finishes.
            let (token_tx, mut token_rx) = mpsc::unbounded_channel::<String>();
            let sink: crate::server::runner::TokenSink = Arc::new(move |t: &str| {
                let _ = token_tx.send(t.to_string());
            });

            let run_task_id = task_id.clone();
            let mut run = Box::pin(async move {
                manager
                    .execute_task(&task, runner, &agent, &message, Some(sink))
                    .await
            });
            let mut run_done = false;

            loop {
                tokio::select! {
                    biased;
                    Some(token) = token_rx.recv() => {
                        let event = StreamEvent::Token {
                            task_id: run_task_id.clone(),
                            token,
                            timestamp: now_rfc3339(),
                        };
                        if out_tx.send(event).await.is_err() {
                            return;
                        }
                    }
                    result = &mut run, if !run_done => {
                        run_done = true;
                        if let Err(err) = result {
                            warn!(task_id = %run_task_id, error = %err, "streamed run ended in error");
                        }
                    }
                    else => break,
                }
                if run_done && token_rx.is_empty() {
                    break;
                }
            }

            // Forward bus events (status/artifact, plus any trailing
            // tokens published elsewhere) until the terminal status.
            loop {
                match subscription.next().await {
                    Some(event) => {
                        let terminal = event.is_terminal();
                        if out_tx.send(event).await.is_err() {
                            return;
                        }
                        if terminal {
                            return;
                        }
                    }
                    None => return,
                }
            }
        });

        Ok(out_rx)
    }

    pub async fn get_task(&self, params: GetTaskParams) -> A2aResult<Task> {
        self.task_manager.get_task(&params.id).await
    }

    pub async fn cancel_task(&self, params: CancelTaskParams) -> A2aResult<Task> {
        self.task_manager.cancel_task(&params.id).await
    }

    pub async fn list_tasks(&self, params: ListTasksParams) -> A2aResult<ListTasksResult> {
        let filter = TaskListFilter {
            context_id: params.context_id,
            state: params.state,
            offset: params.offset.unwrap_or(0),
            limit: params.limit,
        };
        let tasks = self.task_manager.list_tasks(&filter).await?;
        Ok(ListTasksResult { tasks })
    }

    pub async fn create_push_notification(
        &self,
        params: CreatePushNotificationParams,
    ) -> A2aResult<PushNotificationConfig> {
        // Confirm the task exists before registering a webhook for it.
        self.task_manager.get_task(&params.task_id).await?;
        self.push_store.create(&params.task_id, params.config).await
    }

    pub async fn get_push_notification(
        &self,
        params: GetPushNotificationParams,
    ) -> A2aResult<Option<PushNotificationConfig>> {
        self.push_store.get(&params.task_id, &params.config_id).await
    }

    pub async fn list_push_notification(
        &self,
        params: ListPushNotificationParams,
    ) -> A2aResult<Vec<PushNotificationConfig>> {
        self.push_store.list(&params.task_id).await
    }

    pub async fn delete_push_notification(
        &self,
        params: DeletePushNotificationParams,
    ) -> A2aResult<()> {
        self.push_store.delete(&params.task_id, &params.config_id).await
    }

    pub async fn extended_card(&self, params: GetExtendedCardParams) -> A2aResult<AgentCard> {
        self.agents
            .card(params.agent_name.as_deref())
            .map(|card| card.clone())
    }
}
