//! Shared test utilities for integration tests.

use std::sync::Arc;

use a2a_core::builders::AgentCardBuilder;
use a2a_core::error::A2aResult;
use a2a_core::server::{
    a2a_router, Agent, AgentRegistry, AppState, A2aService, InMemoryPushNotificationStore,
    InMemoryTaskStore, PushNotificationDispatcher, RunOptions, RunResult, Runner, TaskManager,
    TaskStore,
};
use async_trait::async_trait;

/// Echoes the triggering message's text back as the task's output.
pub struct EchoAgent;

#[async_trait]
impl Runner for EchoAgent {
    async fn run(&self, _agent: &Agent, options: RunOptions) -> A2aResult<RunResult> {
        Ok(RunResult {
            output: format!("Echo: {}", options.input),
            ..Default::default()
        })
    }
}

/// Sleeps briefly before echoing, so tests can observe a task mid-`working`.
pub struct SlowEchoAgent;

#[async_trait]
impl Runner for SlowEchoAgent {
    async fn run(&self, _agent: &Agent, options: RunOptions) -> A2aResult<RunResult> {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        Ok(RunResult {
            output: format!("Done: {}", options.input),
            ..Default::default()
        })
    }
}

/// Always fails, for exercising the `failed` terminal state.
pub struct FailingAgent;

#[async_trait]
impl Runner for FailingAgent {
    async fn run(&self, _agent: &Agent, _options: RunOptions) -> A2aResult<RunResult> {
        Err(a2a_core::error::A2aError::internal_error("agent intentionally failed"))
    }
}

/// Starts a test server on a random port backed by a fresh in-memory task
/// store. Returns the base URL and a handle to its serve task.
pub async fn start_test_server(runner: Arc<dyn Runner>) -> (String, tokio::task::JoinHandle<()>) {
    start_test_server_with_store(runner, Arc::new(InMemoryTaskStore::new())).await
}

/// Starts a test server on a random port with a caller-supplied task store.
pub async fn start_test_server_with_store(
    runner: Arc<dyn Runner>,
    store: Arc<dyn TaskStore>,
) -> (String, tokio::task::JoinHandle<()>) {
    start_test_server_full(runner, store, None).await
}

/// Starts a test server whose well-known agent card is signed with `secret`.
pub async fn start_test_server_with_secret(
    runner: Arc<dyn Runner>,
    secret: Vec<u8>,
) -> (String, tokio::task::JoinHandle<()>) {
    start_test_server_full(runner, Arc::new(InMemoryTaskStore::new()), Some(secret)).await
}

async fn start_test_server_full(
    runner: Arc<dyn Runner>,
    store: Arc<dyn TaskStore>,
    signing_secret: Option<Vec<u8>>,
) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    let card = AgentCardBuilder::new("Test Echo Agent", "An echo agent for testing", format!("{}/a2a", base_url), "0.1.0")
        .with_streaming(true)
        .with_push_notifications(true)
        .with_skill("echo", "Echo", "Echoes back messages")
        .build();

    let mut agents = AgentRegistry::new();
    agents.register(card, runner);
    let agents = Arc::new(agents);

    let task_manager = Arc::new(TaskManager::new(store));
    let push_store = Arc::new(InMemoryPushNotificationStore::new());
    let dispatcher = Arc::new(PushNotificationDispatcher::new());
    let service = Arc::new(A2aService::new(task_manager, Arc::clone(&agents), push_store, dispatcher));

    let app = a2a_router(AppState {
        service,
        agents,
        signing_secret: signing_secret.map(Arc::new),
    });

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    (base_url, handle)
}

pub fn jsonrpc_request(id: serde_json::Value, method: &str, params: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

pub fn message_send_request(id: i64, text: &str) -> serde_json::Value {
    jsonrpc_request(
        serde_json::json!(id),
        "message/send",
        serde_json::json!({
            "message": {
                "messageId": format!("test-msg-{}", id),
                "role": "user",
                "parts": [{"kind": "text", "text": text}]
            }
        }),
    )
}

pub fn message_send_with_context(id: i64, text: &str, context_id: &str, task_id: Option<&str>) -> serde_json::Value {
    let mut message = serde_json::json!({
        "messageId": format!("test-msg-{}", id),
        "role": "user",
        "parts": [{"kind": "text", "text": text}],
        "contextId": context_id
    });
    if let Some(tid) = task_id {
        message["taskId"] = serde_json::json!(tid);
    }
    jsonrpc_request(serde_json::json!(id), "message/send", serde_json::json!({ "message": message }))
}
