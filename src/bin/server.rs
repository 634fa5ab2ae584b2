//! A2A server binary — wires [`ServerConfig`] and an echoing [`Runner`] into
//! a listening axum server.
//!
//! Run with:
//! ```sh
//! cargo run --bin server
//! ```
//!
//! Then test with curl:
//! ```sh
//! curl http://localhost:8080/.well-known/agent.json | jq
//!
//! curl -X POST http://localhost:8080/a2a \
//!   -H "Content-Type: application/json" \
//!   -d '{
//!     "jsonrpc": "2.0",
//!     "id": 1,
//!     "method": "message/send",
//!     "params": {
//!       "message": {"messageId": "m1", "role": "user", "parts": [{"kind": "text", "text": "hello"}]}
//!     }
//!   }'
//! ```

use std::sync::Arc;

use a2a_core::builders::AgentCardBuilder;
use a2a_core::config::{ServerConfig, StoreBackend};
use a2a_core::error::A2aResult;
use a2a_core::server::kv_task_store::{KvTaskStore, MemoryKvBackend};
use a2a_core::server::{
    a2a_router, Agent, AgentRegistry, AppState, A2aService, InMemoryTaskStore,
    PushNotificationDispatcher, Runner, TaskManager, TaskStore,
};
use a2a_core::server::push_store::InMemoryPushNotificationStore;
use a2a_core::server::runner::{RunOptions, RunResult};
use async_trait::async_trait;

/// Echoes the triggering message's text back as the task's output.
struct EchoAgent;

#[async_trait]
impl Runner for EchoAgent {
    async fn run(&self, _agent: &Agent, options: RunOptions) -> A2aResult<RunResult> {
        Ok(RunResult {
            output: format!("Echo: {}", options.input),
            ..Default::default()
        })
    }
}

fn build_task_store(config: &ServerConfig) -> A2aResult<Arc<dyn TaskStore>> {
    match config.store_backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryTaskStore::new())),
        StoreBackend::Kv => {
            let backend = Arc::new(MemoryKvBackend::new());
            let store = KvTaskStore::new(backend, Some(config.kv_key_prefix.clone()), config.kv_ttl)?;
            Ok(Arc::new(store))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = ServerConfig::from_env();

    let card = AgentCardBuilder::new(
        "Echo Agent",
        "A simple agent that echoes messages back",
        format!("http://{}/a2a", config.bind_addr),
        "1.0.0",
    )
    .with_streaming(true)
    .with_push_notifications(true)
    .with_skill("echo", "Echo", "Echoes back any text message you send")
    .build();

    let mut agents = AgentRegistry::new();
    agents.register(card, Arc::new(EchoAgent));
    let agents = Arc::new(agents);

    let task_store = build_task_store(&config)?;
    let task_manager = Arc::new(TaskManager::new(task_store));
    let push_store = Arc::new(InMemoryPushNotificationStore::new());
    let dispatcher = Arc::new(PushNotificationDispatcher::new());
    let service = Arc::new(A2aService::new(task_manager, Arc::clone(&agents), push_store, dispatcher));

    let app = a2a_router(AppState {
        service,
        agents,
        signing_secret: config.signing_secret.clone().map(Arc::new),
    });

    tracing::info!(addr = %config.bind_addr, "A2A server listening");
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
