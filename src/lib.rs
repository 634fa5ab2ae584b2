//! # a2a-core — a JSON-RPC 2.0 server for the Agent-to-Agent (A2A) protocol
//!
//! This crate implements the server side of the A2A protocol: agents
//! exchange messages over JSON-RPC 2.0, with task progress streamed back via
//! Server-Sent Events when the caller asks for it.
//!
//! ## Overview
//!
//! - Messages create or continue a [`types::Task`], which moves through a
//!   six-state lifecycle (`working`, `input-required`, `completed`,
//!   `failed`, `canceled`, `rejected`).
//! - `message/stream` emits `status-update`/`artifact-update`/`token` events
//!   as the task runs, terminating after the first terminal status update.
//! - Webhooks registered via `tasks/pushNotification/*` receive the same
//!   status/artifact events (never `token` events) as they're published.
//! - Agent cards can be signed with an HMAC secret so callers can verify
//!   they came from this server ([`signing`]).
//!
//! ## Feature flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | yes     | Task/agent server, JSON-RPC dispatch, axum integration |
//!
//! ## Quick start
//!
//! Implement [`server::Runner`] to define what happens when a task runs:
//!
//! ```rust,ignore
//! use a2a_core::server::{Agent, RunOptions, RunResult, Runner};
//! use a2a_core::error::A2aResult;
//! use async_trait::async_trait;
//!
//! struct EchoAgent;
//!
//! #[async_trait]
//! impl Runner for EchoAgent {
//!     async fn run(&self, _agent: &Agent, options: RunOptions) -> A2aResult<RunResult> {
//!         Ok(RunResult {
//!             output: format!("Echo: {}", options.input),
//!             ..Default::default()
//!         })
//!     }
//! }
//! ```
//!
//! Then wire up the HTTP server:
//!
//! ```rust,ignore
//! use a2a_core::builders::AgentCardBuilder;
//! use a2a_core::server::{a2a_router, AgentRegistry, AppState, A2aService, InMemoryPushNotificationStore, PushNotificationDispatcher, TaskManager, InMemoryTaskStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let card = AgentCardBuilder::new("Echo Agent", "Echoes messages back", "http://localhost:8080", "1.0.0")
//!         .with_streaming(true)
//!         .build();
//!
//!     let mut agents = AgentRegistry::new();
//!     agents.register(card, Arc::new(EchoAgent));
//!     let agents = Arc::new(agents);
//!
//!     let task_manager = Arc::new(TaskManager::new(Arc::new(InMemoryTaskStore::new())));
//!     let push_store = Arc::new(InMemoryPushNotificationStore::new());
//!     let dispatcher = Arc::new(PushNotificationDispatcher::new());
//!     let service = Arc::new(A2aService::new(task_manager, Arc::clone(&agents), push_store, dispatcher));
//!
//!     let app = a2a_router(AppState { service, agents, signing_secret: None });
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! The server provides:
//! - `POST /a2a` — JSON-RPC 2.0 endpoint for all ten A2A methods
//! - `GET /.well-known/agent.json` — agent card discovery
//!
//! ## Supported JSON-RPC methods
//!
//! - `message/send` / `message/stream` — run a task, blocking or streamed
//! - `tasks/get` / `tasks/list` / `tasks/cancel` — task lifecycle queries
//! - `tasks/pushNotification/create` / `get` / `list` / `delete` — webhook config
//! - `agent/extendedCard` — the full agent card for a named agent
//!
//! ## Architecture
//!
//! - [`server::Runner`] — the seam to an external agent runtime
//! - [`server::AgentRegistry`] — maps agent names to `(AgentCard, Runner)` pairs
//! - [`server::TaskStore`] / [`server::InMemoryTaskStore`] — task persistence
//! - [`server::TaskManager`] — the task lifecycle state machine
//! - [`server::PushNotificationStore`] / [`server::PushNotificationDispatcher`] — webhook config + delivery
//! - [`server::A2aService`] — composes the above into the JSON-RPC operations
//! - [`server::a2a_router`] — the axum `Router`
//! - [`signing`] — HMAC-SHA-256 agent card signing and verification
//! - [`types::Task`] / [`types::Message`] / [`types::StreamEvent`] — the wire types
//! - [`error::A2aError`] — error types with JSON-RPC error codes

pub mod builders;
pub mod config;
pub mod error;
pub mod signing;
pub mod types;

#[cfg(feature = "server")]
pub mod server;

/// Re-exports the most commonly used types and traits.
///
/// ```
/// use a2a_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::types::{
        AgentCapabilities, AgentCard, AgentSkill, Artifact, Message, Part, Role, SendMessageParams,
        StreamEvent, Task, TaskState, TaskStatus,
    };

    pub use crate::error::{A2aError, A2aResult};

    pub use crate::builders::AgentCardBuilder;
    pub use crate::config::ServerConfig;

    #[cfg(feature = "server")]
    pub use crate::server::{
        a2a_router, Agent, AgentRegistry, AppState, A2aService, InMemoryTaskStore, Runner,
        TaskManager, TaskStore,
    };
}

pub use builders::AgentCardBuilder;
pub use config::ServerConfig;
pub use error::{A2aError, A2aResult};
pub use types::*;
