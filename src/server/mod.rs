//! A2A server — the JSON-RPC service and its collaborators.
//!
//! - [`agent::AgentRegistry`] — named agents, each a `(AgentCard, Runner)` pair
//! - [`runner::Runner`] trait — the seam to an external agent runtime
//! - [`task_store::TaskStore`] trait + in-memory/KV implementations — task persistence
//! - [`event_bus`] — per-task broadcast of `StreamEvent`s to subscribers
//! - [`task_manager::TaskManager`] — the task lifecycle state machine
//! - [`push_store::PushNotificationStore`] trait + in-memory implementation — webhook config
//! - [`push_dispatcher::PushNotificationDispatcher`] — delivers events to registered webhooks
//! - [`request_handler::A2aService`] — composes the above into the ten JSON-RPC operations
//! - [`axum_integration::a2a_router`] — ready-made axum routes for an A2A server
//!
//! # Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use a2a_core::server::*;
//! use a2a_core::builders::AgentCardBuilder;
//!
//! let card = AgentCardBuilder::new("My Agent", "An example agent", "http://localhost:8080", "1.0.0")
//!     .with_streaming(true)
//!     .build();
//!
//! let mut agents = agent::AgentRegistry::new();
//! agents.register(card, Arc::new(MyRunner));
//! let agents = Arc::new(agents);
//!
//! let task_manager = Arc::new(task_manager::TaskManager::new(Arc::new(task_store::InMemoryTaskStore::new())));
//! let push_store = Arc::new(push_store::InMemoryPushNotificationStore::new());
//! let dispatcher = Arc::new(push_dispatcher::PushNotificationDispatcher::new());
//! let service = Arc::new(request_handler::A2aService::new(task_manager, agents.clone(), push_store, dispatcher));
//!
//! let app = axum_integration::a2a_router(axum_integration::AppState {
//!     service,
//!     agents,
//!     signing_secret: None,
//! });
//! ```

pub mod agent;
pub mod axum_integration;
pub mod event_bus;
pub mod kv_task_store;
pub mod push_dispatcher;
pub mod push_store;
pub mod request_handler;
pub mod runner;
pub mod task_manager;
pub mod task_store;

pub use agent::{Agent, AgentRegistry};
pub use axum_integration::{a2a_router, AppState};
pub use event_bus::{EventSubscription, TaskEventBus};
pub use push_dispatcher::PushNotificationDispatcher;
pub use push_store::{InMemoryPushNotificationStore, PushNotificationStore};
pub use request_handler::A2aService;
pub use runner::{RunOptions, RunResult, Runner, TokenSink};
pub use task_manager::TaskManager;
pub use task_store::{InMemoryTaskStore, TaskListFilter, TaskStore};
