//! Event bus — ordered per-task event fan-out for streaming and push dispatch.
//!
//! Unlike a broadcast channel, delivery here is strictly ordered per
//! subscriber: each subscriber gets its own `mpsc` channel, so a slow
//! subscriber cannot cause another to miss an event, and no subscriber can
//! ever observe `status-update` and `artifact-update` events out of
//! publish order.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::types::StreamEvent;

const SUBSCRIBER_CHANNEL_CAPACITY: usize = 256;

/// Per-task event bus. Cheap to clone — internals are `Arc`-shared.
#[derive(Clone)]
pub struct TaskEventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<StreamEvent>>>>,
}

impl TaskEventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a new subscriber and return its consumer handle. Events
    /// published before this call are not delivered.
    pub async fn subscribe(&self) -> EventSubscription {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        self.subscribers.lock().await.push(tx);
        EventSubscription { rx }
    }

    /// Deliver `event` to every current subscriber, in call order. A
    /// subscriber that has dropped its receiver is pruned on the next
    /// publish rather than treated as an error.
    pub async fn publish(&self, event: StreamEvent) {
        let mut subscribers = self.subscribers.lock().await;
        subscribers.retain(|tx| !tx.is_closed());
        for tx in subscribers.iter() {
            if tx.send(event.clone()).await.is_err() {
                debug!("event bus subscriber dropped mid-send");
            }
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }
}

impl Default for TaskEventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A single subscriber's receive handle.
pub struct EventSubscription {
    rx: mpsc::Receiver<StreamEvent>,
}

impl EventSubscription {
    /// Wait for the next event. Returns `None` once the bus side is gone.
    pub async fn next(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }
}

/// Manages one [`TaskEventBus`] per task id, creating them lazily.
#[derive(Default)]
pub struct EventBusRegistry {
    buses: Mutex<HashMap<String, TaskEventBus>>,
}

impl EventBusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the bus for `task_id`.
    pub async fn get_or_create(&self, task_id: &str) -> TaskEventBus {
        let mut buses = self.buses.lock().await;
        buses.entry(task_id.to_string()).or_insert_with(TaskEventBus::new).clone()
    }

    /// Drop the bus for `task_id`, e.g. once the task reaches a terminal
    /// state and is deleted.
    pub async fn remove(&self, task_id: &str) {
        self.buses.lock().await.remove(task_id);
    }
}
