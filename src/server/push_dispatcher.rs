//! Push notification dispatcher — fans `status-update`/`artifact-update`
//! events out to a task's registered webhooks.
//!
//! No teacher file covers this concern; the delivery loop shape (build a
//! `reqwest::Client`, POST with a per-request timeout, ignore the outcome
//! beyond logging) is grounded on `other_examples`' svix-webhooks
//! `worker.rs`, adapted away from payload signing — agent card signing
//! already covers authenticity for this crate, and webhook auth here is
//! caller-supplied (bearer/api-key/basic) rather than HMAC-signed.

use std::time::Duration;

use base64::Engine;
use reqwest::Client;
use tracing::warn;

use crate::server::event_bus::TaskEventBus;
use crate::server::push_store::PushNotificationStore;
use crate::types::{PushNotificationAuthInfo, StreamEvent};

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Subscribes to a task's event bus and fans status/artifact events out to
/// every webhook registered for that task. Deliveries are fire-and-forget:
/// a failing webhook never affects task execution.
pub struct PushNotificationDispatcher {
    client: Client,
}

impl PushNotificationDispatcher {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("reqwest client configuration is valid"),
        }
    }

    /// Drive delivery for one task's event bus until the bus's subscriber
    /// side closes (the task is deleted) or a terminal event is seen.
    /// Spawned once per task alongside its run.
    pub async fn watch(
        &self,
        task_id: String,
        bus: TaskEventBus,
        push_store: std::sync::Arc<dyn PushNotificationStore>,
    ) {
        let mut subscription = bus.subscribe().await;
        loop {
            let event = match subscription.next().await {
                Some(event) => event,
                None => return,
            };
            // Tokens are streaming-only and are never dispatched via webhooks (§6).
            if matches!(event, StreamEvent::Token { .. }) {
                continue;
            }

            let terminal = event.is_terminal();
            match push_store.list(&task_id).await {
                Ok(configs) => {
                    for config in configs {
                        self.deliver(&config.webhook_url, config.authentication_info.as_ref(), &event)
                            .await;
                    }
                }
                Err(err) => warn!(task_id = %task_id, error = %err, "failed to load webhooks for dispatch"),
            }

            if terminal {
                return;
            }
        }
    }

    async fn deliver(
        &self,
        url: &str,
        auth: Option<&PushNotificationAuthInfo>,
        event: &StreamEvent,
    ) {
        let mut request = self.client.post(url).timeout(DELIVERY_TIMEOUT).json(event);
        if let Some(auth) = auth {
            match auth {
                PushNotificationAuthInfo::ApiKey { key, header_name } => {
                    let header = header_name.as_deref().unwrap_or("X-API-Key");
                    request = request.header(header, key.clone());
                }
                PushNotificationAuthInfo::Bearer { .. } | PushNotificationAuthInfo::Basic { .. } => {
                    request = request.header("Authorization", auth_header_value(auth));
                }
            }
        }

        match request.send().await {
            Ok(resp) if !resp.status().is_success() => {
                warn!(url, status = %resp.status(), "push notification delivery rejected");
            }
            Ok(_) => {}
            Err(err) => {
                warn!(url, error = %err, "push notification delivery failed");
            }
        }
    }
}

impl Default for PushNotificationDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives the `Authorization` header value for `Bearer`/`Basic` auth.
/// `ApiKey` auth uses only its named header instead — see
/// [`PushNotificationDispatcher::deliver`].
fn auth_header_value(auth: &PushNotificationAuthInfo) -> String {
    match auth {
        PushNotificationAuthInfo::Bearer { token } => format!("Bearer {token}"),
        PushNotificationAuthInfo::Basic { username, password } => {
            let raw = format!("{username}:{password}");
            let encoded = base64::engine::general_purpose::STANDARD.encode(raw);
            format!("Basic {encoded}")
        }
        PushNotificationAuthInfo::ApiKey { .. } => {
            unreachable!("deliver() routes ApiKey auth to its named header, not Authorization")
        }
    }
}
