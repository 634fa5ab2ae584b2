//! Server configuration — bind address, store backend, and ambient settings.
//!
//! Loaded from environment variables with `A2A_` prefixes, the way the
//! teacher's binary reads its own runtime knobs from the environment
//! rather than a config file. Every field has a sane default so the
//! server runs out of the box with no environment set.

use std::env;
use std::time::Duration;

/// Which `TaskStore` backend to construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// `InMemoryTaskStore` — process-local `HashMap`.
    Memory,
    /// `KvTaskStore` over the in-process `MemoryKvBackend`. Stands in for a
    /// real external cache (Redis, etc.) — swap the backend, not this enum,
    /// to point at one.
    Kv,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP server binds to, e.g. `0.0.0.0:8080`.
    pub bind_addr: String,
    pub store_backend: StoreBackend,
    /// Key prefix used by the KV store backend.
    pub kv_key_prefix: String,
    /// Entry TTL for the KV store backend. `None` disables expiry.
    pub kv_ttl: Option<Duration>,
    /// Per-delivery timeout for push notification webhooks.
    pub webhook_timeout: Duration,
    /// HMAC secret used to sign agent cards. Cards are served unsigned when absent.
    pub signing_secret: Option<Vec<u8>>,
}

impl ServerConfig {
    /// Loads configuration from the environment, falling back to defaults
    /// for anything unset.
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_or("A2A_BIND_ADDR", "0.0.0.0:8080"),
            store_backend: match env::var("A2A_STORE_BACKEND").as_deref() {
                Ok("kv") => StoreBackend::Kv,
                _ => StoreBackend::Memory,
            },
            kv_key_prefix: env_or("A2A_KV_PREFIX", "a2a:task:"),
            kv_ttl: env::var("A2A_KV_TTL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs),
            webhook_timeout: env::var("A2A_WEBHOOK_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(10)),
            signing_secret: env::var("A2A_SIGNING_SECRET").ok().map(|s| s.into_bytes()),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            store_backend: StoreBackend::Memory,
            kv_key_prefix: "a2a:task:".to_string(),
            kv_ttl: None,
            webhook_timeout: Duration::from_secs(10),
            signing_secret: None,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
