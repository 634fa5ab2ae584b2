//! Runner — the single seam through which this crate calls out to an
//! LLM/agent runtime.
//!
//! The Runner is an external collaborator: this crate never knows what it
//! does internally, only that it can be asked to run and that it will
//! eventually produce a [`RunResult`] or an error.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::A2aResult;
use crate::server::agent::Agent;

/// A single token emitted mid-run. Wired to `onToken` in spec terms.
pub type TokenSink = std::sync::Arc<dyn Fn(&str) + Send + Sync>;

/// Input to a single `Runner::run` invocation.
pub struct RunOptions {
    /// Newline-joined concatenation of the triggering message's text parts.
    pub input: String,
    /// Fires when `tasks/cancel` is called against the owning task.
    pub cancel: CancellationToken,
    /// `true` when a token sink is attached — signals the runner that
    /// streaming output is wanted, if it's capable of it.
    pub stream: bool,
    /// Called once per emitted token when `stream` is `true`.
    pub on_token: Option<TokenSink>,
}

/// Token accounting reported back by the runner, if it tracks one.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
}

/// A tool invocation the runner made while producing its result.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    pub name: String,
    pub arguments: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

/// The outcome of a `Runner::run` invocation.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub output: String,
    pub structured: Option<serde_json::Value>,
    pub usage: Option<Usage>,
    pub tool_calls: Vec<ToolCall>,
}

/// Raised by a runner to signal that it stopped because its cancel token
/// fired, rather than because it failed. The Task Manager classifies this
/// outcome as `canceled`, never `failed`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("runner invocation was canceled")]
pub struct RunnerCanceled;

/// Narrow single-method contract for the underlying agent runtime.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, agent: &Agent, options: RunOptions) -> A2aResult<RunResult>;
}

impl std::fmt::Debug for dyn Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Runner")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AgentCard;

    struct EchoRunner;

    #[async_trait]
    impl Runner for EchoRunner {
        async fn run(&self, _agent: &Agent, options: RunOptions) -> A2aResult<RunResult> {
            if options.cancel.is_cancelled() {
                return Err(crate::error::A2aError::internal_error("canceled"));
            }
            Ok(RunResult {
                output: options.input,
                ..Default::default()
            })
        }
    }

    fn test_agent() -> Agent {
        Agent {
            name: "echo".to_string(),
            card: AgentCard {
                name: "echo".to_string(),
                description: "echoes input".to_string(),
                url: "http://localhost".to_string(),
                version: "0.1.0".to_string(),
                capabilities: Default::default(),
                skills: vec![],
                default_input_modes: vec!["text".to_string()],
                default_output_modes: vec!["text".to_string()],
                provider: None,
                security_schemes: None,
                signature: None,
            },
        }
    }

    #[tokio::test]
    async fn runner_echoes_input() {
        let runner = EchoRunner;
        let options = RunOptions {
            input: "hello".to_string(),
            cancel: CancellationToken::new(),
            stream: false,
            on_token: None,
        };
        let result = runner.run(&test_agent(), options).await.unwrap();
        assert_eq!(result.output, "hello");
    }

    #[tokio::test]
    async fn cancel_token_observed_by_runner() {
        let runner = EchoRunner;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let options = RunOptions {
            input: "hello".to_string(),
            cancel,
            stream: false,
            on_token: None,
        };
        assert!(runner.run(&test_agent(), options).await.is_err());
    }
}
