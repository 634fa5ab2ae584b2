//! A2A error types — JSON-RPC error codes + task-server specific errors.

use crate::types::JsonRpcError;

// ---------------------------------------------------------------------------
// Standard JSON-RPC 2.0 error codes
// ---------------------------------------------------------------------------

/// Invalid JSON was received by the server.
pub const PARSE_ERROR: i64 = -32700;

/// The JSON sent is not a valid Request object.
pub const INVALID_REQUEST: i64 = -32600;

/// The method does not exist / is not available.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Invalid method parameter(s).
pub const INVALID_PARAMS: i64 = -32602;

/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i64 = -32603;

// ---------------------------------------------------------------------------
// A2A-specific error codes
// ---------------------------------------------------------------------------

/// The requested task was not found.
pub const TASK_NOT_FOUND: i64 = -32001;

/// The task cannot be canceled in its current state.
pub const TASK_NOT_CANCELABLE: i64 = -32002;

/// Push notifications are not supported by this agent.
pub const PUSH_NOTIFICATION_NOT_SUPPORTED: i64 = -32003;

/// The requested operation is not supported.
pub const UNSUPPORTED_OPERATION: i64 = -32004;

/// The content type is not supported.
pub const CONTENT_TYPE_NOT_SUPPORTED: i64 = -32005;

/// The agent returned an invalid response.
pub const INVALID_AGENT_RESPONSE: i64 = -32006;

/// The named agent was not found.
pub const AGENT_NOT_FOUND: i64 = -32007;

/// The task is in a terminal state that cannot be continued.
pub const TASK_NOT_CONTINUABLE: i64 = -32008;

/// No push notification config is registered for the task.
pub const PUSH_NOTIFICATION_NOT_CONFIGURED: i64 = -32009;

// ---------------------------------------------------------------------------
// A2aError enum
// ---------------------------------------------------------------------------

/// Unified error type for the task server.
///
/// Each variant carries a human-readable message and an optional structured
/// `data` payload, mirroring the standard A2A error object shape.
#[derive(Debug, Clone, thiserror::Error)]
pub enum A2aError {
    /// Invalid JSON payload (code -32700).
    #[error("Parse error: {message}")]
    ParseError {
        message: String,
        data: Option<serde_json::Value>,
    },

    /// Request payload validation error (code -32600).
    #[error("Invalid request: {message}")]
    InvalidRequest {
        message: String,
        data: Option<serde_json::Value>,
    },

    /// Method not found (code -32601).
    #[error("Method not found: {message}")]
    MethodNotFound {
        message: String,
        data: Option<serde_json::Value>,
    },

    /// Invalid parameters (code -32602).
    #[error("Invalid params: {message}")]
    InvalidParams {
        message: String,
        data: Option<serde_json::Value>,
    },

    /// Internal error (code -32603).
    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        data: Option<serde_json::Value>,
    },

    /// Task not found (code -32001).
    #[error("Task not found: {message}")]
    TaskNotFound {
        message: String,
        data: Option<serde_json::Value>,
    },

    /// Task cannot be canceled (code -32002).
    #[error("Task not cancelable: {message}")]
    TaskNotCancelable {
        message: String,
        data: Option<serde_json::Value>,
    },

    /// Push notifications not supported (code -32003).
    #[error("Push notification not supported: {message}")]
    PushNotificationNotSupported {
        message: String,
        data: Option<serde_json::Value>,
    },

    /// Operation not supported (code -32004).
    #[error("Unsupported operation: {message}")]
    UnsupportedOperation {
        message: String,
        data: Option<serde_json::Value>,
    },

    /// Content type not supported (code -32005).
    #[error("Content type not supported: {message}")]
    ContentTypeNotSupported {
        message: String,
        data: Option<serde_json::Value>,
    },

    /// Invalid agent response (code -32006).
    #[error("Invalid agent response: {message}")]
    InvalidAgentResponse {
        message: String,
        data: Option<serde_json::Value>,
    },

    /// Agent not found (code -32007).
    #[error("Agent not found: {message}")]
    AgentNotFound {
        message: String,
        data: Option<serde_json::Value>,
    },

    /// Task is terminal and cannot be continued (code -32008).
    #[error("Task not continuable: {message}")]
    TaskNotContinuable {
        message: String,
        data: Option<serde_json::Value>,
    },

    /// No push notification config registered for the task (code -32009).
    #[error("Push notification not configured: {message}")]
    PushNotificationNotConfigured {
        message: String,
        data: Option<serde_json::Value>,
    },

    /// Task store or webhook delivery I/O failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// Catch-all for errors that don't fit other categories.
    #[error("{0}")]
    Other(String),
}

/// Convenience result type for task server operations.
pub type A2aResult<T> = Result<T, A2aError>;

impl A2aError {
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            data: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            data: None,
        }
    }

    pub fn method_not_found(message: impl Into<String>) -> Self {
        Self::MethodNotFound {
            message: message.into(),
            data: None,
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
            data: None,
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
            data: None,
        }
    }

    pub fn task_not_found(message: impl Into<String>) -> Self {
        Self::TaskNotFound {
            message: message.into(),
            data: None,
        }
    }

    pub fn task_not_cancelable(message: impl Into<String>) -> Self {
        Self::TaskNotCancelable {
            message: message.into(),
            data: None,
        }
    }

    pub fn push_notification_not_supported(message: impl Into<String>) -> Self {
        Self::PushNotificationNotSupported {
            message: message.into(),
            data: None,
        }
    }

    pub fn unsupported_operation(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            message: message.into(),
            data: None,
        }
    }

    pub fn content_type_not_supported(message: impl Into<String>) -> Self {
        Self::ContentTypeNotSupported {
            message: message.into(),
            data: None,
        }
    }

    pub fn invalid_agent_response(message: impl Into<String>) -> Self {
        Self::InvalidAgentResponse {
            message: message.into(),
            data: None,
        }
    }

    pub fn agent_not_found(message: impl Into<String>) -> Self {
        Self::AgentNotFound {
            message: message.into(),
            data: None,
        }
    }

    pub fn task_not_continuable(message: impl Into<String>) -> Self {
        Self::TaskNotContinuable {
            message: message.into(),
            data: None,
        }
    }

    pub fn push_notification_not_configured(message: impl Into<String>) -> Self {
        Self::PushNotificationNotConfigured {
            message: message.into(),
            data: None,
        }
    }

    /// Returns the JSON-RPC error code for this error variant.
    pub fn code(&self) -> i64 {
        match self {
            A2aError::ParseError { .. } => PARSE_ERROR,
            A2aError::InvalidRequest { .. } => INVALID_REQUEST,
            A2aError::MethodNotFound { .. } => METHOD_NOT_FOUND,
            A2aError::InvalidParams { .. } => INVALID_PARAMS,
            A2aError::InternalError { .. } => INTERNAL_ERROR,
            A2aError::TaskNotFound { .. } => TASK_NOT_FOUND,
            A2aError::TaskNotCancelable { .. } => TASK_NOT_CANCELABLE,
            A2aError::PushNotificationNotSupported { .. } => PUSH_NOTIFICATION_NOT_SUPPORTED,
            A2aError::UnsupportedOperation { .. } => UNSUPPORTED_OPERATION,
            A2aError::ContentTypeNotSupported { .. } => CONTENT_TYPE_NOT_SUPPORTED,
            A2aError::InvalidAgentResponse { .. } => INVALID_AGENT_RESPONSE,
            A2aError::AgentNotFound { .. } => AGENT_NOT_FOUND,
            A2aError::TaskNotContinuable { .. } => TASK_NOT_CONTINUABLE,
            A2aError::PushNotificationNotConfigured { .. } => PUSH_NOTIFICATION_NOT_CONFIGURED,
            A2aError::Io(_) | A2aError::Other(_) => INTERNAL_ERROR,
        }
    }

    /// Returns the default human-readable message for this error variant.
    pub fn default_message(&self) -> &str {
        match self {
            A2aError::ParseError { .. } => "Invalid JSON payload",
            A2aError::InvalidRequest { .. } => "Request payload validation error",
            A2aError::MethodNotFound { .. } => "Method not found",
            A2aError::InvalidParams { .. } => "Invalid parameters",
            A2aError::InternalError { .. } => "Internal error",
            A2aError::TaskNotFound { .. } => "Task not found",
            A2aError::TaskNotCancelable { .. } => "Task cannot be canceled",
            A2aError::PushNotificationNotSupported { .. } => "Push Notification is not supported",
            A2aError::UnsupportedOperation { .. } => "This operation is not supported",
            A2aError::ContentTypeNotSupported { .. } => "Incompatible content types",
            A2aError::InvalidAgentResponse { .. } => "Invalid agent response",
            A2aError::AgentNotFound { .. } => "Agent not found",
            A2aError::TaskNotContinuable { .. } => "Task cannot be continued",
            A2aError::PushNotificationNotConfigured { .. } => {
                "No push notification config registered for task"
            }
            A2aError::Io(_) => "I/O error",
            A2aError::Other(_) => "Error",
        }
    }
}

impl From<A2aError> for JsonRpcError {
    fn from(err: A2aError) -> Self {
        let code = err.code();
        let message = err.to_string();
        let data = match &err {
            A2aError::ParseError { data, .. }
            | A2aError::InvalidRequest { data, .. }
            | A2aError::MethodNotFound { data, .. }
            | A2aError::InvalidParams { data, .. }
            | A2aError::InternalError { data, .. }
            | A2aError::TaskNotFound { data, .. }
            | A2aError::TaskNotCancelable { data, .. }
            | A2aError::PushNotificationNotSupported { data, .. }
            | A2aError::UnsupportedOperation { data, .. }
            | A2aError::ContentTypeNotSupported { data, .. }
            | A2aError::InvalidAgentResponse { data, .. }
            | A2aError::AgentNotFound { data, .. }
            | A2aError::TaskNotContinuable { data, .. }
            | A2aError::PushNotificationNotConfigured { data, .. } => data.clone(),
            _ => None,
        };
        JsonRpcError {
            code,
            message,
            data,
        }
    }
}

impl From<serde_json::Error> for A2aError {
    fn from(err: serde_json::Error) -> Self {
        A2aError::ParseError {
            message: err.to_string(),
            data: None,
        }
    }
}

impl From<std::io::Error> for A2aError {
    fn from(err: std::io::Error) -> Self {
        A2aError::Io(err.to_string())
    }
}
