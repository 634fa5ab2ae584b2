//! Axum HTTP surface: `POST /a2a` JSON-RPC dispatch and the well-known
//! agent-card route.
//!
//! Grounded on the teacher's `axum_integration.rs` for the router shape and
//! its `async_stream::stream!{}`-driven SSE body, restructured around
//! spec.md §4.4's ten-method table (dropping the teacher's
//! `tasks/subscribe`/`tasks/resubscribe`/`pushNotificationConfig/*`/
//! `agent/authenticatedExtendedCard` naming) and §6's literal SSE framing
//! (`data: <json>\n\n`, terminated by `data: [DONE]\n\n`) in place of the
//! teacher's named-event framing.

use std::sync::Arc;

use async_stream::stream;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::error::A2aError;
use crate::server::agent::AgentRegistry;
use crate::server::request_handler::A2aService;
use crate::signing::sign_card;
use crate::types::{
    AgentCard, CancelTaskParams, CreatePushNotificationParams, DeletePushNotificationParams,
    GetExtendedCardParams, GetPushNotificationParams, GetTaskParams, JsonRpcRequest,
    JsonRpcResponse, ListPushNotificationParams, ListTasksParams, Message, SendMessageParams,
    StreamEvent, TaskState, TaskStatus,
};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<A2aService>,
    pub agents: Arc<AgentRegistry>,
    pub signing_secret: Option<Arc<Vec<u8>>>,
}

/// Builds the A2A axum router: `GET /.well-known/agent.json` and `POST /a2a`,
/// with a permissive CORS layer (the teacher's `ServerBuilder` applies the
/// same `CorsLayer::permissive()` — this crate's agent cards are meant to be
/// fetched from arbitrary origins, not just same-site callers).
pub fn a2a_router(state: AppState) -> Router {
    Router::new()
        .route("/.well-known/agent.json", get(well_known_agent_card))
        .route("/a2a", post(handle_jsonrpc))
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(state)
}

/// Single card, or an array when more than one agent is registered.
async fn well_known_agent_card(State(state): State<AppState>) -> Json<serde_json::Value> {
    let mut cards: Vec<AgentCard> = state.agents.cards().into_iter().cloned().collect();
    if let Some(ref secret) = state.signing_secret {
        for card in &mut cards {
            if let Err(err) = sign_card(card, secret) {
                warn!(error = %err, "failed to sign agent card");
            }
        }
    }

    if cards.len() == 1 {
        Json(serde_json::to_value(&cards[0]).unwrap_or(serde_json::Value::Null))
    } else {
        Json(serde_json::to_value(&cards).unwrap_or(serde_json::Value::Null))
    }
}

fn accept_wants_sse(headers: &HeaderMap) -> bool {
    headers
        .get(axum::http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/event-stream"))
        .unwrap_or(false)
}

/// Reports a protocol-level failure (one the server could not even attempt
/// to process) on whichever transport the caller asked for: a plain
/// JSON-RPC error envelope, or — per spec.md §7 — a synthetic
/// `status-update(failed, taskId="")` SSE frame followed by `[DONE]` when
/// the caller's `Accept` header (or a `message/stream` method, once known)
/// named `text/event-stream`.
fn protocol_error_response(wants_sse: bool, id: Option<crate::types::JsonRpcId>, err: A2aError) -> Response {
    if wants_sse {
        sse_error_response(err)
    } else {
        Json(JsonRpcResponse::from_a2a_error(id, err)).into_response()
    }
}

/// `POST /a2a`. Content-Type must be `application/json` (else -32005).
/// Batch arrays are rejected with `invalid-request`. When the request's
/// method is `message/stream`, or `Accept` names `text/event-stream`, the
/// response is framed as SSE; otherwise a single JSON-RPC response body.
async fn handle_jsonrpc(State(state): State<AppState>, headers: HeaderMap, body: axum::body::Bytes) -> Response {
    let sse_requested = accept_wants_sse(&headers);

    let content_type_ok = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false);
    if !content_type_ok {
        let err = A2aError::content_type_not_supported("Content-Type must be application/json");
        return protocol_error_response(sse_requested, None, err);
    }

    let value: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            let err = A2aError::parse_error(e.to_string());
            return protocol_error_response(sse_requested, None, err);
        }
    };

    if value.is_array() {
        let err = A2aError::invalid_request("batch requests are not supported");
        return protocol_error_response(sse_requested, None, err);
    }

    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(e) => {
            let err = A2aError::invalid_request(e.to_string());
            return protocol_error_response(sse_requested, None, err);
        }
    };

    let wants_sse = request.method == "message/stream" || sse_requested;

    if wants_sse {
        dispatch_stream(state, request).await
    } else {
        let response = dispatch_unary(&state, request).await;
        Json(response).into_response()
    }
}

fn params_or_invalid<T: serde::de::DeserializeOwned>(
    params: Option<serde_json::Value>,
) -> Result<T, A2aError> {
    let value = params.ok_or_else(|| A2aError::invalid_params("missing required params"))?;
    serde_json::from_value(value).map_err(|e| A2aError::invalid_params(e.to_string()))
}

fn params_or_default<T: serde::de::DeserializeOwned + Default>(
    params: Option<serde_json::Value>,
) -> Result<T, A2aError> {
    match params {
        Some(value) => serde_json::from_value(value).map_err(|e| A2aError::invalid_params(e.to_string())),
        None => Ok(T::default()),
    }
}

async fn dispatch_unary(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    let id = request.id.clone();
    match run_unary_method(state, &request).await {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(err) => JsonRpcResponse::from_a2a_error(id, err),
    }
}

async fn run_unary_method(
    state: &AppState,
    request: &JsonRpcRequest,
) -> Result<serde_json::Value, A2aError> {
    let service = &state.service;
    match request.method.as_str() {
        "message/send" => {
            let params: SendMessageParams = params_or_invalid(request.params.clone())?;
            let task = service.message_send(params).await?;
            Ok(serde_json::to_value(task).expect("Task always serializes"))
        }
        "tasks/get" => {
            let params: GetTaskParams = params_or_invalid(request.params.clone())?;
            let task = service.get_task(params).await?;
            Ok(serde_json::to_value(task).expect("Task always serializes"))
        }
        "tasks/cancel" => {
            let params: CancelTaskParams = params_or_invalid(request.params.clone())?;
            let task = service.cancel_task(params).await?;
            Ok(serde_json::to_value(task).expect("Task always serializes"))
        }
        "tasks/list" => {
            let params: ListTasksParams = params_or_default(request.params.clone())?;
            let result = service.list_tasks(params).await?;
            Ok(serde_json::to_value(result).expect("ListTasksResult always serializes"))
        }
        "tasks/pushNotification/create" => {
            let params: CreatePushNotificationParams = params_or_invalid(request.params.clone())?;
            let config = service.create_push_notification(params).await?;
            Ok(serde_json::to_value(config).expect("PushNotificationConfig always serializes"))
        }
        "tasks/pushNotification/get" => {
            let params: GetPushNotificationParams = params_or_invalid(request.params.clone())?;
            let config = service.get_push_notification(params).await?;
            Ok(serde_json::to_value(config).expect("Option<PushNotificationConfig> always serializes"))
        }
        "tasks/pushNotification/list" => {
            let params: ListPushNotificationParams = params_or_invalid(request.params.clone())?;
            let configs = service.list_push_notification(params).await?;
            Ok(serde_json::to_value(configs).expect("Vec<PushNotificationConfig> always serializes"))
        }
        "tasks/pushNotification/delete" => {
            let params: DeletePushNotificationParams = params_or_invalid(request.params.clone())?;
            service.delete_push_notification(params).await?;
            Ok(serde_json::json!({ "success": true }))
        }
        "agent/extendedCard" => {
            let params: GetExtendedCardParams = params_or_default(request.params.clone())?;
            let mut card = service.extended_card(params).await?;
            if let Some(ref secret) = state.signing_secret {
                let _ = sign_card(&mut card, secret);
            }
            Ok(serde_json::to_value(card).expect("AgentCard always serializes"))
        }
        "message/stream" => Err(A2aError::unsupported_operation(
            "message/stream requires Accept: text/event-stream",
        )),
        other => Err(A2aError::method_not_found(format!("unknown method: {other}"))),
    }
}

/// Streaming entrypoint. Only `message/stream` actually streams — any other
/// method arriving under an `Accept: text/event-stream` request still gets
/// a plain JSON-RPC response, since the SSE wrapper is a transport choice
/// on top of the same ten methods, not a second method surface.
async fn dispatch_stream(state: AppState, request: JsonRpcRequest) -> Response {
    if request.method != "message/stream" {
        let response = dispatch_unary(&state, request).await;
        return Json(response).into_response();
    }

    let params: SendMessageParams = match params_or_invalid(request.params.clone()) {
        Ok(p) => p,
        Err(err) => return sse_error_response(err),
    };

    let mut events = match state.service.message_stream(params).await {
        Ok(rx) => rx,
        Err(err) => return sse_error_response(err),
    };

    let body = stream! {
        while let Some(event) = events.recv().await {
            let terminal = event.is_terminal();
            match serde_json::to_string(&event) {
                Ok(json) => yield Ok::<_, std::convert::Infallible>(Event::default().data(json)),
                Err(e) => warn!(error = %e, "failed to serialize stream event"),
            }
            if terminal {
                break;
            }
        }
        yield Ok(Event::default().data("[DONE]"));
    };

    Sse::new(body).keep_alive(KeepAlive::default()).into_response()
}

/// A protocol failure surfaced on the SSE transport: one synthetic
/// `status-update(failed, taskId="")` frame, then `[DONE]`. Per spec.md §7
/// this never carries a JSON-RPC error envelope — the caller already
/// committed to SSE framing by the time the failure is known.
fn sse_error_response(err: A2aError) -> Response {
    let timestamp = Utc::now().to_rfc3339();
    let mut status = TaskStatus::new(TaskState::Failed);
    status.timestamp = Some(timestamp.clone());
    status.message = Some(Message::agent_text(format!("msg_{}", Uuid::new_v4()), err.to_string()));

    let event = StreamEvent::StatusUpdate {
        task_id: String::new(),
        status,
        timestamp,
    };

    let body = stream! {
        match serde_json::to_string(&event) {
            Ok(json) => yield Ok::<_, std::convert::Infallible>(Event::default().data(json)),
            Err(e) => warn!(error = %e, "failed to serialize synthetic failure event"),
        }
        yield Ok(Event::default().data("[DONE]"));
    };

    Sse::new(body).keep_alive(KeepAlive::default()).into_response()
}
