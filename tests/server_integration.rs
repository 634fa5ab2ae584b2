//! Integration tests for the A2A server with real HTTP roundtrips.

mod common;

use common::{message_send_request, start_test_server, EchoAgent, FailingAgent};
use std::sync::Arc;

#[tokio::test]
async fn message_send_returns_completed_task() {
    let (base_url, _handle) = start_test_server(Arc::new(EchoAgent)).await;
    let client = reqwest::Client::new();

    let body = message_send_request(1, "Hello, Agent!");
    let resp = client
        .post(format!("{}/a2a", base_url))
        .json(&body)
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["result"]["status"]["state"], "completed");
    assert!(json["result"]["artifacts"][0]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .contains("Hello, Agent!"));
}

#[tokio::test]
async fn message_send_with_failing_agent_returns_failed_task() {
    let (base_url, _handle) = start_test_server(Arc::new(FailingAgent)).await;
    let client = reqwest::Client::new();

    let body = message_send_request(1, "anything");
    let resp = client.post(format!("{}/a2a", base_url)).json(&body).send().await.unwrap();

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["result"]["status"]["state"], "failed");
}

#[tokio::test]
async fn missing_content_type_is_rejected() {
    let (base_url, _handle) = start_test_server(Arc::new(EchoAgent)).await;
    let client = reqwest::Client::new();

    let body = message_send_request(1, "hi");
    let resp = client
        .post(format!("{}/a2a", base_url))
        .header("content-type", "text/plain")
        .body(serde_json::to_string(&body).unwrap())
        .send()
        .await
        .unwrap();

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["error"]["code"], -32005);
}

#[tokio::test]
async fn batch_requests_are_rejected() {
    let (base_url, _handle) = start_test_server(Arc::new(EchoAgent)).await;
    let client = reqwest::Client::new();

    let batch = serde_json::json!([message_send_request(1, "a"), message_send_request(2, "b")]);
    let resp = client.post(format!("{}/a2a", base_url)).json(&batch).send().await.unwrap();

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["error"]["code"], -32600);
}

#[tokio::test]
async fn unknown_method_returns_method_not_found() {
    let (base_url, _handle) = start_test_server(Arc::new(EchoAgent)).await;
    let client = reqwest::Client::new();

    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "nonexistent/method",
        "params": {}
    });
    let resp = client.post(format!("{}/a2a", base_url)).json(&body).send().await.unwrap();
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["error"]["code"], -32601);
}
