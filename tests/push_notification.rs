//! Integration tests for the push-notification config CRUD methods.

mod common;

use common::{jsonrpc_request, message_send_with_context, start_test_server, EchoAgent};
use std::sync::Arc;

async fn create_task(client: &reqwest::Client, base_url: &str) -> String {
    let body = message_send_with_context(1, "hello", "ctx-push", None);
    let resp = client.post(format!("{}/a2a", base_url)).json(&body).send().await.unwrap();
    let json: serde_json::Value = resp.json().await.unwrap();
    json["result"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn create_get_list_and_delete_push_notification_config() {
    let (base_url, _handle) = start_test_server(Arc::new(EchoAgent)).await;
    let client = reqwest::Client::new();
    let task_id = create_task(&client, &base_url).await;

    let create_body = jsonrpc_request(
        serde_json::json!(2),
        "tasks/pushNotification/create",
        serde_json::json!({
            "taskId": task_id,
            "config": { "webhookUrl": "https://example.com/hooks/a2a" }
        }),
    );
    let resp = client.post(format!("{}/a2a", base_url)).json(&create_body).send().await.unwrap();
    let json: serde_json::Value = resp.json().await.unwrap();
    assert!(json["error"].is_null(), "create failed: {:?}", json["error"]);
    let config_id = json["result"]["id"].as_str().unwrap().to_string();

    let get_body = jsonrpc_request(
        serde_json::json!(3),
        "tasks/pushNotification/get",
        serde_json::json!({ "taskId": task_id, "configId": config_id }),
    );
    let resp = client.post(format!("{}/a2a", base_url)).json(&get_body).send().await.unwrap();
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["result"]["webhookUrl"], "https://example.com/hooks/a2a");

    let list_body = jsonrpc_request(
        serde_json::json!(4),
        "tasks/pushNotification/list",
        serde_json::json!({ "taskId": task_id }),
    );
    let resp = client.post(format!("{}/a2a", base_url)).json(&list_body).send().await.unwrap();
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["result"].as_array().unwrap().len(), 1);

    let delete_body = jsonrpc_request(
        serde_json::json!(5),
        "tasks/pushNotification/delete",
        serde_json::json!({ "taskId": task_id, "configId": config_id }),
    );
    let resp = client.post(format!("{}/a2a", base_url)).json(&delete_body).send().await.unwrap();
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["result"]["success"], true);

    let resp = client.post(format!("{}/a2a", base_url)).json(&list_body).send().await.unwrap();
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["result"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn create_push_notification_for_unknown_task_is_task_not_found() {
    let (base_url, _handle) = start_test_server(Arc::new(EchoAgent)).await;
    let client = reqwest::Client::new();

    let create_body = jsonrpc_request(
        serde_json::json!(1),
        "tasks/pushNotification/create",
        serde_json::json!({
            "taskId": "task_missing",
            "config": { "webhookUrl": "https://example.com/hooks/a2a" }
        }),
    );
    let resp = client.post(format!("{}/a2a", base_url)).json(&create_body).send().await.unwrap();
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["error"]["code"], -32001);
}
