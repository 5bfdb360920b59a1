mod common;
use common::{mock_settings, quiet_logger};

use adsbridge::mcp::server::McpServer;
use adsbridge::services::settings::Settings;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn server_with(settings: Settings) -> McpServer {
    McpServer::new(settings, quiet_logger()).unwrap()
}

async fn call(server: &McpServer, line: Value) -> Value {
    let response = server
        .handle_line(&line.to_string())
        .await
        .expect("request with id must be answered");
    serde_json::to_value(&response).unwrap()
}

#[tokio::test]
async fn initialize_reports_protocol_and_server() {
    let server = server_with(Settings::default());
    let response = call(
        &server,
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
    )
    .await;
    assert_eq!(response["id"], json!(1));
    assert_eq!(response["result"]["protocolVersion"], json!("2025-06-18"));
    assert_eq!(response["result"]["serverInfo"]["name"], json!("adsbridge"));
    assert!(response["result"]["capabilities"]["tools"].is_object());
}

#[tokio::test]
async fn tools_list_exposes_every_tool_with_schema() {
    let server = server_with(Settings::default());
    let response = call(
        &server,
        json!({"jsonrpc": "2.0", "id": "a", "method": "tools/list"}),
    )
    .await;
    let tools = response["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 27);
    for tool in tools {
        assert!(tool["name"].is_string());
        assert_eq!(tool["inputSchema"]["type"], json!("object"));
    }
    assert!(tools.iter().any(|t| t["name"] == json!("generate_ad_image")));
}

#[tokio::test]
async fn protocol_errors_use_json_rpc_codes() {
    let server = server_with(Settings::default());

    let parse = server.handle_line("{not json").await.unwrap();
    assert_eq!(parse.error.unwrap().code, -32700);

    let unknown = call(
        &server,
        json!({"jsonrpc": "2.0", "id": 2, "method": "resources/list"}),
    )
    .await;
    assert_eq!(unknown["error"]["code"], json!(-32601));

    let invalid = server.handle_line(r#"{"jsonrpc":"2.0","id":3}"#).await.unwrap();
    assert_eq!(invalid.id, json!(3));
    assert_eq!(invalid.error.unwrap().code, -32600);

    let bad_method = server
        .handle_line(r#"{"jsonrpc":"2.0","id":"req-9","method":42}"#)
        .await
        .unwrap();
    assert_eq!(bad_method.id, json!("req-9"));
    assert_eq!(bad_method.error.unwrap().code, -32600);
}

#[tokio::test]
async fn null_id_is_answered_not_treated_as_notification() {
    let server = server_with(Settings::default());
    let response = call(
        &server,
        json!({"jsonrpc": "2.0", "id": null, "method": "ping"}),
    )
    .await;
    assert_eq!(response["id"], Value::Null);
    assert_eq!(response["result"], json!({}));
}

#[tokio::test]
async fn notifications_and_blank_lines_get_no_answer() {
    let server = server_with(Settings::default());
    assert!(server
        .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await
        .is_none());
    assert!(server.handle_line("   ").await.is_none());
}

#[tokio::test]
async fn invalid_arguments_are_rejected_before_dispatch() {
    let server = server_with(Settings::default());
    let response = call(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": {"name": "get_campaigns", "arguments": {"limit": 5}}
        }),
    )
    .await;
    assert_eq!(response["error"]["code"], json!(-32602));
    assert!(response["error"]["message"]
        .as_str()
        .unwrap()
        .contains("account_id"));
}

#[tokio::test]
async fn tool_failures_render_as_tool_error_text() {
    let server = server_with(Settings::default());
    let response = call(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 5,
            "method": "tools/call",
            "params": {"name": "get_ad_accounts", "arguments": {}}
        }),
    )
    .await;
    let message = response["error"]["message"].as_str().unwrap();
    assert!(message.starts_with("ToolError\ntool: get_ad_accounts"));
    assert!(message.contains("code: MISSING_CREDENTIALS"));
}

#[tokio::test]
async fn successful_call_returns_envelope_text() {
    let graph = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v21.0/120009"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "120009",
            "name": "Spring",
            "status": "ACTIVE"
        })))
        .mount(&graph)
        .await;

    let server = server_with(mock_settings(&graph.uri()));
    let response = call(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 6,
            "method": "tools/call",
            "params": {
                "name": "get_campaign_details",
                "arguments": {"campaign_id": "120009", "trace_id": "trace-xyz"}
            }
        }),
    )
    .await;
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    let envelope: Value = serde_json::from_str(text).unwrap();
    assert_eq!(envelope["success"], json!(true));
    assert_eq!(envelope["tool"], json!("get_campaign_details"));
    assert_eq!(envelope["result"]["name"], json!("Spring"));
    assert_eq!(envelope["trace"]["trace_id"], json!("trace-xyz"));
}

#[tokio::test]
async fn serve_answers_one_line_per_request() {
    let server = server_with(Settings::default());
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
        "\n"
    );
    let mut output: Vec<u8> = Vec::new();
    server.serve(input.as_bytes(), &mut output).await.unwrap();

    let lines: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["id"], json!(1));
    assert_eq!(lines[0]["result"], json!({}));
    assert_eq!(lines[1]["id"], json!(2));
}
