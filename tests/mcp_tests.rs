mod common;

use std::sync::Arc;

use rmcp::model::{CallToolRequestParam, CallToolResult};
use rmcp::service::RunningService;
use rmcp::{RoleClient, ServiceExt};
use serde_json::{json, Value};

use common::{MockGenerator, MockPlatform};
use mcp_servicenow::dispatch::Dispatcher;
use mcp_servicenow::mcp::ServiceNowServer;
use mcp_servicenow::tools::ToolKind;

/// An in-process server on a duplex transport plus a connected client.
struct Harness {
    client: RunningService<RoleClient, ()>,
    platform: MockPlatform,
    _server: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl Harness {
    async fn new(platform: MockPlatform, generator: Option<MockGenerator>) -> Self {
        let server = ServiceNowServer::new(Arc::new(Dispatcher::new(platform.clone(), generator)));
        let (server_transport, client_transport) = tokio::io::duplex(65536);

        let handle = tokio::spawn(async move {
            server.serve(server_transport).await?.waiting().await?;
            anyhow::Ok(())
        });

        let client = ().serve(client_transport).await.expect("client setup failed");

        Self {
            client,
            platform,
            _server: handle,
        }
    }

    async fn call(&self, name: &str, args: Value) -> CallToolResult {
        self.client
            .call_tool(CallToolRequestParam {
                name: name.to_string().into(),
                arguments: args.as_object().cloned(),
            })
            .await
            .expect("call_tool failed")
    }

    async fn shutdown(self) {
        self.client.cancel().await.unwrap();
    }
}

fn text_at(result: &CallToolResult, index: usize) -> String {
    result
        .content
        .get(index)
        .and_then(|c| c.raw.as_text())
        .map(|t| t.text.clone())
        .unwrap_or_default()
}

fn json_at(result: &CallToolResult, index: usize) -> Value {
    serde_json::from_str(&text_at(result, index)).unwrap()
}

#[tokio::test]
async fn test_lists_all_tools_with_schemas() {
    let h = Harness::new(MockPlatform::new(), None).await;
    let tools = h.client.list_tools(None).await.unwrap().tools;

    let mut names: Vec<String> = tools.iter().map(|t| t.name.to_string()).collect();
    names.sort();
    let mut expected: Vec<String> = ToolKind::ALL.iter().map(|k| k.name().to_string()).collect();
    expected.sort();
    assert_eq!(names, expected);

    let incident = tools.iter().find(|t| t.name == "create_incident").unwrap();
    let schema = Value::Object((*incident.input_schema).clone());
    assert!(schema["properties"]["short_description"].is_object());
    assert_eq!(schema["required"], json!(["short_description"]));

    h.shutdown().await;
}

#[tokio::test]
async fn test_successful_call_returns_summary_and_record() {
    let h = Harness::new(MockPlatform::new(), None).await;
    let result = h
        .call(
            "create_incident",
            json!({ "short_description": "DB down", "priority": "1 - Critical" }),
        )
        .await;

    assert_ne!(result.is_error, Some(true));
    assert_eq!(
        text_at(&result, 0),
        "Incident created successfully: INC0000001 (sys_id: sys1)"
    );
    assert_eq!(json_at(&result, 1)["category"], "inquiry");
    assert_eq!(h.platform.calls().len(), 1);

    h.shutdown().await;
}

#[tokio::test]
async fn test_failures_are_tool_errors_with_payload() {
    let h = Harness::new(MockPlatform::new(), None).await;

    let result = h.call("get_incident", json!({ "number": "INC404" })).await;
    assert_eq!(result.is_error, Some(true));
    assert!(text_at(&result, 0).starts_with("Error: "));
    let payload = json_at(&result, 1);
    assert_eq!(payload["error"]["kind"], "NotFoundError");
    assert_eq!(payload["error"]["stage"], "submission");

    let result = h.call("smart_incident", json!({ "unstructured_text": "x" })).await;
    assert_eq!(result.is_error, Some(true));
    assert_eq!(json_at(&result, 1)["error"]["kind"], "ExtractionError");

    h.shutdown().await;
}

#[tokio::test]
async fn test_bad_requests_are_reported_as_tool_errors() {
    let h = Harness::new(MockPlatform::new(), None).await;

    let result = h.call("drop_tables", json!({})).await;
    assert_eq!(result.is_error, Some(true));
    assert_eq!(json_at(&result, 1)["error"]["kind"], "UnsupportedTool");

    let result = h.call("create_incident", json!({ "priority": "1" })).await;
    assert_eq!(result.is_error, Some(true));
    let payload = json_at(&result, 1);
    assert_eq!(payload["error"]["kind"], "InvalidArguments");
    assert_eq!(payload["error"]["stage"], "validation");

    assert!(h.platform.calls().is_empty());
    h.shutdown().await;
}

#[tokio::test]
async fn test_smart_incident_over_mcp() {
    let generator = MockGenerator::replying(r#"{"short_description": "Printer jam", "category": "hardware"}"#);
    let h = Harness::new(MockPlatform::new(), Some(generator)).await;

    let result = h
        .call("smart_incident", json!({ "unstructured_text": "printer jammed again" }))
        .await;

    assert_ne!(result.is_error, Some(true));
    assert!(text_at(&result, 0).starts_with("Smart Incident created: INC0000001"));
    let calls = h.platform.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].fields().unwrap()["category"], "hardware");

    h.shutdown().await;
}
