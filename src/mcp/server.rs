//! MCP stdio server implementation

use super::tools::{get_tool_definitions, handle_tool_call};
use super::types::{ErrorCode, McpError, McpMessage, McpNotification, McpRequest, McpResponse};
use crate::audit::AuditService;
use serde_json::{json, Map, Value};
use std::io::{self, BufRead, Write};
use tracing::{debug, error, info, warn};

/// MCP Server implementation
pub struct McpServer {
    service: AuditService,
}

impl McpServer {
    pub fn new(service: AuditService) -> Self {
        Self { service }
    }

    /// Run the MCP server loop over stdio
    pub async fn run(&self) -> Result<(), McpError> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), stdout.lock()).await
    }

    /// Serve newline-delimited JSON-RPC from `input`, writing replies to `output`
    pub async fn serve<R: BufRead, W: Write>(&self, input: R, mut output: W) -> Result<(), McpError> {
        info!("MCP server starting");

        for line in input.lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    error!("Failed to read line: {}", e);
                    continue;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            debug!("Received: {}", line);

            let message: McpMessage = match serde_json::from_str(&line) {
                Ok(m) => m,
                Err(e) => {
                    error!("Failed to parse message: {}", e);
                    let response =
                        McpResponse::error(None, ErrorCode::ParseError, format!("Parse error: {}", e));
                    writeln!(output, "{}", serde_json::to_string(&response)?)?;
                    output.flush()?;
                    continue;
                }
            };

            match message {
                McpMessage::Request(req) => {
                    let response = self.handle_request(req).await;
                    let response_str = serde_json::to_string(&response)?;
                    debug!("Sending: {}", response_str);
                    writeln!(output, "{}", response_str)?;
                    output.flush()?;
                }
                McpMessage::Notification(notif) => self.handle_notification(&notif),
                McpMessage::Response(_) => {
                    warn!("Unexpected response message received");
                }
            }
        }

        info!("MCP server shutting down");
        Ok(())
    }

    async fn handle_request(&self, request: McpRequest) -> McpResponse {
        let id = request.id.clone();

        match request.method.as_str() {
            "initialize" => Self::handle_initialize(id),
            "tools/list" => McpResponse::success(id, json!({ "tools": get_tool_definitions() })),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            "resources/list" => McpResponse::success(id, json!({ "resources": [] })),
            "prompts/list" => McpResponse::success(id, json!({ "prompts": [] })),
            "ping" => McpResponse::success(id, json!({})),
            _ => McpResponse::error(
                id,
                ErrorCode::MethodNotFound,
                format!("Method not found: {}", request.method),
            ),
        }
    }

    fn handle_notification(&self, notification: &McpNotification) {
        match notification.method.as_str() {
            "notifications/initialized" => info!("Client initialized"),
            "notifications/cancelled" => info!("Request cancelled"),
            _ => debug!("Unknown notification: {}", notification.method),
        }
    }

    fn handle_initialize(id: Option<Value>) -> McpResponse {
        McpResponse::success(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": { "listChanged": false },
                    "resources": { "subscribe": false, "listChanged": false },
                    "prompts": { "listChanged": false }
                },
                "serverInfo": {
                    "name": "sitescore",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> McpResponse {
        let Some(params) = params else {
            return McpResponse::error(id, ErrorCode::InvalidParams, "Missing params");
        };

        let Some(name) = params.get("name").and_then(|v| v.as_str()) else {
            return McpResponse::error(id, ErrorCode::InvalidParams, "Missing tool name");
        };

        let arguments: Map<String, Value> = params
            .get("arguments")
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default();

        debug!("Calling tool: {} with args: {:?}", name, arguments);

        let result = handle_tool_call(name, &arguments, &self.service).await;
        McpResponse::success(
            id,
            json!({
                "content": result.content,
                "isError": result.is_error.unwrap_or(false)
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Adapters;
    use crate::audit::BasicAuditor;
    use crate::config::FetchConfig;
    use crate::models::{Company, Strategy};
    use crate::store::AuditDb;
    use tempfile::TempDir;

    async fn server() -> (McpServer, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = AuditDb::open(&tmp.path().join("mcp.db")).await.unwrap();
        store
            .insert_company(&Company::new("Acme", "https://acme.example", None).unwrap())
            .await
            .unwrap();
        let basic = BasicAuditor::new(&FetchConfig::default()).unwrap();
        let service = AuditService::new(store, Adapters::default(), basic, Strategy::Mobile);
        (McpServer::new(service), tmp)
    }

    async fn exchange(server: &McpServer, input: &str) -> Vec<Value> {
        let mut output = Vec::new();
        server.serve(input.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_initialize_and_list_tools() {
        let (server, _tmp) = server().await;
        let replies = exchange(
            &server,
            concat!(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
                "\n",
                r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
                "\n",
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
                "\n"
            ),
        )
        .await;

        // notifications get no reply
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["result"]["serverInfo"]["name"], "sitescore");
        let names: Vec<&str> = replies[1]["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|t| t["name"].as_str())
            .collect();
        assert_eq!(
            names,
            vec!["seo_audit", "seo_comprehensive_audit", "seo_audit_history", "seo_companies"]
        );
    }

    #[tokio::test]
    async fn test_parse_error_and_unknown_method() {
        let (server, _tmp) = server().await;
        let replies = exchange(
            &server,
            "not json\n{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"bogus\"}\n",
        )
        .await;
        assert_eq!(replies[0]["error"]["code"], -32700);
        assert_eq!(replies[1]["error"]["code"], -32601);
        assert_eq!(replies[1]["id"], 7);
    }

    #[tokio::test]
    async fn test_companies_tool() {
        let (server, _tmp) = server().await;
        let replies = exchange(
            &server,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"seo_companies"}}"#,
        )
        .await;
        let text = replies[0]["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Acme"));
        assert_eq!(replies[0]["result"]["isError"], false);
    }
}
