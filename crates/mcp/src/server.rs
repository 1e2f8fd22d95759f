//! MCP server: holds the registered tools and answers JSON-RPC requests.
//!
//! Transports feed raw messages into [`McpServer::handle_message`] and write
//! back whatever it returns. The server is immutable once registration is
//! done, so transports share it behind an `Arc`.

use crate::error::{Error, Result};
use crate::protocol::{
    CallToolParams, InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, ServerCapabilities, ServerInfo, ToolsCapability, PROTOCOL_VERSION,
};
use crate::tools::ServerTool;
use serde_json::Value;
use std::collections::HashMap;

/// Server name advertised during `initialize`
pub const SERVER_NAME: &str = "kubernetes-mcp-server";

pub struct McpServer {
    info: ServerInfo,
    tools: Vec<ServerTool>,
    index: HashMap<String, usize>,
}

impl McpServer {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool. Tool names must be unique.
    pub fn register(&mut self, tool: ServerTool) -> Result<()> {
        if self.index.contains_key(tool.name()) {
            return Err(Error::DuplicateTool(tool.name().to_string()));
        }

        tracing::debug!(tool = %tool.name(), "Registering tool");
        self.index.insert(tool.name().to_string(), self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Registered tool names in registration order
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ServerTool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Handle a single raw JSON-RPC message.
    ///
    /// Returns the serialized response, or `None` for notifications.
    pub async fn handle_message(&self, message: &str) -> Option<String> {
        let response = match serde_json::from_str::<Value>(message) {
            Err(e) => {
                tracing::debug!(error = %e, "Unparseable message");
                Some(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error()))
            }
            Ok(value) => match serde_json::from_value::<JsonRpcRequest>(value) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => {
                    tracing::debug!(error = %e, "Invalid request");
                    Some(JsonRpcResponse::error(Value::Null, JsonRpcError::invalid_request()))
                }
            },
        }?;

        match serde_json::to_string(&response) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response");
                None
            }
        }
    }

    /// Dispatch a parsed request. Notifications yield `None`.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        tracing::debug!(method = %request.method, "Handling request");

        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }
        let id = request.id.clone().unwrap_or_default();

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(request.params).await,
            method => Err(JsonRpcError::method_not_found(method)),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" | "initialized" => {
                tracing::info!("Client initialized");
            }
            method => tracing::debug!(method = %method, "Ignoring notification"),
        }
    }

    fn handle_initialize(&self, params: Option<Value>) -> std::result::Result<Value, JsonRpcError> {
        let params: InitializeParams = parse_params(params)?;
        tracing::info!(
            client = %params.client_info.name,
            client_version = %params.client_info.version,
            protocol_version = %params.protocol_version,
            "Client connected"
        );

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: true }),
                logging: Some(serde_json::json!({})),
            },
            server_info: self.info.clone(),
        };

        to_value(&result)
    }

    fn handle_tools_list(&self) -> std::result::Result<Value, JsonRpcError> {
        let result = ListToolsResult {
            tools: self.tools.iter().map(|t| t.definition().schema()).collect(),
        };

        to_value(&result)
    }

    async fn handle_tools_call(
        &self,
        params: Option<Value>,
    ) -> std::result::Result<Value, JsonRpcError> {
        let params: CallToolParams = parse_params(params)?;

        let tool = self
            .get(&params.name)
            .ok_or_else(|| JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)))?;

        tracing::info!(tool = %params.name, "Calling tool");
        let result = tool.call(params.arguments).await;

        to_value(&result)
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(
    params: Option<Value>,
) -> std::result::Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;
    serde_json::from_value(params).map_err(|e| JsonRpcError::invalid_params(e.to_string()))
}

fn to_value<T: serde::Serialize>(value: &T) -> std::result::Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::echo;

    fn server() -> McpServer {
        let mut server = McpServer::new(SERVER_NAME, "1.2.3");
        server.register(echo("echo")).unwrap();
        server.register(echo("shout")).unwrap();
        server
    }

    async fn call(server: &McpServer, message: Value) -> Value {
        let response = server.handle_message(&message.to_string()).await.unwrap();
        serde_json::from_str(&response).unwrap()
    }

    #[test]
    fn test_duplicate_tool_rejected() {
        let mut server = server();
        let err = server.register(echo("echo")).unwrap_err();
        assert_eq!(err.to_string(), "tool already registered: echo");
        assert_eq!(server.tool_names(), vec!["echo", "shout"]);
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = call(
            &server(),
            serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test", "version": "0.1"}
            }}),
        )
        .await;

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(response["result"]["serverInfo"]["name"], SERVER_NAME);
        assert_eq!(response["result"]["serverInfo"]["version"], "1.2.3");
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_initialize_without_client_info_is_invalid() {
        let response = call(
            &server(),
            serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
                "protocolVersion": "2024-11-05"
            }}),
        )
        .await;

        assert_eq!(response["error"]["code"], JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_null_id_request_gets_response() {
        let response = call(
            &server(),
            serde_json::json!({"jsonrpc": "2.0", "id": null, "method": "ping"}),
        )
        .await;

        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["result"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_initialized_notification_has_no_response() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_tools_list_in_registration_order() {
        let response = call(
            &server(),
            serde_json::json!({"jsonrpc": "2.0", "id": "a", "method": "tools/list"}),
        )
        .await;

        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], "echo");
        assert_eq!(tools[1]["name"], "shout");
        assert_eq!(tools[0]["inputSchema"]["required"], serde_json::json!(["value"]));
    }

    #[tokio::test]
    async fn test_tools_call() {
        let response = call(
            &server(),
            serde_json::json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {
                "name": "echo", "arguments": {"value": "pong"}
            }}),
        )
        .await;

        assert_eq!(response["result"]["content"][0]["type"], "text");
        assert_eq!(response["result"]["content"][0]["text"], "pong");
        assert!(response["result"].get("isError").is_none());
    }

    #[tokio::test]
    async fn test_tools_call_missing_parameter_is_tool_error() {
        let response = call(
            &server(),
            serde_json::json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {
                "name": "echo", "arguments": {}
            }}),
        )
        .await;

        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);
        assert_eq!(
            response["result"]["content"][0]["text"],
            "missing required parameter: value"
        );
    }

    #[tokio::test]
    async fn test_tools_call_unknown_tool() {
        let response = call(
            &server(),
            serde_json::json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {
                "name": "delete_everything"
            }}),
        )
        .await;

        assert_eq!(response["error"]["code"], JsonRpcError::INVALID_PARAMS);
        assert_eq!(response["error"]["message"], "Unknown tool: delete_everything");
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = call(
            &server(),
            serde_json::json!({"jsonrpc": "2.0", "id": 5, "method": "resources/list"}),
        )
        .await;

        assert_eq!(response["error"]["code"], JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_parse_error() {
        let response = server().handle_message("{not json").await.unwrap();
        let response: Value = serde_json::from_str(&response).unwrap();

        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["error"]["code"], JsonRpcError::PARSE_ERROR);
    }
}
