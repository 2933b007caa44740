use anyhow::Result;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::transport::StdioTransport;
use super::types::*;
use crate::service::PdfExtractionService;
use crate::tools::{
    analyze_text_tool::{AnalyzeTextTool, ANALYZE_TEXT_TOOL_DEFINITION},
    extract_pdf_tool::{ExtractPdfTool, EXTRACT_PDF_TOOL_DEFINITION},
};

const PROTOCOL_VERSION: &str = "2024-11-05";

pub struct McpServer {
    service: Arc<PdfExtractionService>,
    tool_timeout: Duration,
    initialized: bool,
}

impl McpServer {
    pub fn new(service: Arc<PdfExtractionService>, tool_timeout: Duration) -> Self {
        Self {
            service,
            tool_timeout,
            initialized: false,
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        let mut transport = StdioTransport::new();
        info!(target: "mcp_server", "MCP server started and listening on stdio");

        loop {
            match transport.read_message().await? {
                Some(McpMessage::Request(request)) => {
                    let response = self.handle_request(request).await;
                    transport.write_response(response).await?;
                }
                Some(McpMessage::Notification(notification)) => {
                    self.handle_notification(notification).await;
                }
                Some(McpMessage::Malformed(reason)) => {
                    transport
                        .write_response(McpResponse::error(Value::Null, -32700, reason))
                        .await?;
                }
                None => {
                    info!(target: "mcp_server", "Client disconnected");
                    break;
                }
            }
        }

        Ok(())
    }

    pub async fn handle_request(&mut self, request: McpRequest) -> McpResponse {
        let id = Self::ensure_valid_id(request.id.clone());

        match request.method.as_str() {
            "initialize" => self.handle_initialize(request).await,
            "tools/list" => self.handle_list_tools(request).await,
            "tools/call" => self.handle_call_tool(request).await,
            "ping" => McpResponse::result(id, json!({})),
            _ => McpResponse::error(id, -32601, "Method not found"),
        }
    }

    async fn handle_notification(&mut self, notification: McpNotification) {
        debug!(target: "mcp_server", "Received notification: {}", notification.method);

        match notification.method.as_str() {
            "notifications/initialized" => {
                info!(target: "mcp_server", "Client initialization completed");
                self.initialized = true;
            }
            "notifications/cancelled" => {
                debug!(target: "mcp_server", "Request cancelled notification received");
            }
            _ => {
                warn!(target: "mcp_server", "Unknown notification method: {}", notification.method);
            }
        }
    }

    fn ensure_valid_id(id: Option<Value>) -> Value {
        match id {
            Some(Value::Null) | None => Value::String("0".to_string()),
            Some(value) => value,
        }
    }

    fn respond_with<T: Serialize>(id: Value, result: &T) -> McpResponse {
        match serde_json::to_value(result) {
            Ok(value) => McpResponse::result(id, value),
            Err(e) => {
                error!(target: "mcp_server", "Failed to serialize result: {}", e);
                McpResponse::error(id, -32603, format!("Internal error: {}", e))
            }
        }
    }

    async fn handle_initialize(&mut self, request: McpRequest) -> McpResponse {
        let id = Self::ensure_valid_id(request.id.clone());

        let Some(params) = request.params else {
            return McpResponse::error(id, -32602, "Missing params");
        };
        match serde_json::from_value::<InitializeParams>(params) {
            Ok(init_params) => {
                info!(
                    target: "mcp_server",
                    client = %init_params.client_info.name,
                    version = %init_params.client_info.version,
                    "Initializing session"
                );
                let result = InitializeResult {
                    protocol_version: PROTOCOL_VERSION.to_string(),
                    server_info: ServerInfo {
                        name: "PDF Extractor MCP".to_string(),
                        version: env!("CARGO_PKG_VERSION").to_string(),
                        description: Some(
                            "Extracts text and key information from PDF documents".to_string(),
                        ),
                    },
                    capabilities: ServerCapabilities {
                        tools: Some(ToolsCapability {
                            list_changed: Some(false),
                        }),
                        logging: Some(json!({})),
                    },
                };
                Self::respond_with(id, &result)
            }
            Err(e) => McpResponse::error(id, -32602, format!("Invalid params: {}", e)),
        }
    }

    async fn handle_list_tools(&self, request: McpRequest) -> McpResponse {
        let result = ListToolsResult {
            tools: vec![
                EXTRACT_PDF_TOOL_DEFINITION.clone(),
                ANALYZE_TEXT_TOOL_DEFINITION.clone(),
            ],
        };
        Self::respond_with(Self::ensure_valid_id(request.id), &result)
    }

    async fn handle_call_tool(&self, request: McpRequest) -> McpResponse {
        let id = Self::ensure_valid_id(request.id.clone());

        let Some(params) = request.params else {
            return McpResponse::error(id, -32602, "Missing params");
        };
        match serde_json::from_value::<CallToolParams>(params) {
            Ok(call_params) => {
                let result = self.execute_tool(call_params).await;
                Self::respond_with(id, &result)
            }
            Err(e) => McpResponse::error(id, -32602, format!("Invalid params: {}", e)),
        }
    }

    async fn execute_tool(&self, params: CallToolParams) -> CallToolResult {
        if !self.initialized {
            debug!(target: "mcp_server", tool = %params.name, "Tool called before initialized notification");
        }
        match params.name.as_str() {
            "extract-pdf" => {
                let tool = ExtractPdfTool::new(Arc::clone(&self.service), self.tool_timeout);
                tool.execute(params.arguments).await
            }
            "analyze-text" => {
                let tool = AnalyzeTextTool::new(Arc::clone(&self.service), self.tool_timeout);
                tool.execute(params.arguments).await
            }
            _ => CallToolResult::error(format!("Tool not found: {}", params.name)),
        }
    }
}
