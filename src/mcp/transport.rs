use anyhow::Result;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::BufReader;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, error, warn};

use super::types::{McpMessage, McpNotification, McpRequest, McpResponse};

/// Line-delimited JSON-RPC over stdin/stdout.
pub struct StdioTransport {
    reader: FramedRead<BufReader<tokio::io::Stdin>, LinesCodec>,
    writer: FramedWrite<tokio::io::Stdout, LinesCodec>,
}

impl StdioTransport {
    pub fn new() -> Self {
        let reader = FramedRead::new(BufReader::new(tokio::io::stdin()), LinesCodec::new());
        let writer = FramedWrite::new(tokio::io::stdout(), LinesCodec::new());
        Self { reader, writer }
    }

    /// Next message, or `None` on EOF. Blank lines are skipped.
    pub async fn read_message(&mut self) -> Result<Option<McpMessage>> {
        loop {
            match self.reader.next().await {
                Some(Ok(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    debug!(target: "mcp_transport", "Received: {}", line);
                    return Ok(Some(parse_message(&line)));
                }
                Some(Err(e)) => {
                    error!(target: "mcp_transport", "Error reading from stdin: {}", e);
                    return Err(anyhow::anyhow!("Transport error: {}", e));
                }
                None => {
                    debug!(target: "mcp_transport", "EOF reached");
                    return Ok(None);
                }
            }
        }
    }

    pub async fn write_response(&mut self, response: McpResponse) -> Result<()> {
        let json = serde_json::to_string(&response)?;
        debug!(target: "mcp_transport", "Sending: {}", json);
        self.writer.send(json).await?;
        Ok(())
    }
}

/// Classifies one line: objects with an `id` are requests, without one notifications.
pub fn parse_message(line: &str) -> McpMessage {
    let value = match serde_json::from_str::<Value>(line) {
        Ok(value) => value,
        Err(e) => {
            warn!(target: "mcp_transport", "Failed to parse JSON: {}", e);
            return McpMessage::Malformed(format!("Invalid JSON: {}", e));
        }
    };

    let Some(obj) = value.as_object() else {
        warn!(target: "mcp_transport", "Invalid JSON-RPC message structure");
        return McpMessage::Malformed("Invalid JSON-RPC message structure".to_string());
    };

    if obj.contains_key("id") {
        match serde_json::from_value::<McpRequest>(value) {
            Ok(request) => McpMessage::Request(request),
            Err(e) => McpMessage::Malformed(format!("Invalid JSON-RPC request: {}", e)),
        }
    } else {
        match serde_json::from_value::<McpNotification>(value) {
            Ok(notification) => McpMessage::Notification(notification),
            Err(e) => McpMessage::Malformed(format!("Invalid JSON-RPC notification: {}", e)),
        }
    }
}
