use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::analyzer::AnalyzerSettings;
use crate::mcp::types::{CallToolResult, ToolAnnotations, ToolDefinition};
use crate::service::PdfExtractionService;
use crate::utils::content_guard::build_error_payload;

pub static ANALYZE_TEXT_TOOL_DEFINITION: Lazy<ToolDefinition> = Lazy::new(|| ToolDefinition {
    name: "analyze-text".to_string(),
    description: "Find headings, keywords, a short extractive summary and list items in plain text (Chinese and English)".to_string(),
    input_schema: json!({
        "type": "object",
        "properties": {
            "text": {
                "type": "string",
                "description": "Text to analyze"
            },
            "topN": {
                "type": "integer",
                "description": "Maximum number of keywords (default: from configuration, 10)",
                "minimum": 0
            },
            "summaryMaxLength": {
                "type": "integer",
                "description": "Summary length budget in characters (default: from configuration, 200)",
                "minimum": 1
            }
        },
        "required": ["text"]
    }),
    annotations: Some(ToolAnnotations {
        title: Some("Analyze Text".to_string()),
        read_only_hint: Some(true),
        open_world_hint: Some(false),
    }),
});

#[derive(Debug, Deserialize)]
struct AnalyzeTextParams {
    text: String,
    #[serde(default, rename = "topN")]
    top_n: Option<usize>,
    #[serde(default, rename = "summaryMaxLength")]
    summary_max_length: Option<usize>,
}

pub struct AnalyzeTextTool {
    service: Arc<PdfExtractionService>,
    timeout: Duration,
}

impl AnalyzeTextTool {
    pub fn new(service: Arc<PdfExtractionService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    pub async fn execute(&self, arguments: Option<serde_json::Value>) -> CallToolResult {
        let params = match arguments {
            Some(args) => match serde_json::from_value::<AnalyzeTextParams>(args) {
                Ok(params) => params,
                Err(e) => {
                    error!(target: "analyze_text_tool", "Invalid analyze-text parameters: {}", e);
                    return CallToolResult::error(format!("Invalid parameters: {}", e));
                }
            },
            None => return CallToolResult::error("Missing required parameters"),
        };

        let defaults = *self.service.analyzer().settings();
        let settings = AnalyzerSettings {
            top_n: params.top_n.unwrap_or(defaults.top_n),
            summary_max_length: params.summary_max_length.unwrap_or(defaults.summary_max_length),
            ..defaults
        };
        info!(
            target: "analyze_text_tool",
            chars = params.text.chars().count(),
            top_n = settings.top_n,
            summary_max_length = settings.summary_max_length,
            "Analyzing text"
        );

        let analyzer = self.service.analyzer().with_settings(settings);
        let text = params.text;
        let job = tokio::task::spawn_blocking(move || analyzer.analyze(&text));

        match tokio::time::timeout(self.timeout, job).await {
            Ok(Ok(info)) => match serde_json::to_string_pretty(&info) {
                Ok(json) => CallToolResult::success(json),
                Err(e) => {
                    error!(target: "analyze_text_tool", "Failed to serialize key information: {}", e);
                    CallToolResult::error(build_error_payload(
                        "ERR_INTERNAL",
                        "Failed to serialize the analysis result",
                        json!({}),
                    ))
                }
            },
            Ok(Err(join_error)) => {
                error!(target: "analyze_text_tool", "Analysis task failed: {}", join_error);
                CallToolResult::error(build_error_payload(
                    "ERR_INTERNAL",
                    "The analysis task terminated unexpectedly",
                    json!({}),
                ))
            }
            Err(_) => {
                warn!(target: "analyze_text_tool", secs = self.timeout.as_secs(), "Analysis timed out");
                CallToolResult::error(build_error_payload(
                    "ERR_TIMEOUT",
                    "Text analysis timed out",
                    json!({ "timeoutSecs": self.timeout.as_secs() }),
                ))
            }
        }
    }
}
