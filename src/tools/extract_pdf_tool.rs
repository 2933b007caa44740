use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::error::PdfExtractionError;
use crate::mcp::types::{CallToolResult, ToolAnnotations, ToolDefinition};
use crate::output::OutputFormat;
use crate::service::{ExtractRequest, PdfExtractionService};
use crate::utils::content_guard::{build_error_payload, safe_truncate_utf8};

pub static EXTRACT_PDF_TOOL_DEFINITION: Lazy<ToolDefinition> = Lazy::new(|| ToolDefinition {
    name: "extract-pdf".to_string(),
    description: "Extract the text of a local PDF file, optionally with key information (headings, keywords, summary, list items)".to_string(),
    input_schema: json!({
        "type": "object",
        "properties": {
            "path": {
                "type": "string",
                "description": "Path to the PDF file (absolute, relative or starting with ~)"
            },
            "format": {
                "type": "string",
                "description": "Output format (default: text)",
                "enum": OutputFormat::ALL.map(|format| format.as_str()),
                "default": "text"
            },
            "extractKeyInfo": {
                "type": "boolean",
                "description": "Whether to analyze key information (default: true)",
                "default": true
            },
            "maxLength": {
                "type": "integer",
                "description": "Maximum length of the returned output in bytes (default: 200000)",
                "default": 200000,
                "minimum": 1000
            }
        },
        "required": ["path"]
    }),
    annotations: Some(ToolAnnotations {
        title: Some("Extract PDF Text".to_string()),
        read_only_hint: Some(true),
        open_world_hint: Some(false),
    }),
});

#[derive(Debug, Deserialize)]
struct ExtractPdfParams {
    path: String,
    #[serde(default)]
    format: Option<String>,
    #[serde(default = "default_true", rename = "extractKeyInfo")]
    extract_key_info: bool,
    #[serde(default = "default_max_length", rename = "maxLength")]
    max_length: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_length() -> usize {
    200_000
}

pub struct ExtractPdfTool {
    service: Arc<PdfExtractionService>,
    timeout: Duration,
}

impl ExtractPdfTool {
    pub fn new(service: Arc<PdfExtractionService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    pub async fn execute(&self, arguments: Option<serde_json::Value>) -> CallToolResult {
        let params = match arguments {
            Some(args) => match serde_json::from_value::<ExtractPdfParams>(args) {
                Ok(params) => params,
                Err(e) => {
                    error!(target: "extract_pdf_tool", "Invalid extract-pdf parameters: {}", e);
                    return CallToolResult::error(format!("Invalid parameters: {}", e));
                }
            },
            None => return CallToolResult::error("Missing required parameters"),
        };

        let format = match params.format.as_deref() {
            Some(raw) => match raw.parse::<OutputFormat>() {
                Ok(format) => format,
                Err(e) => return CallToolResult::error(error_payload(&e, &params.path)),
            },
            None => self
                .service
                .config()
                .default_output_format
                .parse()
                .unwrap_or_default(),
        };

        info!(target: "extract_pdf_tool", path = %params.path, format = %format, "Extracting PDF");
        let request = ExtractRequest {
            output_format: format,
            extract_key_info: params.extract_key_info,
            ..ExtractRequest::new(params.path.clone())
        };
        let service = Arc::clone(&self.service);
        let job = tokio::task::spawn_blocking(move || service.extract(&request));

        match tokio::time::timeout(self.timeout, job).await {
            Ok(Ok(Ok(output))) => {
                if output.len() > params.max_length {
                    warn!(target: "extract_pdf_tool", len = output.len(), max = params.max_length, "Truncating tool output");
                }
                CallToolResult::success(safe_truncate_utf8(
                    &output,
                    params.max_length,
                    "\n... [Output truncated due to length]",
                ))
            }
            Ok(Ok(Err(e))) => match e.downcast_ref::<PdfExtractionError>() {
                Some(known) => {
                    warn!(target: "extract_pdf_tool", path = %params.path, code = known.code(), "{}", known);
                    CallToolResult::error(error_payload(known, &params.path))
                }
                None => {
                    error!(target: "extract_pdf_tool", path = %params.path, "Unexpected extraction failure: {:#}", e);
                    CallToolResult::error(build_error_payload(
                        "ERR_EXTRACTION",
                        "An unexpected error occurred while extracting the PDF",
                        json!({ "path": params.path }),
                    ))
                }
            },
            Ok(Err(join_error)) => {
                error!(target: "extract_pdf_tool", path = %params.path, "Extraction task failed: {}", join_error);
                CallToolResult::error(build_error_payload(
                    "ERR_INTERNAL",
                    "The extraction task terminated unexpectedly",
                    json!({ "path": params.path }),
                ))
            }
            Err(_) => {
                warn!(target: "extract_pdf_tool", path = %params.path, secs = self.timeout.as_secs(), "Extraction timed out");
                CallToolResult::error(build_error_payload(
                    "ERR_TIMEOUT",
                    "PDF extraction timed out",
                    json!({ "path": params.path, "timeoutSecs": self.timeout.as_secs() }),
                ))
            }
        }
    }
}

fn error_payload(err: &PdfExtractionError, path: &str) -> String {
    build_error_payload(err.code(), &err.to_string(), json!({ "path": path }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::segmenter::WhitespaceSegmenter;
    use crate::config::ExtractionConfig;
    use crate::test_support::write_pdf;
    use serde_json::Value;
    use tempfile::TempDir;

    fn tool() -> ExtractPdfTool {
        let service = PdfExtractionService::new(ExtractionConfig::default(), Arc::new(WhitespaceSegmenter));
        ExtractPdfTool::new(Arc::new(service), Duration::from_secs(30))
    }

    fn payload_code(result: &CallToolResult) -> String {
        let text = &result.content[0].text;
        let json_line = text.lines().last().unwrap();
        let v: Value = serde_json::from_str(json_line).unwrap();
        v["code"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn extracts_markdown() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(dir.path(), "doc.pdf", &["OVERVIEW", "Details"]);

        let result = tool()
            .execute(Some(json!({ "path": path, "format": "markdown" })))
            .await;
        assert_eq!(result.is_error, None);
        assert!(result.content[0].text.starts_with("# PDF Text Extraction Result"));
    }

    #[tokio::test]
    async fn missing_file_reports_code() {
        let dir = TempDir::new().unwrap();
        let result = tool()
            .execute(Some(json!({ "path": dir.path().join("none.pdf") })))
            .await;
        assert_eq!(result.is_error, Some(true));
        assert_eq!(payload_code(&result), "ERR_PDF_NOT_FOUND");
    }

    #[tokio::test]
    async fn unknown_format_is_rejected() {
        let result = tool()
            .execute(Some(json!({ "path": "/x.pdf", "format": "yaml" })))
            .await;
        assert_eq!(payload_code(&result), "ERR_FORMAT_UNSUPPORTED");
    }

    #[tokio::test]
    async fn malformed_arguments_are_rejected() {
        let result = tool().execute(Some(json!({ "path": 42 }))).await;
        assert_eq!(result.is_error, Some(true));
        assert!(result.content[0].text.starts_with("Invalid parameters"));

        let result = tool().execute(None).await;
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn long_output_is_truncated() {
        let dir = TempDir::new().unwrap();
        let body = "Lorem ipsum dolor sit amet\n".repeat(80);
        let path = write_pdf(dir.path(), "long.pdf", &[body.as_str()]);

        let result = tool()
            .execute(Some(json!({ "path": path, "maxLength": 1000, "extractKeyInfo": false })))
            .await;
        let text = &result.content[0].text;
        assert!(text.len() <= 1000);
        assert!(text.ends_with("[Output truncated due to length]"));
    }
}
