//! Rendering of [`ExtractedContent`] as plain text, JSON or Markdown.

use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::error::{PdfExtractionError, Result};
use crate::models::{ExtractedContent, KeyInformation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Text, OutputFormat::Json, OutputFormat::Markdown];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "markdown",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = PdfExtractionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" => Ok(OutputFormat::Markdown),
            _ => Err(PdfExtractionError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Renders `content` in the requested format.
pub fn format(content: &ExtractedContent, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format_as_text(content)),
        OutputFormat::Json => format_as_json(content),
        OutputFormat::Markdown => Ok(format_as_markdown(content)),
    }
}

const RULE_WIDTH: usize = 50;

pub fn format_as_text(content: &ExtractedContent) -> String {
    let mut lines: Vec<String> = vec![
        format!("File: {}", content.file_path.display()),
        format!("Pages: {}", content.page_count),
        "-".repeat(RULE_WIDTH),
        String::new(),
    ];

    for page in &content.pages {
        lines.push(format!("=== Page {} ===", page.page_number + 1));
        if page.is_empty {
            lines.push("(empty page)".to_string());
        } else {
            lines.push(page.text.clone());
        }
        lines.push(String::new());
    }

    if let Some(info) = content.key_info.as_ref().filter(|i| !i.is_empty()) {
        push_banner(&mut lines, "Key Information");
        lines.push(String::new());
        if !info.headings.is_empty() {
            lines.push("Headings:".to_string());
            lines.extend(info.headings.iter().map(|h| format!("  - {h}")));
            lines.push(String::new());
        }
        if !info.keywords.is_empty() {
            lines.push("Keywords:".to_string());
            lines.push(format!("  {}", info.keywords.join(", ")));
            lines.push(String::new());
        }
        if !info.summary.is_empty() {
            lines.push("Summary:".to_string());
            lines.push(format!("  {}", info.summary));
            lines.push(String::new());
        }
        if !info.lists.is_empty() {
            lines.push("List Items:".to_string());
            lines.extend(info.lists.iter().map(|item| format!("  {item}")));
            lines.push(String::new());
        }
    }

    if !content.errors.is_empty() {
        push_banner(&mut lines, "Errors");
        lines.extend(content.errors.iter().map(|e| format!("  - {e}")));
        lines.push(String::new());
    }

    lines.join("\n")
}

fn push_banner(lines: &mut Vec<String>, title: &str) {
    lines.push("=".repeat(RULE_WIDTH));
    lines.push(title.to_string());
    lines.push("=".repeat(RULE_WIDTH));
}

#[derive(Serialize)]
struct JsonPage<'a> {
    page_number: usize,
    text: &'a str,
    char_count: usize,
    is_empty: bool,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    file_path: String,
    page_count: usize,
    pages: Vec<JsonPage<'a>>,
    total_text: &'a str,
    extraction_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_info: Option<&'a KeyInformation>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    errors: &'a [String],
}

/// Pretty JSON with 1-based page numbers. Non-ASCII text is written as-is.
pub fn format_as_json(content: &ExtractedContent) -> Result<String> {
    let document = JsonDocument {
        file_path: content.file_path.display().to_string(),
        page_count: content.page_count,
        pages: content
            .pages
            .iter()
            .map(|p| JsonPage {
                page_number: p.page_number + 1,
                text: &p.text,
                char_count: p.char_count,
                is_empty: p.is_empty,
            })
            .collect(),
        total_text: &content.total_text,
        extraction_time: content.extraction_time,
        key_info: content.key_info.as_ref(),
        errors: &content.errors,
    };
    serde_json::to_string_pretty(&document)
        .map_err(|e| PdfExtractionError::Extraction(format!("JSON serialization failed: {e}")))
}

pub fn format_as_markdown(content: &ExtractedContent) -> String {
    let mut lines: Vec<String> = vec![
        "# PDF Text Extraction Result".to_string(),
        String::new(),
        format!("**File:** {}", content.file_path.display()),
        format!("**Pages:** {}", content.page_count),
        String::new(),
        "---".to_string(),
        String::new(),
    ];

    for page in &content.pages {
        lines.push(format!("## Page {}", page.page_number + 1));
        lines.push(String::new());
        if page.is_empty {
            lines.push("*(empty page)*".to_string());
        } else {
            lines.push(page.text.clone());
        }
        lines.push(String::new());
    }

    // Absent sections are omitted entirely, never rendered as empty headers.
    if let Some(info) = content.key_info.as_ref().filter(|i| !i.is_empty()) {
        lines.extend(["---".to_string(), String::new(), "## Key Information".to_string(), String::new()]);
        if !info.headings.is_empty() {
            push_md_section(&mut lines, "Headings", info.headings.iter().map(|h| format!("- {h}")));
        }
        if !info.keywords.is_empty() {
            push_md_section(&mut lines, "Keywords", std::iter::once(info.keywords.join(", ")));
        }
        if !info.summary.is_empty() {
            push_md_section(&mut lines, "Summary", std::iter::once(info.summary.clone()));
        }
        if !info.lists.is_empty() {
            push_md_section(&mut lines, "List Items", info.lists.iter().map(|item| format!("- {item}")));
        }
    }

    if !content.errors.is_empty() {
        lines.extend(["---".to_string(), String::new(), "## Errors".to_string(), String::new()]);
        lines.extend(content.errors.iter().map(|e| format!("- {e}")));
        lines.push(String::new());
    }

    lines.join("\n")
}

fn push_md_section(lines: &mut Vec<String>, title: &str, body: impl Iterator<Item = String>) {
    lines.push(format!("### {title}"));
    lines.push(String::new());
    lines.extend(body);
    lines.push(String::new());
}

/// Writes `content` as UTF-8, creating missing parent directories.
pub fn save_to_file(content: &str, path: &Path) -> Result<String> {
    let save_err = |reason: String| PdfExtractionError::Save {
        path: path.to_path_buf(),
        reason,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| save_err(e.to_string()))?;
    }
    fs::write(path, content).map_err(|e| save_err(e.to_string()))?;
    info!(target: "output", path = %path.display(), bytes = content.len(), "Saved output");
    Ok(format!("Saved to: {}", path.display()))
}
