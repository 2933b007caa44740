//! End-to-end extraction: path handling, reading, text extraction, key
//! information analysis, formatting and saving.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::analyzer::segmenter::Segmenter;
use crate::analyzer::KeyInfoAnalyzer;
use crate::config::ExtractionConfig;
use crate::error::PdfExtractionError;
use crate::models::ExtractedContent;
use crate::output::{self, OutputFormat};
use crate::pdf::{PdfReader, TextExtractor};
use crate::utils::path::{file_has_pdf_signature, is_pdf_file, normalize_path, validate_path};

/// One extraction job.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub file_path: String,
    pub output_format: OutputFormat,
    pub extract_key_info: bool,
    pub output_file: Option<PathBuf>,
    pub show_progress: bool,
}

impl ExtractRequest {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            output_format: OutputFormat::Text,
            extract_key_info: true,
            output_file: None,
            show_progress: false,
        }
    }
}

pub struct PdfExtractionService {
    config: ExtractionConfig,
    reader: PdfReader,
    extractor: TextExtractor,
    analyzer: KeyInfoAnalyzer,
}

impl PdfExtractionService {
    pub fn new(config: ExtractionConfig, segmenter: Arc<dyn Segmenter>) -> Self {
        let analyzer = KeyInfoAnalyzer::new(segmenter, config.analyzer_settings());
        Self {
            config,
            reader: PdfReader::new(),
            extractor: TextExtractor::new(),
            analyzer,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn analyzer(&self) -> &KeyInfoAnalyzer {
        &self.analyzer
    }

    /// Runs the whole pipeline and returns the formatted result.
    /// The result is also written to `output_file` when one is given.
    pub fn extract(&self, request: &ExtractRequest) -> anyhow::Result<String> {
        info!(target: "service", path = %request.file_path, format = %request.output_format, "Starting extraction");

        let content = self.extract_content(
            &request.file_path,
            request.extract_key_info,
            request.show_progress,
        )?;

        let formatted = output::format(&content, request.output_format)?;

        if let Some(output_file) = &request.output_file {
            let message = output::save_to_file(&formatted, output_file)?;
            debug!(target: "service", "{}", message);
        }

        info!(target: "service", path = %content.file_path.display(), "Extraction finished");
        Ok(formatted)
    }

    /// Structured variant of [`PdfExtractionService::extract`] without
    /// formatting or saving.
    pub fn extract_content(
        &self,
        file_path: &str,
        extract_key_info: bool,
        show_progress: bool,
    ) -> anyhow::Result<ExtractedContent> {
        let started = Instant::now();

        let path = normalize_path(file_path).map_err(|e| {
            error!(target: "service", input = %file_path, "{}", e);
            e
        })?;
        validate_path(&path).map_err(|e| {
            error!(target: "service", path = %path.display(), "{}", e);
            e
        })?;
        if !is_pdf_file(&path) {
            error!(target: "service", path = %path.display(), "Not a .pdf file");
            return Err(PdfExtractionError::InvalidPdf(path).into());
        }
        // Reject renamed non-PDF files before reading them whole.
        if !file_has_pdf_signature(&path) {
            error!(target: "service", path = %path.display(), "Missing %PDF- header");
            return Err(PdfExtractionError::InvalidPdf(path).into());
        }

        let mut document = self.reader.open(&path)?;
        if !document.metadata.is_empty() {
            debug!(target: "service", metadata = ?document.metadata, "Document info");
        }

        let page_count = self.reader.page_count(&document);
        let report_progress = show_progress && page_count > self.config.show_progress_threshold;
        let mut content = if report_progress {
            eprintln!("Extracting {} pages...", page_count);
            let content = self
                .extractor
                .extract_all_text_with_progress(&document, print_progress);
            eprintln!();
            content
        } else {
            self.extractor.extract_all_text(&document)
        };
        self.reader.close(&mut document);

        content.extraction_time = started.elapsed().as_secs_f64();
        info!(
            target: "service",
            pages = content.page_count,
            chars = content.total_text.chars().count(),
            failed_pages = content.errors.len(),
            seconds = content.extraction_time,
            "Text extracted"
        );

        if extract_key_info {
            content.key_info = Some(self.analyzer.analyze(&content.total_text));
        }
        Ok(content)
    }
}

fn print_progress(done: usize, total: usize) {
    let percent = done as f64 / total.max(1) as f64 * 100.0;
    let mut stderr = std::io::stderr();
    let _ = write!(stderr, "\rProgress: {done}/{total} ({percent:.1}%)");
    let _ = stderr.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::segmenter::WhitespaceSegmenter;
    use crate::test_support::write_pdf;
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;

    fn service() -> PdfExtractionService {
        PdfExtractionService::new(ExtractionConfig::default(), Arc::new(WhitespaceSegmenter))
    }

    fn pdf_error(err: &anyhow::Error) -> &PdfExtractionError {
        err.downcast_ref::<PdfExtractionError>()
            .expect("pipeline errors carry a PdfExtractionError")
    }

    #[test]
    fn extracts_text_output() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(dir.path(), "doc.pdf", &["INTRODUCTION", "Body text here"]);

        let out = service()
            .extract(&ExtractRequest::new(path.to_string_lossy()))
            .unwrap();
        assert!(out.contains("Pages: 2"));
        assert!(out.contains("=== Page 1 ==="));
        assert!(out.contains("INTRODUCTION"));
        assert!(out.contains("Key Information"));
    }

    #[test]
    fn json_output_without_key_info() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(dir.path(), "doc.pdf", &["Alpha"]);
        let request = ExtractRequest {
            output_format: OutputFormat::Json,
            extract_key_info: false,
            ..ExtractRequest::new(path.to_string_lossy())
        };

        let v: Value = serde_json::from_str(&service().extract(&request).unwrap()).unwrap();
        assert_eq!(v["page_count"], 1);
        assert!(v.get("key_info").is_none());
        assert!(v["extraction_time"].as_f64().unwrap() >= 0.0);
    }

    #[test]
    fn saves_output_file() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(dir.path(), "doc.pdf", &["Alpha"]);
        let target = dir.path().join("results").join("doc.md");
        let request = ExtractRequest {
            output_format: OutputFormat::Markdown,
            output_file: Some(target.clone()),
            ..ExtractRequest::new(path.to_string_lossy())
        };

        let out = service().extract(&request).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), out);
        assert!(out.starts_with("# PDF Text Extraction Result"));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.pdf");
        let err = service()
            .extract(&ExtractRequest::new(missing.to_string_lossy()))
            .unwrap_err();
        assert!(matches!(pdf_error(&err), PdfExtractionError::FileNotFound(_)));
    }

    #[test]
    fn wrong_extension_is_invalid() {
        let dir = TempDir::new().unwrap();
        let txt = dir.path().join("notes.txt");
        fs::write(&txt, "%PDF-1.4").unwrap();
        let err = service()
            .extract(&ExtractRequest::new(txt.to_string_lossy()))
            .unwrap_err();
        assert!(matches!(pdf_error(&err), PdfExtractionError::InvalidPdf(_)));
    }

    #[test]
    fn corrupt_pdf_is_invalid() {
        let dir = TempDir::new().unwrap();
        let fake = dir.path().join("fake.pdf");
        fs::write(&fake, "plain text").unwrap();
        let err = service()
            .extract(&ExtractRequest::new(fake.to_string_lossy()))
            .unwrap_err();
        assert!(matches!(pdf_error(&err), PdfExtractionError::InvalidPdf(_)));
    }

    #[test]
    fn empty_path_is_rejected() {
        let err = service().extract(&ExtractRequest::new("  ")).unwrap_err();
        assert!(matches!(pdf_error(&err), PdfExtractionError::InvalidPath(_)));
    }

    #[test]
    fn structured_content_for_library_callers() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(dir.path(), "doc.pdf", &["First", "Second"]);

        let content = service()
            .extract_content(&path.to_string_lossy(), true, false)
            .unwrap();
        assert_eq!(content.page_count, 2);
        assert_eq!(content.file_path, path);
        assert!(content.key_info.is_some());

        let content = service()
            .extract_content(&path.to_string_lossy(), false, true)
            .unwrap();
        assert!(content.key_info.is_none());
    }

    #[test]
    fn analyzer_uses_configured_limits() {
        let config = ExtractionConfig {
            max_keywords: 1,
            ..ExtractionConfig::default()
        };
        let service = PdfExtractionService::new(config, Arc::new(WhitespaceSegmenter));
        let info = service.analyzer().analyze("rust rust rust tokio tokio");
        assert_eq!(info.keywords, vec!["rust"]);
    }

    #[test]
    fn renamed_text_file_is_rejected_by_header() {
        let dir = TempDir::new().unwrap();
        let fake = dir.path().join("notes.pdf");
        fs::write(&fake, format!("{}%PDF-1.4", "x".repeat(2048))).unwrap();
        let err = service()
            .extract(&ExtractRequest::new(fake.to_string_lossy()))
            .unwrap_err();
        assert!(matches!(pdf_error(&err), PdfExtractionError::InvalidPdf(_)));
    }
}
