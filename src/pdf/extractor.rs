use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, warn};

use crate::error::{PdfExtractionError, Result};
use crate::models::{ExtractedContent, PageText, PdfDocument};
use crate::utils::encoding::normalize_text;
use crate::utils::pdf::extract_pages_from_mem;

/// Pulls page text out of an opened [`PdfDocument`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts one page. `page_number` is 0-based.
    pub fn extract_text(&self, doc: &PdfDocument, page_number: usize) -> Result<String> {
        let page_error = |reason: String| PdfExtractionError::PageExtraction {
            page: page_number + 1,
            reason,
        };

        if page_number >= doc.page_count {
            return Err(page_error(format!(
                "page out of range (document has {} pages)",
                doc.page_count
            )));
        }
        let handle = doc
            .handle
            .as_ref()
            .ok_or_else(|| page_error("document is closed".to_string()))?;

        let lopdf_page = u32::try_from(page_number + 1)
            .map_err(|_| page_error("page number too large".to_string()))?;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            handle.document.extract_text(&[lopdf_page])
        }));
        match outcome {
            Ok(Ok(text)) => Ok(normalize_text(&text)),
            Ok(Err(e)) => Err(page_error(e.to_string())),
            Err(_) => Err(page_error("parser panicked".to_string())),
        }
    }

    /// Extracts every page. Failing pages become empty placeholders and their
    /// errors are collected in [`ExtractedContent::errors`].
    pub fn extract_all_text(&self, doc: &PdfDocument) -> ExtractedContent {
        self.extract_all_text_with_progress(doc, |_, _| {})
    }

    /// Like [`TextExtractor::extract_all_text`], calling `progress(done, total)`
    /// after each page.
    pub fn extract_all_text_with_progress<F>(&self, doc: &PdfDocument, mut progress: F) -> ExtractedContent
    where
        F: FnMut(usize, usize),
    {
        let total = doc.page_count;

        if let Some(pages) = self.extract_whole_document(doc) {
            let pages = pages
                .into_iter()
                .enumerate()
                .map(|(index, raw)| {
                    progress(index + 1, total);
                    PageText::new(index, normalize_text(&raw))
                })
                .collect();
            return ExtractedContent::new(doc.file_path.clone(), total, pages, Vec::new());
        }

        let mut pages = Vec::with_capacity(total);
        let mut errors = Vec::new();
        for index in 0..total {
            match self.extract_text(doc, index) {
                Ok(text) => pages.push(PageText::new(index, text)),
                Err(e) => {
                    error!(target: "text_extractor", path = %doc.file_path.display(), page = index + 1, "{}", e);
                    errors.push(e.to_string());
                    pages.push(PageText::placeholder(index));
                }
            }
            progress(index + 1, total);
        }
        ExtractedContent::new(doc.file_path.clone(), total, pages, errors)
    }

    /// Layout-aware extraction over the whole file. `None` when it fails or
    /// disagrees with the page tree, in which case pages are read one by one.
    fn extract_whole_document(&self, doc: &PdfDocument) -> Option<Vec<String>> {
        let handle = doc.handle.as_ref()?;
        match extract_pages_from_mem(&handle.bytes) {
            Ok(pages) if pages.len() == doc.page_count => Some(pages),
            Ok(pages) => {
                debug!(
                    target: "text_extractor",
                    expected = doc.page_count,
                    got = pages.len(),
                    "Page count mismatch, falling back to per-page extraction"
                );
                None
            }
            Err(e) => {
                warn!(target: "text_extractor", path = %doc.file_path.display(), "{:#}; falling back to per-page extraction", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::PdfReader;
    use crate::test_support::write_pdf;
    use tempfile::TempDir;

    fn open(pages: &[&str]) -> (TempDir, PdfDocument) {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(dir.path(), "doc.pdf", pages);
        let doc = PdfReader::new().open(&path).unwrap();
        (dir, doc)
    }

    #[test]
    fn extracts_single_page() {
        let (_dir, doc) = open(&["Hello World", "Second page"]);
        let text = TextExtractor::new().extract_text(&doc, 1).unwrap();
        assert!(text.contains("Second"));
    }

    #[test]
    fn out_of_range_page_is_an_error() {
        let (_dir, doc) = open(&["only"]);
        let err = TextExtractor::new().extract_text(&doc, 1).unwrap_err();
        match err {
            PdfExtractionError::PageExtraction { page, reason } => {
                assert_eq!(page, 2);
                assert!(reason.contains("out of range"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn closed_document_cannot_be_read() {
        let (_dir, mut doc) = open(&["text"]);
        PdfReader::new().close(&mut doc);
        assert!(TextExtractor::new().extract_text(&doc, 0).is_err());
    }

    #[test]
    fn extracts_all_pages_in_order() {
        let (_dir, doc) = open(&["Alpha", "Bravo", "Charlie"]);
        let content = TextExtractor::new().extract_all_text(&doc);

        assert_eq!(content.page_count, 3);
        assert_eq!(content.pages.len(), 3);
        assert!(content.errors.is_empty());
        for (index, page) in content.pages.iter().enumerate() {
            assert_eq!(page.page_number, index);
        }
        assert!(content.pages[0].text.contains("Alpha"));
        assert!(content.pages[2].text.contains("Charlie"));
        let joined: String = content.pages.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(content.total_text, joined);
    }

    #[test]
    fn blank_pages_are_flagged_empty() {
        let (_dir, doc) = open(&["Content", ""]);
        let content = TextExtractor::new().extract_all_text(&doc);
        assert_eq!(content.pages.len(), 2);
        assert!(!content.pages[0].is_empty);
        assert!(content.pages[1].is_empty);
    }

    #[test]
    fn closed_document_yields_placeholders_and_errors() {
        let (_dir, mut doc) = open(&["a", "b"]);
        PdfReader::new().close(&mut doc);
        let content = TextExtractor::new().extract_all_text(&doc);

        assert_eq!(content.pages.len(), 2);
        assert!(content.pages.iter().all(|p| p.is_empty));
        assert_eq!(content.errors.len(), 2);
        assert!(content.errors[0].contains("page 1"));
    }

    #[test]
    fn progress_reports_every_page() {
        let (_dir, doc) = open(&["1", "2", "3", "4"]);
        let mut seen = Vec::new();
        TextExtractor::new().extract_all_text_with_progress(&doc, |done, total| seen.push((done, total)));
        assert_eq!(seen, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    }
}
