use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Structural information recovered from a document's text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyInformation {
    /// Heading lines in document order
    pub headings: Vec<String>,
    /// Keywords ranked by descending frequency
    pub keywords: Vec<String>,
    pub summary: String,
    /// List items in document order, markers stripped
    pub lists: Vec<String>,
}

impl KeyInformation {
    pub fn is_empty(&self) -> bool {
        self.headings.is_empty()
            && self.keywords.is_empty()
            && self.summary.is_empty()
            && self.lists.is_empty()
    }
}

/// Owned handle to an opened PDF. Dropped on close.
pub struct PdfHandle {
    pub bytes: Vec<u8>,
    pub document: lopdf::Document,
}

/// An opened PDF file.
pub struct PdfDocument {
    pub file_path: PathBuf,
    pub page_count: usize,
    pub metadata: BTreeMap<String, String>,
    pub(crate) handle: Option<PdfHandle>,
}

impl PdfDocument {
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("file_path", &self.file_path)
            .field("page_count", &self.page_count)
            .field("metadata", &self.metadata)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Text of a single page. `page_number` is 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: usize,
    pub text: String,
    pub char_count: usize,
    pub is_empty: bool,
}

impl PageText {
    pub fn new(page_number: usize, text: String) -> Self {
        let char_count = text.chars().count();
        let is_empty = text.trim().is_empty();
        Self {
            page_number,
            text,
            char_count,
            is_empty,
        }
    }

    /// Placeholder for a page whose extraction failed.
    pub fn placeholder(page_number: usize) -> Self {
        Self::new(page_number, String::new())
    }
}

/// Everything extracted from one document.
#[derive(Debug, Clone, Default)]
pub struct ExtractedContent {
    pub file_path: PathBuf,
    pub page_count: usize,
    pub pages: Vec<PageText>,
    pub total_text: String,
    pub key_info: Option<KeyInformation>,
    /// Seconds spent opening and extracting
    pub extraction_time: f64,
    pub errors: Vec<String>,
}

impl ExtractedContent {
    /// Builds the content record; `total_text` is the page texts joined without separators.
    pub fn new(
        file_path: PathBuf,
        page_count: usize,
        pages: Vec<PageText>,
        errors: Vec<String>,
    ) -> Self {
        let total_text = pages.iter().map(|p| p.text.as_str()).collect::<String>();
        Self {
            file_path,
            page_count,
            pages,
            total_text,
            key_info: None,
            extraction_time: 0.0,
            errors,
        }
    }
}
