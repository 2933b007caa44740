use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the extraction pipeline.
/// Display strings are shown to the user as-is by the CLI.
#[derive(Debug, Error)]
pub enum PdfExtractionError {
    #[error("file not found: '{}', please check that the path is correct", .0.display())]
    FileNotFound(PathBuf),

    #[error("'{}' is not a valid PDF file", .0.display())]
    InvalidPdf(PathBuf),

    #[error("permission denied while reading '{}'", .0.display())]
    PermissionDenied(PathBuf),

    #[error("failed to extract page {page}: {reason}")]
    PageExtraction { page: usize, reason: String },

    #[error("text encoding conversion failed; the document may contain unsupported characters")]
    Encoding,

    #[error("malformed path: '{0}'")]
    InvalidPath(String),

    #[error("unsupported output format '{0}', supported formats: text, json, markdown")]
    UnsupportedFormat(String),

    #[error("failed to save '{}': {reason}", path.display())]
    Save { path: PathBuf, reason: String },

    #[error("failed to load configuration '{}': {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("text extraction failed: {0}")]
    Extraction(String),
}

impl PdfExtractionError {
    /// Stable code used in tool error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            PdfExtractionError::FileNotFound(_) => "ERR_PDF_NOT_FOUND",
            PdfExtractionError::InvalidPdf(_) => "ERR_PDF_INVALID",
            PdfExtractionError::PermissionDenied(_) => "ERR_PDF_PERMISSION",
            PdfExtractionError::PageExtraction { .. } => "ERR_PDF_PAGE",
            PdfExtractionError::Encoding => "ERR_PDF_ENCODING",
            PdfExtractionError::InvalidPath(_) => "ERR_PATH_INVALID",
            PdfExtractionError::UnsupportedFormat(_) => "ERR_FORMAT_UNSUPPORTED",
            PdfExtractionError::Save { .. } => "ERR_SAVE",
            PdfExtractionError::Config { .. } => "ERR_CONFIG",
            PdfExtractionError::Extraction(_) => "ERR_EXTRACTION",
        }
    }
}

pub type Result<T> = std::result::Result<T, PdfExtractionError>;
