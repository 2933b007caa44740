use lopdf::{Dictionary, Document, Object};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{PdfExtractionError, Result};
use crate::models::{PdfDocument, PdfHandle};
use crate::utils::encoding::decode_pdf_string;
use crate::utils::pdf::has_pdf_signature;

/// Document info entries copied into [`PdfDocument::metadata`].
const INFO_KEYS: &[&str] = &[
    "Title",
    "Author",
    "Subject",
    "Keywords",
    "Creator",
    "Producer",
    "CreationDate",
    "ModDate",
];

/// Opens PDF files and exposes their page count and metadata.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfReader;

impl PdfReader {
    pub fn new() -> Self {
        Self
    }

    /// Reads and parses the whole file. The returned document stays open
    /// until [`PdfReader::close`] is called or it is dropped.
    pub fn open(&self, path: &Path) -> Result<PdfDocument> {
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PdfExtractionError::FileNotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => PdfExtractionError::PermissionDenied(path.to_path_buf()),
            _ => {
                warn!(target: "pdf_reader", path = %path.display(), "Failed to read file: {}", e);
                PdfExtractionError::InvalidPdf(path.to_path_buf())
            }
        })?;

        if !has_pdf_signature(&bytes) {
            debug!(target: "pdf_reader", path = %path.display(), "Missing %PDF- header");
            return Err(PdfExtractionError::InvalidPdf(path.to_path_buf()));
        }

        let document = Document::load_mem(&bytes).map_err(|e| {
            warn!(target: "pdf_reader", path = %path.display(), "PDF parse error: {}", e);
            PdfExtractionError::InvalidPdf(path.to_path_buf())
        })?;

        if document.is_encrypted() {
            warn!(target: "pdf_reader", path = %path.display(), "Document is encrypted; text may be unreadable");
        }

        let page_count = document.get_pages().len();
        let metadata = read_metadata(&document);
        info!(
            target: "pdf_reader",
            path = %path.display(),
            pages = page_count,
            bytes = bytes.len(),
            "Opened PDF"
        );

        Ok(PdfDocument {
            file_path: path.to_path_buf(),
            page_count,
            metadata,
            handle: Some(PdfHandle { bytes, document }),
        })
    }

    pub fn page_count(&self, doc: &PdfDocument) -> usize {
        doc.page_count
    }

    /// Releases the parsed document. Calling it twice is harmless.
    pub fn close(&self, doc: &mut PdfDocument) {
        if doc.handle.take().is_some() {
            debug!(target: "pdf_reader", path = %doc.file_path.display(), "Closed PDF");
        }
    }
}

fn read_metadata(document: &Document) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    let Some(info) = info_dictionary(document) else {
        return metadata;
    };

    for key in INFO_KEYS {
        let value = match info.get(key.as_bytes()) {
            Ok(Object::String(bytes, _)) => decode_pdf_string(bytes),
            Ok(Object::Name(name)) => String::from_utf8_lossy(name).into_owned(),
            _ => continue,
        };
        let value = value.trim().to_string();
        if !value.is_empty() {
            metadata.insert((*key).to_string(), value);
        }
    }
    metadata
}

fn info_dictionary(document: &Document) -> Option<&Dictionary> {
    let info = document.trailer.get(b"Info").ok()?;
    let resolved = match info {
        Object::Reference(id) => document.get_object(*id).ok()?,
        other => other,
    };
    resolved.as_dict().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{pdf_with_info, write_pdf};
    use tempfile::TempDir;

    #[test]
    fn opens_a_valid_document() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(dir.path(), "three.pdf", &["one", "two", "three"]);

        let reader = PdfReader::new();
        let doc = reader.open(&path).unwrap();
        assert_eq!(reader.page_count(&doc), 3);
        assert_eq!(doc.file_path, path);
        assert!(doc.is_open());
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = PdfReader::new().open(&dir.path().join("absent.pdf")).unwrap_err();
        assert!(matches!(err, PdfExtractionError::FileNotFound(_)));
    }

    #[test]
    fn non_pdf_content_is_rejected() {
        let dir = TempDir::new().unwrap();
        let fake = dir.path().join("fake.pdf");
        fs::write(&fake, "just some text pretending to be a pdf").unwrap();
        let err = PdfReader::new().open(&fake).unwrap_err();
        assert!(matches!(err, PdfExtractionError::InvalidPdf(_)));

        let broken = dir.path().join("broken.pdf");
        fs::write(&broken, "%PDF-1.4\nthis is not a real body").unwrap();
        let err = PdfReader::new().open(&broken).unwrap_err();
        assert!(matches!(err, PdfExtractionError::InvalidPdf(_)));
    }

    #[test]
    fn reads_info_dictionary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("info.pdf");
        let bytes = pdf_with_info(&["body"], &[("Title", "Quarterly Report"), ("Author", "Finance"), ("Subject", "  ")]);
        fs::write(&path, bytes).unwrap();

        let doc = PdfReader::new().open(&path).unwrap();
        assert_eq!(doc.metadata.get("Title").map(String::as_str), Some("Quarterly Report"));
        assert_eq!(doc.metadata.get("Author").map(String::as_str), Some("Finance"));
        assert!(!doc.metadata.contains_key("Subject"));
    }

    #[test]
    fn close_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(dir.path(), "one.pdf", &["only"]);
        let reader = PdfReader::new();
        let mut doc = reader.open(&path).unwrap();

        reader.close(&mut doc);
        assert!(!doc.is_open());
        reader.close(&mut doc);
        assert!(!doc.is_open());
        assert_eq!(reader.page_count(&doc), 1);
    }
}
