// Thin wrappers over the `pdf-extract` crate plus PDF sniffing helpers.
// Keep this module small and dependency-light.

use anyhow::Context;
use std::panic::{self, AssertUnwindSafe};

/// How far into the file the `%PDF-` header may appear.
const SIGNATURE_WINDOW: usize = 1024;

/// Extracts text per page from a PDF stored fully in memory.
///
/// `pdf-extract` can panic on malformed input; panics are turned into errors.
pub fn extract_pages_from_mem(bytes: &[u8]) -> anyhow::Result<Vec<String>> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));
    match outcome {
        Ok(result) => {
            result.context("failed to extract text from PDF bytes using pdf-extract")
        }
        Err(_) => anyhow::bail!("pdf-extract panicked while parsing the document"),
    }
}

/// Returns true if the head of a file carries the `%PDF-` magic bytes.
/// Leading junk before the header is tolerated within the first KiB.
pub fn has_pdf_signature(head: &[u8]) -> bool {
    const MAGIC: &[u8] = b"%PDF-";
    let limit = SIGNATURE_WINDOW.min(head.len());
    head[..limit].windows(MAGIC.len()).any(|w| w == MAGIC)
}
