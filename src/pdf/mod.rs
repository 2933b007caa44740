//! Opening PDF files and extracting their text.

pub mod extractor;
pub mod reader;

pub use extractor::TextExtractor;
pub use reader::PdfReader;
