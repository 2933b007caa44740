pub mod analyze_text_tool;
pub mod extract_pdf_tool;
