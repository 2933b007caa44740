use tracing::debug;

use crate::error::{PdfExtractionError, Result};

/// Decodes raw bytes to UTF-8, failing when the chosen charset cannot map them cleanly.
///
/// BOM first (UTF-8 / UTF-16), then plain UTF-8, then a chardetng guess.
pub fn decode_to_utf8(bytes: &[u8]) -> Result<String> {
    if let Some((enc, offset)) = encoding_rs::Encoding::for_bom(bytes) {
        let (cow, _used, had_errors) = enc.decode(&bytes[offset..]);
        if had_errors {
            return Err(PdfExtractionError::Encoding);
        }
        return Ok(cow.into_owned());
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return Ok(s.to_string());
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    let enc = detector.guess(None, true);
    let (cow, _used, had_errors) = enc.decode(bytes);
    if had_errors {
        return Err(PdfExtractionError::Encoding);
    }
    Ok(cow.into_owned())
}

/// Decodes a PDF text string (document info entries and the like).
/// Never fails: undecodable input is converted lossily.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    match decode_to_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            debug!(target: "encoding", len = bytes.len(), "{}; decoding lossily", e);
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Unifies line endings and strips control characters other than `\n` and `\t`,
/// including the byte order mark.
pub fn normalize_text(text: &str) -> String {
    let unified = text.replace("\r\n", "\n");
    unified
        .chars()
        .filter_map(|c| match c {
            '\r' => Some('\n'),
            '\n' | '\t' => Some(c),
            '\u{feff}' => None,
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf16_with_bom_is_decoded() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "报告 Title".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_to_utf8(&bytes).unwrap(), "报告 Title");
    }

    #[test]
    fn plain_utf8_passes_through() {
        assert_eq!(decode_to_utf8("人工智能".as_bytes()).unwrap(), "人工智能");
        assert_eq!(decode_pdf_string(b"Annual Report"), "Annual Report");
    }

    #[test]
    fn legacy_bytes_still_produce_text() {
        let (gbk, _, _) = encoding_rs::GBK.encode("机器学习是人工智能的核心技术之一");
        assert!(std::str::from_utf8(&gbk).is_err());
        assert!(!decode_pdf_string(&gbk).is_empty());
    }

    #[test]
    fn normalize_unifies_line_endings() {
        assert_eq!(normalize_text("a\r\nb\rc\n"), "a\nb\nc\n");
    }

    #[test]
    fn normalize_strips_controls_but_keeps_tabs() {
        assert_eq!(normalize_text("\u{feff}col1\tcol2\u{0}\u{7}\u{1b}"), "col1\tcol2");
        assert_eq!(normalize_text("第一章\n"), "第一章\n");
    }
}
