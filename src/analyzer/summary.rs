use once_cell::sync::Lazy;
use regex::Regex;

use super::headings::SENTENCE_TERMINALS;

/// Appended whenever text is cut mid-content.
pub const TRUNCATION_MARKER: &str = "...";

static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[。！？.!?]+").expect("valid sentence boundary regex"));

/// Builds an extractive summary from the leading sentences of `text`.
///
/// Lengths are counted in characters. The result never exceeds
/// `max_length` plus one [`TRUNCATION_MARKER`].
pub fn generate_summary(text: &str, max_length: usize) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    if text.chars().count() <= max_length {
        return text.to_string();
    }

    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return truncate_with_marker(text, max_length);
    }

    let mut summary = String::new();
    let mut summary_len = 0;
    for sentence in sentences {
        let sentence_len = sentence.text.chars().count();
        if summary_len + sentence_len > max_length {
            if summary.is_empty() {
                return truncate_with_marker(sentence.text, max_length);
            }
            break;
        }

        summary.push_str(sentence.text);
        summary_len += sentence_len;
        if let Some(terminal) = sentence.terminal {
            summary.push(terminal);
            summary_len += 1;
        }
    }

    summary.trim().to_string()
}

struct Sentence<'a> {
    text: &'a str,
    /// Terminal directly after the sentence in the source, if any
    terminal: Option<char>,
}

/// Splits on runs of terminal punctuation, dropping blank pieces.
fn split_sentences(text: &str) -> Vec<Sentence<'_>> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let boundaries = SENTENCE_BOUNDARY
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .chain(std::iter::once((text.len(), text.len())));

    for (boundary_start, boundary_end) in boundaries {
        let piece = &text[start..boundary_start];
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            let leading = piece.len() - piece.trim_start().len();
            let end = start + leading + trimmed.len();
            let terminal = text[end..]
                .chars()
                .next()
                .filter(|c| SENTENCE_TERMINALS.contains(c));
            sentences.push(Sentence {
                text: trimmed,
                terminal,
            });
        }
        start = boundary_end;
    }

    sentences
}

fn truncate_with_marker(text: &str, max_length: usize) -> String {
    let mut out: String = text.chars().take(max_length).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_len(s: &str) -> usize {
        s.chars().count()
    }

    #[test]
    fn empty_text_gives_empty_summary() {
        assert_eq!(generate_summary("", 200), "");
        assert_eq!(generate_summary("  \n ", 200), "");
    }

    #[test]
    fn short_text_is_returned_verbatim() {
        let text = "这是一段很短的文本。";
        assert_eq!(generate_summary(text, char_len(text) + 10), text);
        assert_eq!(generate_summary(text, char_len(text)), text);
        assert_eq!(generate_summary("  padded  ", 20), "padded");
    }

    #[test]
    fn first_sentence_keeps_its_terminal() {
        let summary = generate_summary("第一句话。第二句话。第三句话。", 6);
        assert!(summary.starts_with("第一句话"));
        assert_eq!(summary, "第一句话。");
        assert!(char_len(&summary) <= 6 + TRUNCATION_MARKER.len());
    }

    #[test]
    fn accumulates_whole_sentences_only() {
        let text = "第一句。第二句。第三句。第四句。第五句。第六句。第七句。";
        let summary = generate_summary(text, 10);
        assert_eq!(summary, "第一句。第二句。");
        assert!(!summary.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn oversized_first_sentence_is_truncated() {
        let text = format!("{}。后面的句子。", "长".repeat(30));
        let summary = generate_summary(&text, 10);
        assert_eq!(summary, format!("{}{}", "长".repeat(10), TRUNCATION_MARKER));
    }

    #[test]
    fn text_without_terminals_is_cut_hard() {
        let text = "word ".repeat(20);
        let summary = generate_summary(&text, 12);
        assert_eq!(summary, "word word wo...");
    }

    #[test]
    fn respects_length_budget() {
        let text = "这是一段很长的文本。".repeat(50);
        let summary = generate_summary(&text, 100);
        assert!(char_len(&summary) <= 100 + TRUNCATION_MARKER.len());
        assert!(!summary.is_empty());
    }

    #[test]
    fn latin_sentences_are_handled() {
        let text = "Rust is fast. It is also safe! Does it scale? Yes it does.";
        let summary = generate_summary(text, 30);
        assert_eq!(summary, "Rust is fast.It is also safe!");
    }

    #[test]
    fn runs_of_terminals_split_once() {
        let text = "Really?! Absolutely. More text follows here.";
        let summary = generate_summary(text, 20);
        assert!(summary.starts_with("Really"));
        assert!(char_len(&summary) <= 20 + TRUNCATION_MARKER.len());
    }

    #[test]
    fn summary_is_derived_from_the_source() {
        let text = "甲乙丙。丁戊己。庚辛壬。癸子丑。寅卯辰。";
        let summary = generate_summary(text, 9);
        for piece in summary.split('。').filter(|p| !p.is_empty()) {
            assert!(text.contains(piece));
        }
    }
}
