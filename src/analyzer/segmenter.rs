use jieba_rs::Jieba;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use super::AnalysisFault;

/// Splits mixed-script text into word-like tokens.
///
/// Implementations must be deterministic: the same input always yields the
/// same token boundaries.
pub trait Segmenter: Send + Sync {
    fn segment(&self, text: &str) -> Result<Vec<String>, AnalysisFault>;
}

/// Technical compounds the stock dictionary splits (机器学习 → 机器 + 学习).
/// One `word [freq] [tag]` entry per line, `#` starts a comment.
const USER_DICT: &str = include_str!("user_dict.txt");

/// Dictionary-based segmentation for CJK and Latin text backed by `jieba-rs`.
///
/// Loading the dictionary is the expensive part, so build one instance and
/// share it.
pub struct JiebaSegmenter {
    jieba: Jieba,
}

impl JiebaSegmenter {
    pub fn new() -> Self {
        let started = Instant::now();
        let mut jieba = Jieba::new();
        let user_words = add_user_words(&mut jieba, USER_DICT);
        debug!(
            target: "segmenter",
            elapsed_ms = started.elapsed().as_millis() as u64,
            user_words,
            "jieba dictionary loaded"
        );
        Self { jieba }
    }
}

/// Adds every dictionary line to `jieba`. Entries without a frequency get
/// one suggested by jieba that keeps the word whole.
fn add_user_words(jieba: &mut Jieba, dict: &str) -> usize {
    let mut added = 0;
    for line in dict.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let Some(word) = fields.next() else {
            continue;
        };
        let freq = fields.next().and_then(|f| f.parse::<usize>().ok());
        let tag = fields.next();
        jieba.add_word(word, freq, tag);
        added += 1;
    }
    added
}

impl Default for JiebaSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter for JiebaSegmenter {
    fn segment(&self, text: &str) -> Result<Vec<String>, AnalysisFault> {
        panic::catch_unwind(AssertUnwindSafe(|| {
            self.jieba
                .cut(text, true)
                .into_iter()
                .map(str::to_string)
                .collect::<Vec<String>>()
        }))
        .map_err(|_| AnalysisFault::Segmentation("jieba failed to cut the text".to_string()))
    }
}

/// Splits on whitespace and punctuation only. CJK runs stay whole.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceSegmenter;

impl Segmenter for WhitespaceSegmenter {
    fn segment(&self, text: &str) -> Result<Vec<String>, AnalysisFault> {
        Ok(text
            .split(|c: char| c.is_whitespace() || is_break_punctuation(c))
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect())
    }
}

fn is_break_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
        || matches!(
            c,
            '，' | '。' | '！' | '？' | '、' | '；' | '：' | '“' | '”' | '‘' | '’' | '（' | '）'
                | '【' | '】' | '《' | '》'
        )
}

/// Segmenter selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterKind {
    Jieba,
    Whitespace,
}

impl FromStr for SegmenterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jieba" => Ok(Self::Jieba),
            "whitespace" => Ok(Self::Whitespace),
            other => Err(format!(
                "unknown segmenter '{}', expected 'jieba' or 'whitespace'",
                other
            )),
        }
    }
}

pub fn build_segmenter(kind: SegmenterKind) -> Arc<dyn Segmenter> {
    match kind {
        SegmenterKind::Jieba => Arc::new(JiebaSegmenter::new()),
        SegmenterKind::Whitespace => Arc::new(WhitespaceSegmenter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;

    static JIEBA: Lazy<JiebaSegmenter> = Lazy::new(JiebaSegmenter::new);

    #[test]
    fn whitespace_segmenter_splits_on_spaces_and_punctuation() {
        let tokens = WhitespaceSegmenter
            .segment("Rust, 内存安全。 fast!  (zero-cost)")
            .unwrap();
        assert_eq!(tokens, vec!["Rust", "内存安全", "fast", "zero", "cost"]);
    }

    #[test]
    fn whitespace_segmenter_returns_nothing_for_blank_input() {
        assert!(WhitespaceSegmenter.segment(" \n\t ").unwrap().is_empty());
    }

    #[test]
    fn jieba_keeps_latin_words_intact() {
        let tokens = JIEBA.segment("hello world").unwrap();
        assert!(tokens.iter().any(|t| t == "hello"));
        assert!(tokens.iter().any(|t| t == "world"));
    }

    #[test]
    fn jieba_covers_the_whole_input() {
        let text = "我们在北京学习Rust编程。";
        let tokens = JIEBA.segment(text).unwrap();
        assert_eq!(tokens.concat(), text);
        assert!(tokens.len() > 1);
    }

    #[test]
    fn jieba_keeps_technical_compounds_whole() {
        let tokens = JIEBA.segment("机器学习和深度学习都是人工智能的分支。").unwrap();
        for term in ["机器学习", "深度学习", "人工智能"] {
            assert!(tokens.iter().any(|t| t == term), "{term} missing from {tokens:?}");
        }
        assert!(!tokens.iter().any(|t| t == "学习"));
    }

    #[test]
    fn user_words_skip_comments_and_blank_lines() {
        let mut jieba = Jieba::new();
        let added = add_user_words(&mut jieba, "# header\n\n量子计算 5000 n\n  边缘推理  \n");
        assert_eq!(added, 2);
        let tokens: Vec<&str> = jieba.cut("量子计算", true);
        assert_eq!(tokens, vec!["量子计算"]);
    }

    #[test]
    fn bundled_dictionary_is_not_empty() {
        assert!(add_user_words(&mut Jieba::new(), USER_DICT) > 10);
    }

    #[test]
    fn jieba_is_deterministic() {
        let text = "人工智能是计算机科学的一个分支。";
        assert_eq!(JIEBA.segment(text).unwrap(), JIEBA.segment(text).unwrap());
    }

    #[test]
    fn parses_segmenter_kind() {
        assert_eq!("Jieba".parse::<SegmenterKind>(), Ok(SegmenterKind::Jieba));
        assert_eq!(
            " whitespace ".parse::<SegmenterKind>(),
            Ok(SegmenterKind::Whitespace)
        );
        assert!("ngram".parse::<SegmenterKind>().is_err());
    }
}
