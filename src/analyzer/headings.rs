//! Heading detection over line-oriented text.
//!
//! Each non-blank line is run through a fixed cascade of rules. The first
//! rule that matches classifies the line; later rules are never consulted.

use once_cell::sync::Lazy;
use regex::Regex;

/// Sentence-terminal punctuation, CJK and Latin.
pub(crate) const SENTENCE_TERMINALS: &[char] = &['。', '？', '！', '.', '?', '!'];

/// Punctuation that shows up inside titles but rarely more than once.
const SOFT_PUNCTUATION: &[char] = &['，', ',', '、', '；', ';', '：', ':'];

static NUMBERED_HEADING_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\d+\.\s+",
        r"^\d+\.\d+\s+",
        r"^第[一二三四五六七八九十百千万\d]+(?:章|节|条|款|部分)\s*",
        r"^[一二三四五六七八九十百千万]+[、\s]",
        r"^\(\d+\)",
        r"^\[\d+\]",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid numbered heading regex"))
    .collect()
});

/// Thresholds for the short-line rule. Empirical values tuned on mixed
/// Chinese/English prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingRules {
    /// Lines must be strictly shorter than this many characters
    pub max_line_chars: usize,
    pub max_soft_punctuation: usize,
}

impl Default for HeadingRules {
    fn default() -> Self {
        Self {
            max_line_chars: 50,
            max_soft_punctuation: 1,
        }
    }
}

/// The rule that classified a line as a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingRule {
    AllUppercase,
    ShortLine,
    Numbered,
}

/// Evaluation order. Do not reorder: a line can satisfy several rules.
const CASCADE: [HeadingRule; 3] = [
    HeadingRule::AllUppercase,
    HeadingRule::ShortLine,
    HeadingRule::Numbered,
];

impl HeadingRule {
    fn matches(self, line: &str, rules: &HeadingRules) -> bool {
        match self {
            HeadingRule::AllUppercase => line.chars().count() >= 2 && is_all_uppercase(line),
            HeadingRule::ShortLine => {
                line.chars().count() < rules.max_line_chars
                    && !line.ends_with(SENTENCE_TERMINALS)
                    && line.chars().filter(|c| SOFT_PUNCTUATION.contains(c)).count()
                        <= rules.max_soft_punctuation
            }
            HeadingRule::Numbered => NUMBERED_HEADING_PATTERNS.iter().any(|re| re.is_match(line)),
        }
    }
}

/// Uppercase in the case-aware sense: at least one cased character and no
/// lowercase ones. Uncased scripts (CJK) neither help nor hurt.
fn is_all_uppercase(line: &str) -> bool {
    let mut saw_upper = false;
    for c in line.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            saw_upper = true;
        }
    }
    saw_upper
}

/// Classifies an already-trimmed line.
pub fn classify_heading(line: &str, rules: &HeadingRules) -> Option<HeadingRule> {
    if line.is_empty() {
        return None;
    }
    CASCADE.into_iter().find(|rule| rule.matches(line, rules))
}

/// Returns heading lines, trimmed, in document order. Duplicates are kept.
pub fn detect_headings(text: &str, rules: &HeadingRules) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| classify_heading(line, rules).is_some())
        .map(str::to_string)
        .collect()
}
