use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::segmenter::Segmenter;
use super::AnalysisFault;

/// High-frequency function words excluded from ranking.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "的", "了", "在", "是", "我", "有", "和", "就", "不", "人", "都", "一", "一个", "上", "也",
        "很", "到", "说", "要", "去", "你", "会", "着", "没有", "看", "好", "自己", "这", "那",
        "里", "为", "以", "个", "用", "来", "他", "她", "它", "们", "这个", "那个", "什么",
        "怎么", "可以", "但是", "如果", "因为", "所以", "虽然", "然而", "而且", "或者", "并且",
        "但", "与", "及", "等", "等等", "之", "于", "对", "从", "把", "被", "让", "给", "向",
        "往", "由", "将", "得", "地", "得到", "进行", "通过", "根据", "按照", "关于",
    ]
    .into_iter()
    .collect()
});

/// Characters that never make a keyword on their own.
const NOISE_CHARS: &[char] = &[
    '，', '。', '！', '？', '、', '；', '：', '“', '”', '‘', '’', '（', '）', '【', '】', '《', '》',
    '\n', '\t', ' ', ',', '.', '!', '?', ';', ':', '\'', '"', '(', ')', '[', ']', '<', '>',
];

/// Ranks tokens by frequency using an injected segmenter.
#[derive(Clone)]
pub struct KeywordRanker {
    segmenter: Arc<dyn Segmenter>,
}

impl KeywordRanker {
    pub fn new(segmenter: Arc<dyn Segmenter>) -> Self {
        Self { segmenter }
    }

    /// Returns at most `top_n` keywords, most frequent first. Ties keep the
    /// order in which the tokens were first seen.
    pub fn extract_keywords(&self, text: &str, top_n: usize) -> Result<Vec<String>, AnalysisFault> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let tokens = self.segmenter.segment(text)?;
        let candidates = tokens
            .iter()
            .map(|token| token.trim())
            .filter(|token| is_candidate(token));
        Ok(rank_by_frequency(candidates, top_n))
    }
}

fn is_candidate(token: &str) -> bool {
    token.chars().count() >= 2
        && !STOPWORDS.contains(token)
        && !token.chars().all(is_decimal_digit)
        && !token.chars().all(|c| NOISE_CHARS.contains(&c) || c.is_whitespace())
}

/// ASCII and fullwidth decimal digits. Fractions, Roman numerals and 〇 are
/// numeric but not digits, so tokens made of them stay candidates.
fn is_decimal_digit(c: char) -> bool {
    c.is_ascii_digit() || ('０'..='９').contains(&c)
}

/// Counts tokens and returns the `top_n` most frequent, ties in first-seen order.
pub(crate) fn rank_by_frequency<'a>(
    tokens: impl IntoIterator<Item = &'a str>,
    top_n: usize,
) -> Vec<String> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for token in tokens {
        match index.get(token) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(token, counts.len());
                counts.push((token, 1));
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(top_n)
        .map(|(token, _)| token.to_string())
        .collect()
}
