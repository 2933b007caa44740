//! Key information analysis: headings, keywords, summary and list items.
//!
//! The four analyses are independent pure functions over the same text. The
//! orchestrator runs each one behind its own fault boundary, so a failing
//! analysis only empties its own field.

pub mod headings;
pub mod keywords;
pub mod lists;
pub mod segmenter;
pub mod summary;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::KeyInformation;
use headings::HeadingRules;
use keywords::KeywordRanker;
use segmenter::Segmenter;

/// Failure of a single sub-analysis.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisFault {
    #[error("segmentation failed: {0}")]
    Segmentation(String),

    #[error("{analysis} analysis panicked: {message}")]
    Panicked {
        analysis: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerSettings {
    pub top_n: usize,
    pub summary_max_length: usize,
    pub heading_rules: HeadingRules,
    /// Inputs of at least this many UTF-8 bytes run the four analyses in parallel
    pub parallel_threshold_bytes: usize,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            top_n: 10,
            summary_max_length: 200,
            heading_rules: HeadingRules::default(),
            parallel_threshold_bytes: 64 * 1024,
        }
    }
}

/// Per-analysis outcomes before they are merged into [`KeyInformation`].
#[derive(Debug)]
pub struct AnalysisReport {
    pub headings: Result<Vec<String>, AnalysisFault>,
    pub keywords: Result<Vec<String>, AnalysisFault>,
    pub summary: Result<String, AnalysisFault>,
    pub lists: Result<Vec<String>, AnalysisFault>,
}

impl AnalysisReport {
    pub fn faults(&self) -> Vec<&AnalysisFault> {
        [
            self.headings.as_ref().err(),
            self.keywords.as_ref().err(),
            self.summary.as_ref().err(),
            self.lists.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Merges the outcomes, replacing each failure with an empty field.
    pub fn into_key_information(self) -> KeyInformation {
        KeyInformation {
            headings: or_empty("headings", self.headings),
            keywords: or_empty("keywords", self.keywords),
            summary: or_empty("summary", self.summary),
            lists: or_empty("lists", self.lists),
        }
    }
}

fn or_empty<T: Default>(field: &str, outcome: Result<T, AnalysisFault>) -> T {
    outcome.unwrap_or_else(|fault| {
        warn!(target: "key_info", field = field, "Key information analysis failed, returning partial result: {}", fault);
        T::default()
    })
}

pub struct KeyInfoAnalyzer {
    settings: AnalyzerSettings,
    keywords: KeywordRanker,
}

impl KeyInfoAnalyzer {
    pub fn new(segmenter: Arc<dyn Segmenter>, settings: AnalyzerSettings) -> Self {
        Self {
            settings,
            keywords: KeywordRanker::new(segmenter),
        }
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    /// Same segmenter, different limits.
    pub fn with_settings(&self, settings: AnalyzerSettings) -> Self {
        Self {
            settings,
            keywords: self.keywords.clone(),
        }
    }

    pub fn extract_headings(&self, text: &str) -> Vec<String> {
        headings::detect_headings(text, &self.settings.heading_rules)
    }

    pub fn extract_keywords(&self, text: &str, top_n: usize) -> Result<Vec<String>, AnalysisFault> {
        self.keywords.extract_keywords(text, top_n)
    }

    pub fn generate_summary(&self, text: &str, max_length: usize) -> String {
        summary::generate_summary(text, max_length)
    }

    pub fn extract_lists(&self, text: &str) -> Vec<String> {
        lists::extract_lists(text)
    }

    /// Runs all four analyses. Never fails; faulty analyses leave their field empty.
    pub fn analyze(&self, text: &str) -> KeyInformation {
        let report = self.analyze_detailed(text);
        let failed = report.faults().len();
        let info = report.into_key_information();
        debug!(
            target: "key_info",
            failed,
            headings = info.headings.len(),
            keywords = info.keywords.len(),
            summary_chars = info.summary.chars().count(),
            lists = info.lists.len(),
            "Key information analysis completed"
        );
        info
    }

    /// Counts UTF-8 bytes, not characters.
    fn runs_in_parallel(&self, text: &str) -> bool {
        text.len() >= self.settings.parallel_threshold_bytes
    }

    pub fn analyze_detailed(&self, text: &str) -> AnalysisReport {
        let settings = &self.settings;
        let headings = || isolate("headings", || Ok(self.extract_headings(text)));
        let keywords = || isolate("keywords", || self.extract_keywords(text, settings.top_n));
        let summary = || {
            isolate("summary", || {
                Ok(self.generate_summary(text, settings.summary_max_length))
            })
        };
        let lists = || isolate("lists", || Ok(self.extract_lists(text)));

        if self.runs_in_parallel(text) {
            debug!(target: "key_info", bytes = text.len(), "Running analyses in parallel");
            let ((headings, keywords), (summary, lists)) = rayon::join(
                || rayon::join(headings, keywords),
                || rayon::join(summary, lists),
            );
            AnalysisReport {
                headings,
                keywords,
                summary,
                lists,
            }
        } else {
            AnalysisReport {
                headings: headings(),
                keywords: keywords(),
                summary: summary(),
                lists: lists(),
            }
        }
    }
}

/// Runs one analysis, turning a panic into [`AnalysisFault::Panicked`].
fn isolate<T>(
    analysis: &'static str,
    run: impl FnOnce() -> Result<T, AnalysisFault>,
) -> Result<T, AnalysisFault> {
    panic::catch_unwind(AssertUnwindSafe(run)).unwrap_or_else(|payload| {
        Err(AnalysisFault::Panicked {
            analysis,
            message: panic_message(payload.as_ref()),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
