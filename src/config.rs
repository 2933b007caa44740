//! Application configuration.
//!
//! Values come from (lowest to highest precedence) built-in defaults, a JSON
//! config file, `PDF_EXTRACTOR_*` environment variables, and finally CLI flags
//! applied by `main`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::analyzer::headings::HeadingRules;
use crate::analyzer::AnalyzerSettings;
use crate::error::{PdfExtractionError, Result};

pub const ENV_PREFIX: &str = "PDF_EXTRACTOR_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub extract_key_info: bool,
    pub max_keywords: usize,
    pub summary_max_length: usize,
    pub heading_max_line_chars: usize,
    pub heading_max_soft_punctuation: usize,
    /// `jieba` or `whitespace`
    pub segmenter: String,
    pub default_output_format: String,
    /// Pages above which `--progress` reports per-page progress
    pub show_progress_threshold: usize,
    pub log_level: String,
    pub log_to_file: bool,
    pub log_file_path: Option<PathBuf>,
    /// Upper bound for a single MCP tool call
    pub tool_timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            extract_key_info: true,
            max_keywords: 10,
            summary_max_length: 200,
            heading_max_line_chars: 50,
            heading_max_soft_punctuation: 1,
            segmenter: "jieba".to_string(),
            default_output_format: "text".to_string(),
            show_progress_threshold: 5,
            log_level: "warn".to_string(),
            log_to_file: false,
            log_file_path: None,
            tool_timeout_secs: 120,
        }
    }
}

impl ExtractionConfig {
    pub fn analyzer_settings(&self) -> AnalyzerSettings {
        AnalyzerSettings {
            top_n: self.max_keywords,
            summary_max_length: self.summary_max_length,
            heading_rules: HeadingRules {
                max_line_chars: self.heading_max_line_chars,
                max_soft_punctuation: self.heading_max_soft_punctuation,
            },
            ..AnalyzerSettings::default()
        }
    }

    /// Applies `PDF_EXTRACTOR_*` overrides read through `lookup`.
    /// Unparsable numbers are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let flag = |name: &str| {
            var(name).map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
        };
        let number = |name: &str| {
            var(name).and_then(|v| match v.trim().parse::<usize>() {
                Ok(n) => Some(n),
                Err(_) => {
                    warn!(target: "config", variable = name, value = %v, "Ignoring non-numeric environment override");
                    None
                }
            })
        };

        if let Some(v) = flag("EXTRACT_KEY_INFO") {
            self.extract_key_info = v;
        }
        if let Some(v) = flag("LOG_TO_FILE") {
            self.log_to_file = v;
        }
        if let Some(v) = number("MAX_KEYWORDS") {
            self.max_keywords = v;
        }
        if let Some(v) = number("SUMMARY_MAX_LENGTH") {
            self.summary_max_length = v;
        }
        if let Some(v) = number("SHOW_PROGRESS_THRESHOLD") {
            self.show_progress_threshold = v;
        }
        if let Some(v) = number("HEADING_MAX_LINE_CHARS") {
            self.heading_max_line_chars = v;
        }
        if let Some(v) = number("HEADING_MAX_SOFT_PUNCTUATION") {
            self.heading_max_soft_punctuation = v;
        }
        if let Some(v) = number("TOOL_TIMEOUT_SECS") {
            self.tool_timeout_secs = v as u64;
        }
        if let Some(v) = var("SEGMENTER") {
            self.segmenter = v;
        }
        if let Some(v) = var("DEFAULT_OUTPUT_FORMAT") {
            self.default_output_format = v;
        }
        if let Some(v) = var("LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = var("LOG_FILE_PATH") {
            self.log_file_path = Some(PathBuf::from(v));
        }
    }
}

/// Loads, holds and saves the configuration.
#[derive(Debug)]
pub struct ConfigManager {
    config: ExtractionConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Default locations, searched in order.
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".pdf_extractor").join("config.json"));
        }
        paths.push(PathBuf::from("pdf_extractor_config.json"));
        paths
    }

    /// Loads the file (if any) and applies environment overrides.
    pub fn load(config_path: Option<&Path>) -> Self {
        Self::from_sources(config_path, &Self::default_paths(), |name| {
            std::env::var(name).ok()
        })
    }

    fn from_sources<F>(explicit: Option<&Path>, defaults: &[PathBuf], lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ExtractionConfig::default();

        if let Some(path) = Self::find_config_file(explicit, defaults) {
            match Self::read_file(&path) {
                Ok(loaded) => {
                    debug!(target: "config", path = %path.display(), "Loaded configuration file");
                    config = loaded;
                }
                Err(e) => {
                    warn!(target: "config", "{}; using defaults", e);
                }
            }
        }

        config.apply_env(lookup);
        Self {
            config,
            config_path: explicit.map(Path::to_path_buf),
        }
    }

    fn find_config_file(explicit: Option<&Path>, defaults: &[PathBuf]) -> Option<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Some(path.to_path_buf());
            }
            warn!(target: "config", path = %path.display(), "Configuration file not found, falling back to default locations");
        }
        defaults.iter().find(|p| p.exists()).cloned()
    }

    fn read_file(path: &Path) -> Result<ExtractionConfig> {
        let config_err = |reason: String| PdfExtractionError::Config {
            path: path.to_path_buf(),
            reason,
        };
        let raw = fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| config_err(e.to_string()))
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ExtractionConfig {
        &mut self.config
    }

    pub fn into_config(self) -> ExtractionConfig {
        self.config
    }

    pub fn reset_to_defaults(&mut self) {
        self.config = ExtractionConfig::default();
    }

    /// Writes the configuration as pretty JSON. Without an explicit path the
    /// loaded path is used, then the per-user default.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let target = path
            .map(Path::to_path_buf)
            .or_else(|| self.config_path.clone())
            .or_else(|| Self::default_paths().into_iter().next())
            .ok_or_else(|| PdfExtractionError::InvalidPath("no configuration path".into()))?;

        let save_err = |reason: String| PdfExtractionError::Save {
            path: target.clone(),
            reason,
        };
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| save_err(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(&self.config).map_err(|e| save_err(e.to_string()))?;
        fs::write(&target, json).map_err(|e| save_err(e.to_string()))?;
        Ok(target)
    }
}
