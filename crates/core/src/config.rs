//! Viewer text configuration
//!
//! Tunables for selection layout analysis, search and the per-page text
//! cache. Configuration can be loaded from a TOML file, overridden from
//! environment variables, or created programmatically.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Layout heuristics used when segmenting a page into lines and words
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Two consecutive glyphs sit on different lines when their tops differ
    /// by more than this fraction of the taller glyph's height.
    pub line_break_ratio: f32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            line_break_ratio: 0.5,
        }
    }
}

/// Search defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum edit distance accepted by fuzzy search
    pub max_distance: usize,
    /// Stop collecting word-mode fuzzy matches after this many (0 = unlimited)
    pub max_results: usize,
    /// Whether searches compare characters case-sensitively
    pub case_sensitive: bool,
    /// Keep only matches that start and end on word boundaries
    pub whole_words: bool,
    /// Characters of surrounding text kept on each side of a word match
    pub context_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_distance: 2,
            max_results: 100,
            case_sensitive: false,
            whole_words: false,
            context_chars: 50,
        }
    }
}

/// Top-level configuration for the text core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Number of pages whose character index is kept in memory
    pub cache_capacity: usize,
    /// Maximum number of undoable highlight commands
    pub history_limit: usize,
    pub selection: SelectionConfig,
    pub search: SearchConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 16,
            history_limit: 100,
            selection: SelectionConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn with_line_break_ratio(mut self, ratio: f32) -> Self {
        self.selection.line_break_ratio = ratio;
        self
    }

    pub fn with_max_distance(mut self, max_distance: usize) -> Self {
        self.search.max_distance = max_distance;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.search.max_results = max_results;
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.search.case_sensitive = case_sensitive;
        self
    }

    pub fn with_whole_words(mut self, whole_words: bool) -> Self {
        self.search.whole_words = whole_words;
        self
    }

    pub fn with_cache_capacity(mut self, pages: usize) -> Self {
        self.cache_capacity = pages;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Loads configuration from the process environment on top of the defaults.
    ///
    /// Environment variables:
    /// - `PDF_VIEWER_LINE_BREAK_RATIO`
    /// - `PDF_VIEWER_MAX_DISTANCE`
    /// - `PDF_VIEWER_MAX_RESULTS`
    /// - `PDF_VIEWER_CASE_SENSITIVE` (`true`/`false`)
    /// - `PDF_VIEWER_WHOLE_WORDS` (`true`/`false`)
    /// - `PDF_VIEWER_CONTEXT_CHARS`
    /// - `PDF_VIEWER_CACHE_PAGES`
    /// - `PDF_VIEWER_HISTORY_LIMIT`
    pub fn from_env() -> ConfigResult<Self> {
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up through `lookup`, then validates.
    pub fn apply_env<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("PDF_VIEWER_LINE_BREAK_RATIO") {
            self.selection.line_break_ratio = parse_key("PDF_VIEWER_LINE_BREAK_RATIO", &val)?;
        }
        if let Some(val) = lookup("PDF_VIEWER_MAX_DISTANCE") {
            self.search.max_distance = parse_key("PDF_VIEWER_MAX_DISTANCE", &val)?;
        }
        if let Some(val) = lookup("PDF_VIEWER_MAX_RESULTS") {
            self.search.max_results = parse_key("PDF_VIEWER_MAX_RESULTS", &val)?;
        }
        if let Some(val) = lookup("PDF_VIEWER_CASE_SENSITIVE") {
            self.search.case_sensitive = parse_key("PDF_VIEWER_CASE_SENSITIVE", &val)?;
        }
        if let Some(val) = lookup("PDF_VIEWER_WHOLE_WORDS") {
            self.search.whole_words = parse_key("PDF_VIEWER_WHOLE_WORDS", &val)?;
        }
        if let Some(val) = lookup("PDF_VIEWER_CONTEXT_CHARS") {
            self.search.context_chars = parse_key("PDF_VIEWER_CONTEXT_CHARS", &val)?;
        }
        if let Some(val) = lookup("PDF_VIEWER_CACHE_PAGES") {
            self.cache_capacity = parse_key("PDF_VIEWER_CACHE_PAGES", &val)?;
        }
        if let Some(val) = lookup("PDF_VIEWER_HISTORY_LIMIT") {
            self.history_limit = parse_key("PDF_VIEWER_HISTORY_LIMIT", &val)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Loads configuration from a TOML file.
    ///
    /// Expected file format (every key optional):
    /// ```toml
    /// cache_capacity = 16
    /// history_limit = 100
    ///
    /// [selection]
    /// line_break_ratio = 0.5
    ///
    /// [search]
    /// max_distance = 2
    /// max_results = 100
    /// case_sensitive = false
    /// whole_words = false
    /// context_chars = 50
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let contents = toml::to_string(self)?;
        fs::write(path.as_ref(), contents)?;
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let ratio = self.selection.line_break_ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(ConfigError::InvalidValue("selection.line_break_ratio".to_string()));
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::InvalidValue("cache_capacity".to_string()));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::InvalidValue("history_limit".to_string()));
        }
        Ok(())
    }
}

fn parse_key<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}
