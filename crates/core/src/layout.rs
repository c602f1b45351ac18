//! Line and word segmentation of a page's character sequence
//!
//! Each glyph gets two flags relative to its predecessor:
//! - line break: the tops of the two boxes differ by more than
//!   `line_break_ratio` times the taller box's height
//! - word break: either glyph is whitespace or punctuation
//!
//! Glyph 0 never carries a flag.

use crate::char_index::CharacterIndex;
use crate::config::SelectionConfig;
use log::debug;

/// Per-glyph line-break and word-break flags for one page
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutAnalyzer {
    line_breaks: Vec<bool>,
    word_breaks: Vec<bool>,
    chars: Vec<char>,
}

impl LayoutAnalyzer {
    pub fn analyze(index: &CharacterIndex, config: &SelectionConfig) -> Self {
        let glyphs = index.glyphs();
        let mut line_breaks = vec![false; glyphs.len()];
        let mut word_breaks = vec![false; glyphs.len()];

        for i in 1..glyphs.len() {
            let prev = &glyphs[i - 1];
            let curr = &glyphs[i];

            let y_diff = (curr.bbox.top() - prev.bbox.top()).abs();
            let line_height = prev.bbox.height.max(curr.bbox.height);
            if y_diff > line_height * config.line_break_ratio {
                line_breaks[i] = true;
            }

            if is_separator(prev.character) || is_separator(curr.character) {
                word_breaks[i] = true;
            }
        }

        debug!(
            "analyzed layout for page {}: {} lines",
            index.page_number(),
            if glyphs.is_empty() {
                0
            } else {
                1 + line_breaks.iter().filter(|b| **b).count()
            }
        );

        Self {
            line_breaks,
            word_breaks,
            chars: index.chars(),
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Whether glyph `index` starts a new visual line
    pub fn is_line_break(&self, index: usize) -> bool {
        index > 0 && self.line_breaks.get(index).copied().unwrap_or(false)
    }

    /// Whether a word boundary lies between glyph `index - 1` and `index`
    pub fn is_word_break(&self, index: usize) -> bool {
        index > 0 && self.word_breaks.get(index).copied().unwrap_or(false)
    }

    /// Whether a whole word may start or end at `index`: the page edges,
    /// the start of a visual line, or a word break
    pub fn is_word_boundary(&self, index: usize) -> bool {
        index == 0 || index >= self.len() || self.is_word_break(index) || self.is_line_break(index)
    }

    /// Number of visual lines on the page
    pub fn line_count(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            1 + self.line_breaks.iter().filter(|b| **b).count()
        }
    }

    /// Inclusive range of the word containing `index`, without surrounding
    /// whitespace or punctuation.
    ///
    /// Returns `None` when `index` is out of range or sits on a separator with
    /// no word characters around it.
    pub fn find_word_boundaries(&self, index: usize) -> Option<(usize, usize)> {
        if index >= self.len() {
            return None;
        }

        let mut start = index;
        while start > 0 && !self.word_breaks[start] {
            start -= 1;
        }
        if is_separator(self.chars[start]) {
            start += 1;
        }

        let mut end = index;
        while end + 1 < self.len() && !self.word_breaks[end + 1] {
            end += 1;
        }
        if is_separator(self.chars[end]) {
            end = end.checked_sub(1)?;
        }

        (start <= end).then_some((start, end))
    }

    /// Inclusive range of the visual line containing `index`
    pub fn find_line_boundaries(&self, index: usize) -> Option<(usize, usize)> {
        if index >= self.len() {
            return None;
        }

        let mut start = index;
        while start > 0 && !self.line_breaks[start] {
            start -= 1;
        }

        let mut end = index;
        while end + 1 < self.len() && !self.line_breaks[end + 1] {
            end += 1;
        }

        Some((start, end))
    }
}

/// Whitespace or punctuation
pub fn is_separator(c: char) -> bool {
    c.is_whitespace() || is_punctuation(c)
}

/// Punctuation in the Unicode sense: connectors, dashes, brackets, quotes and
/// other marks. Math and currency symbols are not punctuation.
pub fn is_punctuation(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_punctuation()
            && !matches!(c, '$' | '+' | '<' | '=' | '>' | '^' | '`' | '|' | '~');
    }

    matches!(
        c,
        '¡' | '§' | '«' | '¶' | '·' | '»' | '¿'
            | '\u{2010}'..='\u{2027}'
            | '\u{2030}'..='\u{2043}'
            | '\u{2045}'..='\u{2051}'
            | '\u{2053}'..='\u{205E}'
            | '\u{3001}'..='\u{3003}'
            | '\u{3008}'..='\u{3011}'
            | '\u{3014}'..='\u{301F}'
            | '\u{FF01}'..='\u{FF03}'
            | '\u{FF05}'..='\u{FF0A}'
            | '\u{FF0C}'..='\u{FF0F}'
            | '\u{FF1A}'
            | '\u{FF1B}'
            | '\u{FF1F}'
            | '\u{FF20}'
    )
}
