//! Find-in-page over analyzed page text
//!
//! Matches are located in the page's character sequence and mapped back to
//! one highlight rectangle per visual line, the same way a selection is.

use crate::config::SearchConfig;
use crate::fuzzy::{fold_case, fuzzy_search_chars};
use crate::geometry::TextBoundingBox;
use crate::page_cache::PageText;
use crate::selection::line_rects;
use log::debug;
use serde::{Deserialize, Serialize};

/// A match on one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub page_number: u32,
    /// First matched char index
    pub char_start: usize,
    /// One past the last matched char index
    pub char_end: usize,
    pub text: String,
    pub rects: Vec<TextBoundingBox>,
    /// 0 for exact matches
    pub edit_distance: usize,
    pub similarity: f64,
}

impl SearchHit {
    pub fn len(&self) -> usize {
        self.char_end - self.char_start
    }

    pub fn is_empty(&self) -> bool {
        self.char_start == self.char_end
    }

    /// Union of the per-line rects, for scrolling a hit into view
    pub fn bounds(&self) -> Option<TextBoundingBox> {
        let (first, rest) = self.rects.split_first()?;
        Some(rest.iter().fold(*first, |acc, rect| acc.union(rect)))
    }
}

pub struct PageSearch;

impl PageSearch {
    /// Exact or fuzzy search honouring the case and whole-word settings of
    /// `config`
    pub fn find(page: &PageText, query: &str, fuzzy: bool, config: &SearchConfig) -> Vec<SearchHit> {
        let hits = if fuzzy {
            Self::find_fuzzy(page, query, config.max_distance, config.case_sensitive)
        } else {
            Self::find_exact(page, query, config.case_sensitive)
        };

        if config.whole_words {
            Self::whole_words_only(page, hits)
        } else {
            hits
        }
    }

    /// Drop hits that start or end inside a word
    pub fn whole_words_only(page: &PageText, hits: Vec<SearchHit>) -> Vec<SearchHit> {
        hits.into_iter()
            .filter(|hit| {
                page.layout.is_word_boundary(hit.char_start)
                    && page.layout.is_word_boundary(hit.char_end)
            })
            .collect()
    }

    /// Every occurrence of `query` on the page. Occurrences may overlap.
    pub fn find_exact(page: &PageText, query: &str, case_sensitive: bool) -> Vec<SearchHit> {
        let chars = page.index.chars();
        let needle: Vec<char> = if case_sensitive {
            query.chars().collect()
        } else {
            query.chars().map(fold_case).collect()
        };

        if needle.is_empty() || needle.len() > chars.len() {
            return Vec::new();
        }

        let haystack: Vec<char> = if case_sensitive {
            chars.clone()
        } else {
            chars.iter().copied().map(fold_case).collect()
        };

        let hits: Vec<SearchHit> = haystack
            .windows(needle.len())
            .enumerate()
            .filter(|(_, window)| *window == needle.as_slice())
            .map(|(start, _)| {
                let end = start + needle.len();
                SearchHit {
                    page_number: page.page_number(),
                    char_start: start,
                    char_end: end,
                    text: chars[start..end].iter().collect(),
                    rects: line_rects(page, start, end - 1),
                    edit_distance: 0,
                    similarity: 1.0,
                }
            })
            .collect();

        debug!(
            "exact search on page {} found {} hits",
            page.page_number(),
            hits.len()
        );
        hits
    }

    /// Typo-tolerant search over the page text, in document order
    pub fn find_fuzzy(
        page: &PageText,
        query: &str,
        max_distance: usize,
        case_sensitive: bool,
    ) -> Vec<SearchHit> {
        let chars = page.index.chars();
        let (haystack, needle): (Vec<char>, Vec<char>) = if case_sensitive {
            (chars.clone(), query.chars().collect())
        } else {
            (
                chars.iter().copied().map(fold_case).collect(),
                query.chars().map(fold_case).collect(),
            )
        };

        let hits: Vec<SearchHit> = fuzzy_search_chars(&haystack, &needle, max_distance)
            .into_iter()
            .map(|m| {
                let end = m.position + m.length;
                SearchHit {
                    page_number: page.page_number(),
                    char_start: m.position,
                    char_end: end,
                    text: chars[m.position..end].iter().collect(),
                    rects: line_rects(page, m.position, end - 1),
                    edit_distance: m.edit_distance,
                    similarity: m.similarity,
                }
            })
            .collect();

        debug!(
            "fuzzy search on page {} found {} hits",
            page.page_number(),
            hits.len()
        );
        hits
    }
}

/// Results of one query across pages, with a cursor for next/previous
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    query: String,
    hits: Vec<SearchHit>,
    active: Option<usize>,
}

impl SearchResults {
    pub fn new(query: impl Into<String>, hits: Vec<SearchHit>) -> Self {
        Self {
            query: query.into(),
            hits,
            active: None,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn hits(&self) -> &[SearchHit] {
        &self.hits
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn extend(&mut self, hits: impl IntoIterator<Item = SearchHit>) {
        self.hits.extend(hits);
    }

    /// Advance to the next hit, wrapping to the first
    pub fn next_result(&mut self) -> Option<&SearchHit> {
        if self.hits.is_empty() {
            return None;
        }
        let index = match self.active {
            Some(idx) => (idx + 1) % self.hits.len(),
            None => 0,
        };
        self.active = Some(index);
        self.hits.get(index)
    }

    /// Step back to the previous hit, wrapping to the last
    pub fn previous_result(&mut self) -> Option<&SearchHit> {
        if self.hits.is_empty() {
            return None;
        }
        let index = match self.active {
            Some(0) | None => self.hits.len() - 1,
            Some(idx) => idx - 1,
        };
        self.active = Some(index);
        self.hits.get(index)
    }

    pub fn active(&self) -> Option<&SearchHit> {
        self.active.and_then(|idx| self.hits.get(idx))
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn results_for_page(&self, page_number: u32) -> Vec<&SearchHit> {
        self.hits
            .iter()
            .filter(|hit| hit.page_number == page_number)
            .collect()
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.hits.clear();
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectionConfig;
    use crate::test_support::page_boxes;

    fn page(number: u32, lines: &[&str]) -> PageText {
        PageText::from_boxes(number, &page_boxes(lines), &SelectionConfig::default())
    }

    fn whole_words() -> SearchConfig {
        SearchConfig {
            whole_words: true,
            ..SearchConfig::default()
        }
    }

    #[test]
    fn test_find_exact_basic() {
        let page = page(0, &["hello world"]);
        let hits = PageSearch::find_exact(&page, "world", true);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].char_start, 6);
        assert_eq!(hits[0].char_end, 11);
        assert_eq!(hits[0].text, "world");
        assert_eq!(hits[0].rects, vec![TextBoundingBox::new(60.0, 0.0, 50.0, 12.0)]);
    }

    #[test]
    fn test_find_exact_case_insensitive() {
        let page = page(0, &["Hello HELLO hello"]);

        assert_eq!(PageSearch::find_exact(&page, "hello", false).len(), 3);
        assert_eq!(PageSearch::find_exact(&page, "hello", true).len(), 1);

        let hits = PageSearch::find_exact(&page, "HELLO", false);
        assert_eq!(hits[0].text, "Hello");
    }

    #[test]
    fn test_find_exact_allows_overlap() {
        let page = page(0, &["aaaa"]);
        let starts: Vec<usize> = PageSearch::find_exact(&page, "aa", true)
            .iter()
            .map(|hit| hit.char_start)
            .collect();
        assert_eq!(starts, vec![0, 1, 2]);
    }

    #[test]
    fn test_find_exact_across_lines() {
        let page = page(0, &["ab", "cd"]);
        let hits = PageSearch::find_exact(&page, "bc", true);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].rects.len(), 2);
        assert_eq!(
            hits[0].bounds(),
            Some(TextBoundingBox::new(0.0, 0.0, 20.0, 32.0))
        );
    }

    #[test]
    fn test_find_exact_empty_inputs() {
        let page = page(0, &["text"]);
        assert!(PageSearch::find_exact(&page, "", true).is_empty());
        assert!(PageSearch::find_exact(&page, "much longer than text", true).is_empty());

        let empty = PageText::from_boxes(0, &[], &SelectionConfig::default());
        assert!(PageSearch::find_exact(&empty, "a", false).is_empty());
    }

    #[test]
    fn test_find_fuzzy_attaches_rects() {
        let page = page(2, &["please recieve it"]);
        let hits = PageSearch::find_fuzzy(&page, "receive", 2, true);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].page_number, 2);
        assert_eq!(hits[0].char_start, 7);
        assert_eq!(hits[0].len(), 7);
        assert_eq!(hits[0].edit_distance, 2);
        assert_eq!(hits[0].rects, vec![TextBoundingBox::new(70.0, 0.0, 70.0, 12.0)]);
    }

    #[test]
    fn test_find_fuzzy_folds_case() {
        let page = page(0, &["The DOCUMNT title"]);

        assert!(PageSearch::find_fuzzy(&page, "document", 1, true).is_empty());

        let hits = PageSearch::find_fuzzy(&page, "document", 1, false);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "DOCUMNT");
        assert_eq!(hits[0].char_start, 4);
    }

    #[test]
    fn test_whole_words_filter() {
        let page = page(0, &["cat concat cat.", "scatter cat"]);
        let config = whole_words();

        let all = PageSearch::find(&page, "cat", false, &SearchConfig::default());
        assert_eq!(all.len(), 5);

        let starts: Vec<usize> = PageSearch::find(&page, "cat", false, &config)
            .iter()
            .map(|hit| hit.char_start)
            .collect();
        assert_eq!(starts, vec![0, 11, 23]);
    }

    #[test]
    fn test_whole_words_at_line_edges() {
        let page = page(0, &["end", "start"]);
        let config = whole_words();

        assert_eq!(PageSearch::find(&page, "end", false, &config).len(), 1);
        assert_eq!(PageSearch::find(&page, "start", false, &config).len(), 1);
        assert!(PageSearch::find(&page, "star", false, &config).is_empty());
    }

    #[test]
    fn test_find_fuzzy_whole_words() {
        let page = page(0, &["bat batch"]);
        let config = SearchConfig {
            max_distance: 1,
            whole_words: true,
            ..SearchConfig::default()
        };

        let hits = PageSearch::find(&page, "cat", true, &config);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "bat");
        assert_eq!(hits[0].char_start, 0);
    }

    #[test]
    fn test_results_navigation_wraps() {
        let first = page(0, &["cat dog cat"]);
        let second = page(1, &["cat"]);

        let mut results = SearchResults::new("cat", PageSearch::find_exact(&first, "cat", true));
        results.extend(PageSearch::find_exact(&second, "cat", true));
        assert_eq!(results.len(), 3);
        assert!(results.active().is_none());

        assert_eq!(results.next_result().map(|h| h.char_start), Some(0));
        assert_eq!(results.next_result().map(|h| h.char_start), Some(8));
        assert_eq!(results.next_result().map(|h| h.page_number), Some(1));
        assert_eq!(results.next_result().map(|h| (h.page_number, h.char_start)), Some((0, 0)));
        assert_eq!(results.previous_result().map(|h| h.page_number), Some(1));
        assert_eq!(results.active_index(), Some(2));
    }

    #[test]
    fn test_previous_from_start_goes_to_last() {
        let page = page(0, &["a b a"]);
        let mut results = SearchResults::new("a", PageSearch::find_exact(&page, "a", true));
        assert_eq!(results.previous_result().map(|h| h.char_start), Some(4));
    }

    #[test]
    fn test_results_for_page() {
        let first = page(0, &["x y x"]);
        let second = page(1, &["x"]);

        let mut results = SearchResults::new("x", PageSearch::find_exact(&first, "x", true));
        results.extend(PageSearch::find_exact(&second, "x", true));

        assert_eq!(results.results_for_page(0).len(), 2);
        assert_eq!(results.results_for_page(1).len(), 1);
        assert!(results.results_for_page(7).is_empty());
    }

    #[test]
    fn test_empty_results_navigation() {
        let mut results = SearchResults::default();
        assert!(results.next_result().is_none());
        assert!(results.previous_result().is_none());

        results.clear();
        assert!(results.is_empty());
        assert_eq!(results.query(), "");
    }
}
