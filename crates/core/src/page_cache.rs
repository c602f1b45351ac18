//! Per-page text memoization
//!
//! Extraction and layout analysis run once per page. [`PageTextCache`] keeps
//! the most recently used pages and drops the rest, mirroring a page being
//! unloaded by the viewer.

use crate::char_index::CharacterIndex;
use crate::config::SelectionConfig;
use crate::error::ExtractionResult;
use crate::layout::LayoutAnalyzer;
use crate::text_source::{TextBox, TextBoxSource};
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::Arc;

/// Character index of a page together with its layout flags.
/// Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    pub index: CharacterIndex,
    pub layout: LayoutAnalyzer,
}

impl PageText {
    pub fn new(index: CharacterIndex, config: &SelectionConfig) -> Self {
        let layout = LayoutAnalyzer::analyze(&index, config);
        Self { index, layout }
    }

    pub fn from_boxes(page_number: u32, boxes: &[TextBox], config: &SelectionConfig) -> Self {
        Self::new(CharacterIndex::build(page_number, boxes), config)
    }

    pub fn from_source<S: TextBoxSource + ?Sized>(
        source: &S,
        page_number: u32,
        config: &SelectionConfig,
    ) -> ExtractionResult<Self> {
        Ok(Self::new(CharacterIndex::from_source(source, page_number)?, config))
    }

    pub fn page_number(&self) -> u32 {
        self.index.page_number()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[derive(Debug, Clone)]
struct LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    capacity: usize,
    map: HashMap<K, V>,
    order: VecDeque<K>,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            map: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        if self.map.contains_key(key) {
            self.touch(key);
        }
        self.map.get(key)
    }

    fn insert(&mut self, key: K, value: V) -> Option<K> {
        if self.map.insert(key.clone(), value).is_some() {
            self.touch(&key);
            return None;
        }

        self.order.push_back(key);

        let mut evicted = None;
        while self.map.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
                evicted = Some(oldest);
            }
        }
        evicted
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        self.detach(key);
        self.map.remove(key)
    }

    fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    /// Move `key` to the most recently used end
    fn touch(&mut self, key: &K) {
        if let Some(found) = self.detach(key) {
            self.order.push_back(found);
        }
    }

    /// Take `key` out of the recency order
    fn detach(&mut self, key: &K) -> Option<K> {
        let position = self.order.iter().position(|existing| existing == key)?;
        self.order.remove(position)
    }
}

/// Bounded cache of analyzed pages keyed by page number
#[derive(Debug, Clone)]
pub struct PageTextCache {
    config: SelectionConfig,
    pages: LruCache<u32, Arc<PageText>>,
}

impl PageTextCache {
    pub fn new(capacity: usize, config: SelectionConfig) -> Self {
        Self {
            config,
            pages: LruCache::new(capacity),
        }
    }

    /// Return the analyzed page, extracting it on first use
    pub fn get_or_build<S: TextBoxSource + ?Sized>(
        &mut self,
        source: &S,
        page_number: u32,
    ) -> ExtractionResult<Arc<PageText>> {
        if let Some(page) = self.pages.get(&page_number) {
            return Ok(Arc::clone(page));
        }

        let page = Arc::new(PageText::from_source(source, page_number, &self.config)?);
        if let Some(evicted) = self.pages.insert(page_number, Arc::clone(&page)) {
            debug!("evicted page {} from text cache", evicted);
        }
        Ok(page)
    }

    pub fn get(&mut self, page_number: u32) -> Option<Arc<PageText>> {
        self.pages.get(&page_number).cloned()
    }

    pub fn contains(&self, page_number: u32) -> bool {
        self.pages.map.contains_key(&page_number)
    }

    /// Drop a page, e.g. when the viewer unloads it
    pub fn invalidate(&mut self, page_number: u32) -> bool {
        self.pages.remove(&page_number).is_some()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    pub fn len(&self) -> usize {
        self.pages.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.pages.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use crate::test_support::page_boxes;
    use std::cell::Cell;

    struct CountingSource {
        calls: Cell<usize>,
        pages: u32,
    }

    impl TextBoxSource for CountingSource {
        fn page_count(&self) -> u32 {
            self.pages
        }

        fn text_boxes(&self, page: u32) -> ExtractionResult<Vec<TextBox>> {
            self.calls.set(self.calls.get() + 1);
            if page >= self.pages {
                return Err(ExtractionError::PageOutOfRange {
                    page,
                    page_count: self.pages,
                });
            }
            Ok(page_boxes(&[&format!("page {page}")]))
        }
    }

    fn counting(pages: u32) -> CountingSource {
        CountingSource {
            calls: Cell::new(0),
            pages,
        }
    }

    #[test]
    fn test_page_text_builds_layout() {
        let page = PageText::from_boxes(3, &page_boxes(&["ab", "cd"]), &SelectionConfig::default());
        assert_eq!(page.page_number(), 3);
        assert_eq!(page.len(), 4);
        assert_eq!(page.layout.line_count(), 2);
    }

    #[test]
    fn test_extraction_is_memoized() {
        let source = counting(3);
        let mut cache = PageTextCache::new(4, SelectionConfig::default());

        let first = cache.get_or_build(&source, 1).unwrap();
        let second = cache.get_or_build(&source, 1).unwrap();

        assert_eq!(source.calls.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.index.text(), "page 1");
    }

    #[test]
    fn test_least_recently_used_page_is_evicted() {
        let source = counting(5);
        let mut cache = PageTextCache::new(2, SelectionConfig::default());

        cache.get_or_build(&source, 0).unwrap();
        cache.get_or_build(&source, 1).unwrap();
        cache.get_or_build(&source, 0).unwrap();
        cache.get_or_build(&source, 2).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(0));
        assert!(!cache.contains(1));
        assert!(cache.contains(2));
    }

    #[test]
    fn test_invalidate_forces_reextraction() {
        let source = counting(2);
        let mut cache = PageTextCache::new(2, SelectionConfig::default());

        cache.get_or_build(&source, 0).unwrap();
        assert!(cache.invalidate(0));
        assert!(!cache.invalidate(0));
        cache.get_or_build(&source, 0).unwrap();

        assert_eq!(source.calls.get(), 2);
    }

    #[test]
    fn test_invalidated_page_leaves_recency_order() {
        let source = counting(3);
        let mut cache = PageTextCache::new(2, SelectionConfig::default());

        cache.get_or_build(&source, 0).unwrap();
        cache.get_or_build(&source, 1).unwrap();
        cache.invalidate(0);
        cache.get_or_build(&source, 2).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(1));
        assert!(cache.contains(2));

        cache.get_or_build(&source, 1).unwrap();
        cache.get_or_build(&source, 0).unwrap();
        assert!(cache.contains(1));
        assert!(!cache.contains(2));
    }

    #[test]
    fn test_failed_extraction_is_not_cached() {
        let source = counting(1);
        let mut cache = PageTextCache::new(2, SelectionConfig::default());

        assert!(cache.get_or_build(&source, 9).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_clamps_to_one() {
        let cache = PageTextCache::new(0, SelectionConfig::default());
        assert_eq!(cache.capacity(), 1);
    }
}
