//! Flat per-page character index
//!
//! Every extracted text run is exploded into one [`Glyph`] per character.
//! All glyphs of a run share the run's bounding box: the extraction
//! primitive does not report per-glyph geometry, so this is an
//! approximation that is good enough for hit-testing and highlight
//! rectangles.

use crate::error::ExtractionResult;
use crate::geometry::{PageCoordinate, TextBoundingBox};
use crate::text_source::{TextBox, TextBoxSource};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// One extracted character with its bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    pub bbox: TextBoundingBox,
    pub character: char,
    /// Position of this glyph in the page's character sequence
    pub index_in_page: usize,
}

impl Glyph {
    pub fn contains_point(&self, point: &PageCoordinate) -> bool {
        self.bbox.contains_point(point)
    }
}

/// Immutable character sequence of one page
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CharacterIndex {
    page_number: u32,
    glyphs: Vec<Glyph>,
}

impl CharacterIndex {
    /// Build the index from a page's text boxes, in extraction order
    pub fn build(page_number: u32, boxes: &[TextBox]) -> Self {
        let mut glyphs = Vec::with_capacity(boxes.iter().map(|b| b.text.len()).sum());

        for text_box in boxes {
            for character in text_box.text.chars() {
                let index_in_page = glyphs.len();
                glyphs.push(Glyph {
                    bbox: text_box.bbox,
                    character,
                    index_in_page,
                });
            }
        }

        debug!(
            "built character index for page {}: {} boxes, {} glyphs",
            page_number,
            boxes.len(),
            glyphs.len()
        );

        Self {
            page_number,
            glyphs,
        }
    }

    /// Extract and index a page. A page without text yields an empty index.
    pub fn from_source<S: TextBoxSource + ?Sized>(
        source: &S,
        page_number: u32,
    ) -> ExtractionResult<Self> {
        let boxes = source.text_boxes(page_number)?;
        Ok(Self::build(page_number, &boxes))
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    pub fn glyph(&self, index: usize) -> Option<&Glyph> {
        self.glyphs.get(index)
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.glyphs.get(index).map(|g| g.character)
    }

    /// The page's characters, in index order
    pub fn chars(&self) -> Vec<char> {
        self.glyphs.iter().map(|g| g.character).collect()
    }

    /// The page's characters as one string, without inserted line breaks
    pub fn text(&self) -> String {
        self.glyphs.iter().map(|g| g.character).collect()
    }

    /// Resolve a point to the lowest-index glyph whose box contains it.
    ///
    /// Linear scan; first match wins so overlapping boxes resolve
    /// deterministically.
    pub fn character_at(&self, point: &PageCoordinate) -> Option<usize> {
        let hit = self.glyphs.iter().position(|g| g.contains_point(point));
        trace!(
            "hit test page {} at ({}, {}) -> {:?}",
            self.page_number,
            point.x,
            point.y,
            hit
        );
        hit
    }

    /// Raw glyph boxes for an inclusive index range. Empty when the range is
    /// inverted or out of bounds.
    pub fn character_rects(&self, start: usize, end: usize) -> Vec<TextBoundingBox> {
        if start > end || end >= self.glyphs.len() {
            return Vec::new();
        }
        self.glyphs[start..=end].iter().map(|g| g.bbox).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{line_boxes, source_with_lines};
    use crate::text_source::MemoryTextSource;

    #[test]
    fn test_build_explodes_runs_into_glyphs() {
        let bbox = TextBoundingBox::new(10.0, 20.0, 30.0, 12.0);
        let index = CharacterIndex::build(0, &[TextBox::new("abc", bbox)]);

        assert_eq!(index.len(), 3);
        assert_eq!(index.text(), "abc");
        for (i, glyph) in index.glyphs().iter().enumerate() {
            assert_eq!(glyph.index_in_page, i);
            assert_eq!(glyph.bbox, bbox);
        }
    }

    #[test]
    fn test_build_counts_chars_not_bytes() {
        let bbox = TextBoundingBox::new(0.0, 0.0, 30.0, 12.0);
        let index = CharacterIndex::build(0, &[TextBox::new("déjà", bbox)]);

        assert_eq!(index.len(), 4);
        assert_eq!(index.char_at(1), Some('é'));
    }

    #[test]
    fn test_empty_page_is_not_an_error() {
        let source = MemoryTextSource::single_page(Vec::new());
        let index = CharacterIndex::from_source(&source, 0).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.character_at(&PageCoordinate::new(1.0, 1.0)), None);
    }

    #[test]
    fn test_from_source_propagates_hard_failure() {
        let source = MemoryTextSource::default();
        assert!(CharacterIndex::from_source(&source, 0).is_err());
    }

    #[test]
    fn test_character_at_hits_containing_glyph() {
        let index = CharacterIndex::build(0, &line_boxes("ABC", 0.0, 0.0));

        assert_eq!(index.character_at(&PageCoordinate::new(5.0, 6.0)), Some(0));
        assert_eq!(index.character_at(&PageCoordinate::new(15.0, 6.0)), Some(1));
        assert_eq!(index.character_at(&PageCoordinate::new(25.0, 6.0)), Some(2));
        assert_eq!(index.character_at(&PageCoordinate::new(35.0, 6.0)), None);
        assert_eq!(index.character_at(&PageCoordinate::new(5.0, 50.0)), None);
    }

    #[test]
    fn test_character_at_prefers_lowest_index_on_overlap() {
        let shared = TextBoundingBox::new(0.0, 0.0, 40.0, 12.0);
        let index = CharacterIndex::build(0, &[TextBox::new("xyz", shared)]);

        assert_eq!(index.character_at(&PageCoordinate::new(20.0, 6.0)), Some(0));

        // Shared edge between the first and second glyph boxes
        let index = CharacterIndex::build(0, &line_boxes("ab", 0.0, 0.0));
        assert_eq!(index.character_at(&PageCoordinate::new(10.0, 6.0)), Some(0));
    }

    #[test]
    fn test_character_at_only_returns_containing_boxes() {
        let source = source_with_lines(&["the quick fox", "jumps over"]);
        let index = CharacterIndex::from_source(&source, 0).unwrap();

        for y in [1.0, 6.0, 11.0, 21.0, 30.0, 45.0] {
            for x in (0..140).step_by(3) {
                let point = PageCoordinate::new(x as f32, y);
                if let Some(i) = index.character_at(&point) {
                    assert!(index.glyph(i).unwrap().contains_point(&point));
                }
            }
        }
    }

    #[test]
    fn test_character_rects_range() {
        let index = CharacterIndex::build(0, &line_boxes("abcd", 0.0, 0.0));

        assert_eq!(index.character_rects(1, 2).len(), 2);
        assert!(index.character_rects(2, 1).is_empty());
        assert!(index.character_rects(0, 4).is_empty());
    }
}
