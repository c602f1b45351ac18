//! Page text-extraction primitive
//!
//! The rendering backend supplies text as an ordered list of text runs, each
//! with the bounding box of the whole run. [`TextBoxSource`] is the seam the
//! core consumes; the PDFium adapter in the render crate implements it, and
//! [`MemoryTextSource`] serves tests and JSON dumps.

use crate::error::{ExtractionError, ExtractionResult};
use crate::geometry::TextBoundingBox;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// One extracted text run and its bounding box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    pub bbox: TextBoundingBox,
    pub text: String,
}

impl TextBox {
    pub fn new(text: impl Into<String>, bbox: TextBoundingBox) -> Self {
        Self {
            bbox,
            text: text.into(),
        }
    }
}

/// Supplier of per-page text boxes.
///
/// An empty vector means the page has no text layer (e.g. a scanned image)
/// and is not an error. Errors are reserved for the primitive itself failing.
pub trait TextBoxSource {
    fn page_count(&self) -> u32;

    fn text_boxes(&self, page: u32) -> ExtractionResult<Vec<TextBox>>;
}

/// In-memory text boxes, one vector per page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryTextSource {
    pub pages: Vec<Vec<TextBox>>,
}

impl MemoryTextSource {
    pub fn new(pages: Vec<Vec<TextBox>>) -> Self {
        Self { pages }
    }

    /// Single-page source
    pub fn single_page(boxes: Vec<TextBox>) -> Self {
        Self { pages: vec![boxes] }
    }

    /// Parse a JSON dump of the form `{"pages": [[{"bbox": {...}, "text": "..."}]]}`
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl TextBoxSource for MemoryTextSource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn text_boxes(&self, page: u32) -> ExtractionResult<Vec<TextBox>> {
        self.pages
            .get(page as usize)
            .cloned()
            .ok_or(ExtractionError::PageOutOfRange {
                page,
                page_count: self.page_count(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_pages() {
        let source = MemoryTextSource::new(vec![
            vec![TextBox::new("Hello", TextBoundingBox::new(0.0, 0.0, 50.0, 12.0))],
            vec![],
        ]);

        assert_eq!(source.page_count(), 2);
        assert_eq!(source.text_boxes(0).unwrap().len(), 1);
        assert!(source.text_boxes(1).unwrap().is_empty());
    }

    #[test]
    fn test_memory_source_out_of_range() {
        let source = MemoryTextSource::default();
        let err = source.text_boxes(3).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::PageOutOfRange {
                page: 3,
                page_count: 0
            }
        ));
    }

    #[test]
    fn test_memory_source_json() {
        let json = r#"{"pages": [[{"bbox": {"x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0}, "text": "ab"}]]}"#;
        let source = MemoryTextSource::from_json(json).unwrap();

        let boxes = source.text_boxes(0).unwrap();
        assert_eq!(boxes[0].text, "ab");
        assert_eq!(boxes[0].bbox, TextBoundingBox::new(1.0, 2.0, 3.0, 4.0));

        let reparsed = MemoryTextSource::from_json(&source.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, source);
    }
}
