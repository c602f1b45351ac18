//! PDF document abstraction layer
//!
//! Wraps a PDFium document and exposes its positioned text in the viewer's
//! page space (points, top-left origin, y growing downward).

use log::{debug, warn};
use pdf_viewer_core::error::{ExtractionError, ExtractionResult};
use pdf_viewer_core::geometry::TextBoundingBox;
use pdf_viewer_core::text_source::{TextBox, TextBoxSource};
use pdfium_render::prelude::*;
use std::path::Path;

/// Errors that can occur during PDF operations
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("PDFium initialization error: {0}")]
    Initialization(String),

    #[error("PDF load error: {0}")]
    Load(String),

    #[error("Invalid page index: {0}")]
    InvalidPageIndex(u32),

    #[error("Text extraction error: {0}")]
    TextExtraction(String),
}

impl From<PdfError> for ExtractionError {
    fn from(err: PdfError) -> Self {
        match err {
            PdfError::InvalidPageIndex(page) => ExtractionError::InvalidPage(page),
            other => ExtractionError::Backend(other.to_string()),
        }
    }
}

/// Result type for PDF operations
pub type PdfResult<T> = Result<T, PdfError>;

/// Page dimensions in points (1/72 inch)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDimensions {
    pub width: f32,
    pub height: f32,
}

/// PDF document handle
pub struct PdfDocument {
    /// The loaded PDF document (owns the Pdfium instance internally)
    document: pdfium_render::prelude::PdfDocument<'static>,
}

impl PdfDocument {
    /// Bind PDFium, looking next to the executable first, then the current
    /// directory, then the system library paths
    fn init_pdfium() -> PdfResult<Pdfium> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()));

        if let Some(ref dir) = exe_dir {
            if let Ok(bindings) =
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            {
                return Ok(Pdfium::new(bindings));
            }
        }

        Ok(Pdfium::new(
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library())
                .map_err(|e| PdfError::Initialization(e.to_string()))?,
        ))
    }

    /// Load a PDF document from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> PdfResult<Self> {
        let pdfium = Box::leak(Box::new(Self::init_pdfium()?));

        let document = pdfium
            .load_pdf_from_file(path.as_ref(), None)
            .map_err(|e| PdfError::Load(e.to_string()))?;

        debug!("opened {}", path.as_ref().display());
        Ok(Self { document })
    }

    /// Load a PDF document from owned bytes
    pub fn from_bytes(data: Vec<u8>) -> PdfResult<Self> {
        let pdfium = Box::leak(Box::new(Self::init_pdfium()?));
        let data_static: &'static [u8] = Box::leak(data.into_boxed_slice());

        let document = pdfium
            .load_pdf_from_byte_slice(data_static, None)
            .map_err(|e| PdfError::Load(e.to_string()))?;

        Ok(Self { document })
    }

    pub fn page_count(&self) -> u32 {
        u32::from(self.document.pages().len())
    }

    fn get_page(&self, index: u32) -> PdfResult<PdfPage<'_>> {
        let pdfium_index =
            u16::try_from(index).map_err(|_| PdfError::InvalidPageIndex(index))?;
        self.document
            .pages()
            .get(pdfium_index)
            .map_err(|_| PdfError::InvalidPageIndex(index))
    }

    pub fn page_size(&self, page_index: u32) -> PdfResult<PageDimensions> {
        let page = self.get_page(page_index)?;
        Ok(PageDimensions {
            width: page.width().value,
            height: page.height().value,
        })
    }

    /// Positioned characters of a page, one box per character in content
    /// order.
    ///
    /// Line feeds are dropped since lines are recovered from geometry.
    /// Spaces PDFium synthesizes without bounds are kept as zero-size boxes
    /// at the end of the preceding glyph so word boundaries survive.
    pub fn extract_text_boxes(&self, page_index: u32) -> PdfResult<Vec<TextBox>> {
        let page = self.get_page(page_index)?;
        let page_height = page.height().value;

        let text_page = page
            .text()
            .map_err(|e| PdfError::TextExtraction(format!("Failed to get text page: {}", e)))?;

        let mut boxes: Vec<TextBox> = Vec::new();
        let mut skipped = 0usize;

        for char_result in text_page.chars().iter() {
            let Some(c) = char_result.unicode_char() else {
                skipped += 1;
                continue;
            };
            if c == '\n' || c == '\r' {
                continue;
            }

            let bbox = match char_result.loose_bounds() {
                // PDFium reports bottom-left origin bounds
                Ok(bounds) => TextBoundingBox::new(
                    bounds.left().value,
                    page_height - bounds.top().value,
                    bounds.right().value - bounds.left().value,
                    bounds.top().value - bounds.bottom().value,
                ),
                Err(_) if c.is_whitespace() => match boxes.last() {
                    Some(prev) => TextBoundingBox::new(prev.bbox.right(), prev.bbox.top(), 0.0, 0.0),
                    None => continue,
                },
                Err(_) => {
                    skipped += 1;
                    continue;
                }
            };

            boxes.push(TextBox::new(c.to_string(), bbox));
        }

        if skipped > 0 {
            warn!("page {}: skipped {} characters without text or bounds", page_index, skipped);
        }
        debug!("page {}: extracted {} text boxes", page_index, boxes.len());

        Ok(boxes)
    }
}

impl TextBoxSource for PdfDocument {
    fn page_count(&self) -> u32 {
        PdfDocument::page_count(self)
    }

    fn text_boxes(&self, page: u32) -> ExtractionResult<Vec<TextBox>> {
        let page_count = PdfDocument::page_count(self);
        if page >= page_count {
            return Err(ExtractionError::PageOutOfRange { page, page_count });
        }
        Ok(self.extract_text_boxes(page)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_error_display() {
        let err = PdfError::InvalidPageIndex(42);
        assert_eq!(err.to_string(), "Invalid page index: 42");

        let err = PdfError::Load("file not found".to_string());
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_pdf_error_into_extraction_error() {
        let err: ExtractionError = PdfError::InvalidPageIndex(3).into();
        assert!(matches!(err, ExtractionError::InvalidPage(3)));

        let err: ExtractionError = PdfError::TextExtraction("broken".to_string()).into();
        match err {
            ExtractionError::Backend(msg) => assert!(msg.contains("broken")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_pdfium_library_name_generation() {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()));

        if let Some(dir) = exe_dir {
            let lib_path = Pdfium::pdfium_platform_library_name_at_path(&dir);
            let lib_name = lib_path.to_string_lossy();

            #[cfg(target_os = "linux")]
            assert!(lib_name.ends_with(".so"), "unexpected library name: {}", lib_name);

            #[cfg(target_os = "macos")]
            assert!(lib_name.ends_with(".dylib"), "unexpected library name: {}", lib_name);

            #[cfg(target_os = "windows")]
            assert!(lib_name.ends_with(".dll"), "unexpected library name: {}", lib_name);

            assert!(lib_name.to_lowercase().contains("pdfium"));
        }
    }

    #[test]
    fn test_open_missing_file_fails() {
        // Fails either binding PDFium or loading the file
        assert!(PdfDocument::open("/definitely/not/here.pdf").is_err());
    }
}
