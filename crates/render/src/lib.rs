//! PDF Viewer Render Library
//!
//! PDFium-backed access to page geometry and positioned text.

pub mod pdf;

pub use pdf::{PageDimensions, PdfDocument, PdfError, PdfResult};
