//! Fixtures shared by the unit tests

use crate::geometry::TextBoundingBox;
use crate::text_source::{MemoryTextSource, TextBox};

pub const GLYPH_WIDTH: f32 = 10.0;
pub const GLYPH_HEIGHT: f32 = 12.0;
pub const LINE_PITCH: f32 = 20.0;

/// One box per character, laid out left to right starting at `x`
pub fn line_boxes(text: &str, x: f32, y: f32) -> Vec<TextBox> {
    text.chars()
        .enumerate()
        .map(|(i, c)| {
            TextBox::new(
                c.to_string(),
                TextBoundingBox::new(x + i as f32 * GLYPH_WIDTH, y, GLYPH_WIDTH, GLYPH_HEIGHT),
            )
        })
        .collect()
}

/// Single page with each line placed `LINE_PITCH` below the previous one
pub fn source_with_lines(lines: &[&str]) -> MemoryTextSource {
    MemoryTextSource::single_page(page_boxes(lines))
}

pub fn page_boxes(lines: &[&str]) -> Vec<TextBox> {
    lines
        .iter()
        .enumerate()
        .flat_map(|(row, line)| line_boxes(line, 0.0, row as f32 * LINE_PITCH))
        .collect()
}
