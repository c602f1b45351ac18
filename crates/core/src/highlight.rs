//! Persistent text highlights
//!
//! A highlight freezes a selection: its page, line rectangles and text, plus
//! presentation attributes the user can edit later. Mutations go through
//! [`crate::history::HighlightCommand`] when they need to be undoable.

use crate::error::{HistoryError, HistoryResult};
use crate::geometry::{PageCoordinate, TextBoundingBox};
use crate::selection::SelectionSnapshot;
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type HighlightId = Uuid;

pub const DEFAULT_OPACITY: f32 = 0.4;

/// RGBA color (8 bits per channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Convert to normalized RGBA values (0.0 to 1.0)
    pub fn to_normalized(&self) -> (f32, f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        )
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::YELLOW
    }
}

/// Highlighter presets
impl Color {
    pub const YELLOW: Color = Color { r: 255, g: 255, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 128, b: 255, a: 255 };
    pub const PINK: Color = Color { r: 255, g: 192, b: 203, a: 255 };
    pub const ORANGE: Color = Color { r: 255, g: 165, b: 0, a: 255 };
    pub const PURPLE: Color = Color { r: 128, g: 0, b: 128, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
}

/// Opacity in `[0, 1]`; NaN falls back to the default
pub fn clamp_opacity(opacity: f32) -> f32 {
    if opacity.is_nan() {
        DEFAULT_OPACITY
    } else {
        opacity.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub id: HighlightId,
    pub page_number: u32,
    pub rects: Vec<TextBoundingBox>,
    pub text: String,
    pub color: Color,
    pub opacity: f32,
    #[serde(default)]
    pub note: String,
    pub visible: bool,
}

impl Highlight {
    pub fn new(page_number: u32, rects: Vec<TextBoundingBox>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            page_number,
            rects,
            text: text.into(),
            color: Color::default(),
            opacity: DEFAULT_OPACITY,
            note: String::new(),
            visible: true,
        }
    }

    /// Freeze the current selection. Returns `None` for an empty selection.
    pub fn from_selection(snapshot: &SelectionSnapshot, color: Color) -> Option<Self> {
        let page_number = snapshot.page_number?;
        if snapshot.is_empty() {
            return None;
        }
        Some(Self::new(page_number, snapshot.rects.clone(), snapshot.text.clone()).with_color(color))
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = clamp_opacity(opacity);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn contains_point(&self, point: &PageCoordinate) -> bool {
        self.rects.iter().any(|rect| rect.contains_point(point))
    }

    pub fn bounds(&self) -> Option<TextBoundingBox> {
        let (first, rest) = self.rects.split_first()?;
        Some(rest.iter().fold(*first, |acc, rect| acc.union(rect)))
    }

    pub fn has_note(&self) -> bool {
        !self.note.is_empty()
    }
}

/// Ordered collection of highlights for one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighlightModel {
    highlights: Vec<Highlight>,
}

impl HighlightModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, highlight: Highlight) -> HistoryResult<()> {
        if self.contains(highlight.id) {
            return Err(HistoryError::DuplicateHighlight(highlight.id));
        }
        debug!(
            "added highlight {} on page {}",
            highlight.id, highlight.page_number
        );
        self.highlights.push(highlight);
        Ok(())
    }

    /// Put a highlight back at a former position (clamped to the end)
    pub fn insert_at(&mut self, position: usize, highlight: Highlight) -> HistoryResult<()> {
        if self.contains(highlight.id) {
            return Err(HistoryError::DuplicateHighlight(highlight.id));
        }
        let position = position.min(self.highlights.len());
        self.highlights.insert(position, highlight);
        Ok(())
    }

    pub fn remove(&mut self, id: HighlightId) -> Option<Highlight> {
        self.remove_indexed(id).map(|(_, highlight)| highlight)
    }

    /// Remove a highlight and report where it was
    pub fn remove_indexed(&mut self, id: HighlightId) -> Option<(usize, Highlight)> {
        let position = self.position(id)?;
        debug!("removed highlight {}", id);
        Some((position, self.highlights.remove(position)))
    }

    pub fn get(&self, id: HighlightId) -> Option<&Highlight> {
        self.highlights.iter().find(|h| h.id == id)
    }

    pub fn contains(&self, id: HighlightId) -> bool {
        self.position(id).is_some()
    }

    pub fn all(&self) -> &[Highlight] {
        &self.highlights
    }

    pub fn for_page(&self, page_number: u32) -> Vec<&Highlight> {
        self.highlights
            .iter()
            .filter(|h| h.page_number == page_number)
            .collect()
    }

    /// Topmost visible highlight under a point
    pub fn highlight_at(&self, page_number: u32, point: &PageCoordinate) -> Option<&Highlight> {
        self.highlights
            .iter()
            .rev()
            .find(|h| h.visible && h.page_number == page_number && h.contains_point(point))
    }

    pub fn len(&self) -> usize {
        self.highlights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty()
    }

    /// Replace the note, returning the previous one
    pub fn set_note(&mut self, id: HighlightId, note: impl Into<String>) -> Option<String> {
        let highlight = self.get_mut(id)?;
        Some(std::mem::replace(&mut highlight.note, note.into()))
    }

    pub fn set_color(&mut self, id: HighlightId, color: Color) -> Option<Color> {
        let highlight = self.get_mut(id)?;
        Some(std::mem::replace(&mut highlight.color, color))
    }

    /// Set opacity (clamped to `[0, 1]`), returning the previous value
    pub fn set_opacity(&mut self, id: HighlightId, opacity: f32) -> Option<f32> {
        let highlight = self.get_mut(id)?;
        Some(std::mem::replace(&mut highlight.opacity, clamp_opacity(opacity)))
    }

    /// Flip visibility, returning the new value
    pub fn toggle_visibility(&mut self, id: HighlightId) -> Option<bool> {
        let highlight = self.get_mut(id)?;
        highlight.visible = !highlight.visible;
        Some(highlight.visible)
    }

    /// Remove everything, returning the removed highlights in order
    pub fn clear(&mut self) -> Vec<Highlight> {
        std::mem::take(&mut self.highlights)
    }

    /// Remove a page's highlights, returning them with their former positions
    /// in ascending order
    pub fn remove_page(&mut self, page_number: u32) -> Vec<(usize, Highlight)> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.highlights.len());

        for (position, highlight) in std::mem::take(&mut self.highlights).into_iter().enumerate() {
            if highlight.page_number == page_number {
                removed.push((position, highlight));
            } else {
                kept.push(highlight);
            }
        }

        self.highlights = kept;
        removed
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn position(&self, id: HighlightId) -> Option<usize> {
        self.highlights.iter().position(|h| h.id == id)
    }

    fn get_mut(&mut self, id: HighlightId) -> Option<&mut Highlight> {
        self.highlights.iter_mut().find(|h| h.id == id)
    }
}
