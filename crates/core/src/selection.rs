//! Interactive text selection over a single page
//!
//! The engine tracks an anchor (where the selection started) and a cursor
//! (where it currently ends) as glyph indices into the page's
//! [`CharacterIndex`](crate::char_index::CharacterIndex). From that range it
//! derives one highlight rectangle per visual line and the plain text to copy.
//!
//! ```text
//! Idle --start--> Dragging --end--> Selected --clear--> Idle
//! Idle --word/line/all-------------> Selected
//! ```
//!
//! Pointer positions that hit no glyph are ignored: clicking between words or
//! in the margin is normal and leaves the engine untouched.

use crate::events::{EventBus, SelectionEvent, SubscriptionId};
use crate::geometry::{PageCoordinate, TextBoundingBox};
use crate::page_cache::PageText;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Where the engine is in a selection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionState {
    #[default]
    Idle,
    Dragging,
    Selected,
}

/// What the paint layer and the copy action consume
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub rects: Vec<TextBoundingBox>,
    pub text: String,
    pub page_number: Option<u32>,
}

impl SelectionSnapshot {
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty() && self.text.is_empty()
    }
}

/// The active selection. Anchor and cursor are either both set or both unset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    range: Option<(usize, usize)>,
    page_number: Option<u32>,
    rects: Vec<TextBoundingBox>,
    text: String,
}

impl Selection {
    pub fn anchor(&self) -> Option<usize> {
        self.range.map(|(anchor, _)| anchor)
    }

    pub fn cursor(&self) -> Option<usize> {
        self.range.map(|(_, cursor)| cursor)
    }

    /// Inclusive `(min, max)` of anchor and cursor
    pub fn ordered_range(&self) -> Option<(usize, usize)> {
        self.range.map(|(a, c)| (a.min(c), a.max(c)))
    }

    pub fn page_number(&self) -> Option<u32> {
        self.page_number
    }

    pub fn rects(&self) -> &[TextBoundingBox] {
        &self.rects
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_none()
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn normalize(&mut self) {
        if let Some((anchor, cursor)) = self.range {
            if anchor > cursor {
                self.range = Some((cursor, anchor));
            }
        }
    }
}

/// One rectangle per visual line spanned by the inclusive range `start..=end`.
///
/// Glyph boxes on the same line are united; a line-break flag closes the
/// current rectangle and opens the next.
pub fn line_rects(page: &PageText, start: usize, end: usize) -> Vec<TextBoundingBox> {
    let glyphs = page.index.glyphs();
    if start > end || end >= glyphs.len() {
        return Vec::new();
    }

    let mut rects = Vec::new();
    let mut current: Option<TextBoundingBox> = None;

    for i in start..=end {
        let bbox = glyphs[i].bbox;
        let is_new_line = i > start && page.layout.is_line_break(i);

        current = match current {
            Some(line) if is_new_line => {
                rects.push(line);
                Some(bbox)
            }
            Some(line) => Some(line.union(&bbox)),
            None => Some(bbox),
        };
    }

    if let Some(line) = current {
        rects.push(line);
    }

    rects
}

/// Characters of `start..=end`, with a line feed before every glyph that
/// starts a new visual line (never before the first one).
pub fn range_text(page: &PageText, start: usize, end: usize) -> String {
    let glyphs = page.index.glyphs();
    if start > end || end >= glyphs.len() {
        return String::new();
    }

    let mut text = String::with_capacity(end - start + 1);
    for i in start..=end {
        if i > start && page.layout.is_line_break(i) {
            text.push('\n');
        }
        text.push(glyphs[i].character);
    }
    text
}

/// Selection state machine for one page
#[derive(Debug, Default)]
pub struct SelectionEngine {
    page: Option<Arc<PageText>>,
    state: SelectionState,
    selection: Selection,
    events: EventBus<SelectionEvent>,
}

impl SelectionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(page: Arc<PageText>) -> Self {
        let mut engine = Self::new();
        engine.set_page(page);
        engine
    }

    /// Make `page` the page being selected on. Setting the page that is
    /// already loaded keeps the current selection.
    pub fn set_page(&mut self, page: Arc<PageText>) {
        if let Some(current) = &self.page {
            if Arc::ptr_eq(current, &page) {
                return;
            }
        }

        self.clear_page();
        debug!(
            "selection engine loaded page {} ({} glyphs)",
            page.page_number(),
            page.len()
        );
        self.page = Some(page);
    }

    /// Unload the page, dropping any selection on it
    pub fn clear_page(&mut self) {
        self.clear_selection();
        self.page = None;
    }

    pub fn has_page(&self) -> bool {
        self.page.is_some()
    }

    pub fn page(&self) -> Option<&Arc<PageText>> {
        self.page.as_ref()
    }

    pub fn page_number(&self) -> Option<u32> {
        self.page.as_ref().map(|p| p.page_number())
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&SelectionEvent) + Send + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Point-to-character resolver for pointer handlers
    pub fn character_at(&self, point: &PageCoordinate) -> Option<usize> {
        self.page.as_ref()?.index.character_at(point)
    }

    /// Begin a drag at `point`
    pub fn start_selection(&mut self, point: PageCoordinate) {
        let Some(index) = self.resolve(&point, "start selection") else {
            return;
        };

        self.selection.clear();
        self.selection.range = Some((index, index));
        self.selection.page_number = self.page_number();
        self.refresh_derived();
        self.transition(SelectionState::Dragging);
    }

    /// Move the cursor of an in-progress drag
    pub fn update_selection(&mut self, point: PageCoordinate) {
        if self.state != SelectionState::Dragging {
            return;
        }
        let Some(index) = self.character_at(&point) else {
            return;
        };
        let Some((anchor, _)) = self.selection.range else {
            return;
        };

        self.selection.range = Some((anchor, index));
        self.refresh_derived();
        self.emit_changed();
    }

    /// Finish a drag, ordering anchor before cursor
    pub fn end_selection(&mut self) {
        if self.state != SelectionState::Dragging {
            return;
        }

        if self.selection.is_empty() {
            self.transition(SelectionState::Idle);
            return;
        }

        self.selection.normalize();
        self.refresh_derived();
        self.transition(SelectionState::Selected);
        self.emit_changed();
    }

    /// Select the word under `point`, without surrounding separators
    pub fn select_word_at(&mut self, point: PageCoordinate) {
        let Some(index) = self.resolve(&point, "select word") else {
            return;
        };
        let Some(range) = self.page.as_ref().and_then(|p| p.layout.find_word_boundaries(index))
        else {
            return;
        };
        self.select_range(range);
    }

    /// Select the visual line under `point`
    pub fn select_line_at(&mut self, point: PageCoordinate) {
        let Some(index) = self.resolve(&point, "select line") else {
            return;
        };
        let Some(range) = self.page.as_ref().and_then(|p| p.layout.find_line_boundaries(index))
        else {
            return;
        };
        self.select_range(range);
    }

    /// Select every glyph on the page
    pub fn select_all(&mut self) {
        let Some(page) = &self.page else {
            trace!("select all ignored: no page loaded");
            return;
        };
        if page.is_empty() {
            return;
        }
        let last = page.len() - 1;
        self.select_range((0, last));
    }

    /// Reset to an empty selection. Emits `Cleared` only if something was selected.
    pub fn clear_selection(&mut self) {
        let had_selection = !self.selection.is_empty();
        self.selection.clear();
        self.transition(SelectionState::Idle);

        if had_selection {
            self.events.emit(&SelectionEvent::Cleared);
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn anchor(&self) -> Option<usize> {
        self.selection.anchor()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.selection.cursor()
    }

    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    pub fn can_copy(&self) -> bool {
        !self.selection.text.is_empty()
    }

    pub fn selected_text(&self) -> &str {
        &self.selection.text
    }

    /// Current-selection accessor for paint and clipboard consumers
    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            rects: self.selection.rects.clone(),
            text: self.selection.text.clone(),
            page_number: self.selection.page_number,
        }
    }

    /// Selection rectangles converted to paint space at `scale`
    pub fn selection_rects_scaled(&self, scale: f32) -> Vec<TextBoundingBox> {
        self.selection.rects.iter().map(|r| r.scaled(scale)).collect()
    }

    /// Per-line rectangles for the current range
    pub fn calculate_selection_rects(&self) -> Vec<TextBoundingBox> {
        match (&self.page, self.selection.ordered_range()) {
            (Some(page), Some((start, end))) => line_rects(page, start, end),
            _ => Vec::new(),
        }
    }

    /// Text of the current range with line feeds between visual lines
    pub fn extract_selected_text(&self) -> String {
        match (&self.page, self.selection.ordered_range()) {
            (Some(page), Some((start, end))) => range_text(page, start, end),
            _ => String::new(),
        }
    }

    /// Raw glyph boxes for an inclusive range on the loaded page
    pub fn character_rects(&self, start: usize, end: usize) -> Vec<TextBoundingBox> {
        self.page
            .as_ref()
            .map(|p| p.index.character_rects(start, end))
            .unwrap_or_default()
    }

    fn resolve(&mut self, point: &PageCoordinate, operation: &str) -> Option<usize> {
        if self.page.is_none() {
            trace!("{} ignored: no page loaded", operation);
            return None;
        }
        let index = self.character_at(point);
        if index.is_none() {
            trace!("{} ignored: no glyph at ({}, {})", operation, point.x, point.y);
        }
        index
    }

    fn select_range(&mut self, (start, end): (usize, usize)) {
        self.selection.clear();
        self.selection.range = Some((start, end));
        self.selection.page_number = self.page_number();
        self.refresh_derived();
        self.transition(SelectionState::Selected);
        self.emit_changed();
    }

    fn refresh_derived(&mut self) {
        self.selection.rects = self.calculate_selection_rects();
        self.selection.text = self.extract_selected_text();
    }

    fn transition(&mut self, next: SelectionState) {
        if self.state != next {
            trace!("selection state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn emit_changed(&mut self) {
        let snapshot = self.snapshot();
        self.events.emit(&SelectionEvent::Changed(snapshot));
    }
}
