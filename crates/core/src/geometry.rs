//! Page-space geometry shared by the text index, selection and search.
//!
//! All coordinates are page points (1/72 inch) with the origin at the
//! top-left corner of the page and y growing downward. This is the
//! orientation the text-extraction primitive hands out.

use serde::{Deserialize, Serialize};

/// A point in page space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PageCoordinate {
    pub x: f32,
    pub y: f32,
}

impl PageCoordinate {
    /// Create a new page coordinate
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box in page space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TextBoundingBox {
    /// Left edge (points)
    pub x: f32,

    /// Top edge (points)
    pub y: f32,

    /// Width in points
    pub width: f32,

    /// Height in points
    pub height: f32,
}

impl TextBoundingBox {
    /// Create a new bounding box
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// A box with neither width nor height
    pub fn is_null(&self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }

    /// Check if this bounding box contains a point (edges inclusive)
    pub fn contains_point(&self, point: &PageCoordinate) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    /// Check if this bounding box overlaps with another
    pub fn overlaps(&self, other: &TextBoundingBox) -> bool {
        !(self.right() < other.left()
            || other.right() < self.left()
            || self.bottom() < other.top()
            || other.bottom() < self.top())
    }

    /// Smallest box covering both boxes. A null box contributes nothing.
    pub fn union(&self, other: &TextBoundingBox) -> TextBoundingBox {
        if self.is_null() {
            return *other;
        }
        if other.is_null() {
            return *self;
        }

        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());

        TextBoundingBox::new(left, top, right - left, bottom - top)
    }

    /// Scale every component, e.g. to convert page points into pixels at a zoom level
    pub fn scaled(&self, factor: f32) -> TextBoundingBox {
        TextBoundingBox::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }
}
