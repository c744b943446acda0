//! Viewport geometry in canvas pixels and world coordinates.
//!
//! `Viewport`, `ScrollPosition` and `CanvasExtent` are inputs owned by the
//! UI shell. `BoundingBox` is always derived from them and never stored by
//! the UI.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "geometry_test.rs"]
mod tests;

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Visible rendering surface size, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Scroll offsets into the oversized virtual canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub vertical: f64,
    pub horizontal: f64,
}

/// Size of the virtual world the scroll offsets index into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasExtent {
    pub width: f64,
    pub height: f64,
}

/// Axis-aligned rectangle in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BoundingBox {
    #[must_use]
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self { left, top, right, bottom }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// True when the box covers no area. NaN edges count as empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.right > self.left && self.bottom > self.top)
    }

    /// Strict overlap test; touching edges do not intersect.
    #[must_use]
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        other.left < self.right && other.right > self.left && other.top < self.bottom && other.bottom > self.top
    }

    /// Grow each side by `dx` horizontally and `dy` vertically.
    #[must_use]
    pub fn expanded(&self, dx: f64, dy: f64) -> Self {
        Self { left: self.left - dx, top: self.top - dy, right: self.right + dx, bottom: self.bottom + dy }
    }

    #[must_use]
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }
}
