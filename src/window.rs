//! Window tracker: viewport + scroll → world-space bounding box.
//!
//! The world origin sits at the center of the virtual canvas, matching the
//! paint layer's transform:
//!
//! ```text
//! left   = horizontal - extent.width  / 2      right  = left + viewport.width
//! top    = vertical   - extent.height / 2      bottom = top  + viewport.height
//! ```
//!
//! The published window is then grown by the prefetch padding, a fraction of
//! the viewport size added on every side.

use crate::geometry::{BoundingBox, CanvasExtent, ScrollPosition, Viewport};

#[cfg(test)]
#[path = "window_test.rs"]
mod tests;

#[derive(Debug, Clone)]
pub struct WindowTracker {
    viewport: Viewport,
    scroll: ScrollPosition,
    extent: CanvasExtent,
    padding: f64,
}

impl WindowTracker {
    /// A tracker before first layout: zero viewport, zero scroll.
    ///
    /// Negative or non-finite `padding` is treated as zero.
    #[must_use]
    pub fn new(extent: CanvasExtent, padding: f64) -> Self {
        let padding = if padding.is_finite() && padding > 0.0 { padding } else { 0.0 };
        Self { viewport: Viewport::default(), scroll: ScrollPosition::default(), extent, padding }
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn scroll(&self) -> ScrollPosition {
        self.scroll
    }

    #[must_use]
    pub fn extent(&self) -> CanvasExtent {
        self.extent
    }

    #[must_use]
    pub fn padding(&self) -> f64 {
        self.padding
    }

    /// Replace viewport size and scroll position together.
    pub fn set_viewport_size(&mut self, width: f64, height: f64, vertical: f64, horizontal: f64) -> BoundingBox {
        self.viewport = Viewport { width, height };
        self.scroll = ScrollPosition { vertical, horizontal };
        self.bounding_box()
    }

    pub fn scroll_to(&mut self, vertical: f64, horizontal: f64) -> BoundingBox {
        self.scroll = ScrollPosition { vertical, horizontal };
        self.bounding_box()
    }

    /// Apply a pan delta to the current scroll position.
    pub fn scroll_by(&mut self, d_vertical: f64, d_horizontal: f64) -> BoundingBox {
        self.scroll.vertical += d_vertical;
        self.scroll.horizontal += d_horizontal;
        self.bounding_box()
    }

    /// The visible window without prefetch padding.
    #[must_use]
    pub fn visible_box(&self) -> BoundingBox {
        let left = self.scroll.horizontal - self.extent.width / 2.0;
        let top = self.scroll.vertical - self.extent.height / 2.0;
        BoundingBox::new(left, top, left + self.viewport.width, top + self.viewport.height)
    }

    /// The window to subscribe to: visible box plus padding.
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        let visible = self.visible_box();
        if self.padding == 0.0 {
            return visible;
        }
        visible.expanded(self.viewport.width * self.padding, self.viewport.height * self.padding)
    }
}
