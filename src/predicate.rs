//! Spatial predicate: rectangle intersection against a window.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;
use crate::shape::Component;

#[cfg(test)]
#[path = "predicate_test.rs"]
mod tests;

/// Matches records whose rectangle overlaps `window`.
///
/// An empty window matches nothing, even records that straddle its edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaPredicate {
    pub window: BoundingBox,
}

impl AreaPredicate {
    #[must_use]
    pub fn new(window: BoundingBox) -> Self {
        Self { window }
    }

    #[must_use]
    pub fn matches_bounds(&self, bounds: &BoundingBox) -> bool {
        if self.window.is_empty() {
            return false;
        }
        self.window.intersects(bounds)
    }

    #[must_use]
    pub fn matches(&self, component: &Component) -> bool {
        self.matches_bounds(&component.bounds())
    }
}

/// Query-language rendering, as registered with the store.
impl fmt::Display for AreaPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.window.is_empty() {
            return f.write_str("FALSEPREDICATE");
        }
        let b = self.window;
        write!(
            f,
            "left < {} AND right > {} AND top < {} AND bottom > {}",
            b.right, b.left, b.bottom, b.top
        )
    }
}
