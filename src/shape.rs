//! Shape records as stored in the `Component` collection.
//!
//! DESIGN
//! ======
//! The reconciler only ever reads the four rectangle fields of a record
//! (see [`Component::bounds`]). The remaining fields exist so the in-memory
//! store can hold realistic records; drawing them is the UI shell's job.
//!
//! Colors arrive from older clients as an integer, an encoded string, or
//! null. They are modelled as the tagged [`ColorValue`] and serialized
//! untagged so the wire shape stays `number | string | null`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{BoundingBox, Point};

#[cfg(test)]
#[path = "shape_test.rs"]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Circle,
    Path,
    Rectangle,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Stroke or fill color as written by any client.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorValue {
    #[default]
    Unset,
    Int(i64),
    Encoded(String),
}

impl ColorValue {
    /// Resolve to a packed `0xRRGGBB` value when possible.
    ///
    /// Encoded strings may carry a leading `#`; anything that is not six hex
    /// digits resolves to `None`.
    #[must_use]
    pub fn to_rgb(&self) -> Option<u32> {
        match self {
            Self::Unset => None,
            Self::Int(v) => match u32::try_from(*v & 0x00FF_FFFF) {
                Ok(rgb) => Some(rgb),
                Err(_) => None,
            },
            Self::Encoded(s) => {
                let hex = s.trim().trim_start_matches('#');
                if hex.len() != 6 {
                    return None;
                }
                match u32::from_str_radix(hex, 16) {
                    Ok(rgb) => Some(rgb),
                    Err(_) => None,
                }
            }
        }
    }
}

/// A shape record. Field names match the replicated collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(default)]
    pub shape: ShapeKind,
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub stroke_width: f64,
    #[serde(default)]
    pub stroke_color: ColorValue,
    #[serde(default)]
    pub fill_color: ColorValue,
    #[serde(default)]
    pub points: Vec<Point>,
}

impl Component {
    /// A bare rectangle record with default styling.
    #[must_use]
    pub fn rectangle(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            shape: ShapeKind::Rectangle,
            left,
            top,
            right,
            bottom,
            z: 0.0,
            stroke_width: 1.0,
            stroke_color: ColorValue::Int(0),
            fill_color: ColorValue::Unset,
            points: Vec::new(),
        }
    }

    /// The record's rectangle; the only part the reconciler reads.
    #[must_use]
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(self.left, self.top, self.right, self.bottom)
    }

    /// Recompute the rectangle from `points`. No-op for records without points.
    pub fn fit_to_points(&mut self) {
        let Some(first) = self.points.first() else {
            return;
        };
        let mut b = BoundingBox::new(first.x, first.y, first.x, first.y);
        for p in self.points.iter().skip(1) {
            b.left = b.left.min(p.x);
            b.right = b.right.max(p.x);
            b.top = b.top.min(p.y);
            b.bottom = b.bottom.max(p.y);
        }
        self.left = b.left;
        self.top = b.top;
        self.right = b.right;
        self.bottom = b.bottom;
    }
}
