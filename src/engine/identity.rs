//! Stable identity keys derived from detection geometry.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::engine::rect::Rect;

/// Position grid pitch in frame units.
const POSITION_GRID: f32 = 50.0;
/// Size grid pitch in frame units.
const SIZE_GRID: f32 = 20.0;

/// Persistent handle for one detected subject, keyed by quantized geometry.
///
/// Position is snapped to the nearest 50-unit grid point and size to the
/// nearest 20-unit bucket, so small jitter maps to the same key across
/// cycles. Identity is a pure function of current-cycle geometry: there is
/// no frame-to-frame association, and a subject crossing a grid boundary
/// resolves to a new key. Two detections with identical quantized geometry
/// share a key even when they come from unrelated subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pos_x: i64,
    pos_y: i64,
    width_bucket: i64,
    height_bucket: i64,
}

impl IdentityKey {
    /// Resolve a bounding box to its identity key.
    pub fn from_rect(bbox: &Rect) -> Self {
        Self {
            pos_x: (bbox.x / POSITION_GRID).round() as i64 * POSITION_GRID as i64,
            pos_y: (bbox.y / POSITION_GRID).round() as i64 * POSITION_GRID as i64,
            width_bucket: (bbox.width / SIZE_GRID).round() as i64,
            height_bucket: (bbox.height / SIZE_GRID).round() as i64,
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "person_{}_{}_{}_{}",
            self.pos_x, self.pos_y, self.width_bucket, self.height_bucket
        )
    }
}

impl Serialize for IdentityKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
