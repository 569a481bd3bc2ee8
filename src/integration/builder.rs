//! Canonicalization of raw detector boxes into engine detections.

use thiserror::Error;

use crate::engine::{Detection, Rect};
use crate::integration::detector::BoxEncoding;

/// Why an individual detection entry was rejected.
///
/// Malformed entries are skipped one at a time; they never abort a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedDetection {
    #[error("bounding box contains non-finite coordinates")]
    NonFinite,
    #[error("bounding box has non-positive dimensions")]
    EmptyBox,
}

/// Builder for creating `Detection` objects from the accepted box encodings.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box from whatever encoding the detector reported.
    pub fn encoding(self, bbox: BoxEncoding) -> Self {
        match bbox {
            BoxEncoding::Tlwh {
                x,
                y,
                width,
                height,
            } => self.tlwh(x, y, width, height),
            BoxEncoding::Corners { x1, y1, x2, y2 } => self.corners(x1, y1, x2, y2),
        }
    }

    /// Set bounding box in TLWH format (x, y, width, height).
    pub fn tlwh(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.x1 = x;
        self.y1 = y;
        self.x2 = x + width;
        self.y2 = y + height;
        self
    }

    /// Set bounding box in two-corner format (x1, y1, x2, y2).
    pub fn corners(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    /// Set the confidence score.
    pub fn score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    /// Build the canonical `Detection`, rejecting degenerate boxes.
    pub fn build(self) -> Result<Detection, MalformedDetection> {
        let corners = [self.x1, self.y1, self.x2, self.y2];
        if corners.iter().any(|v| !v.is_finite()) {
            return Err(MalformedDetection::NonFinite);
        }
        if self.x2 <= self.x1 || self.y2 <= self.y1 {
            return Err(MalformedDetection::EmptyBox);
        }
        let bbox = Rect::from_tlbr(self.x1, self.y1, self.x2, self.y2);
        Ok(Detection::from_rect(bbox, self.score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tlwh_and_corners_agree() {
        let from_tlwh = DetectionBuilder::new()
            .tlwh(10.0, 20.0, 40.0, 60.0)
            .score(0.95)
            .build()
            .unwrap();
        let from_corners = DetectionBuilder::new()
            .corners(10.0, 20.0, 50.0, 80.0)
            .score(0.95)
            .build()
            .unwrap();

        assert_eq!(from_tlwh.bbox, from_corners.bbox);
        assert_eq!(from_tlwh.score, 0.95);
    }

    #[test]
    fn test_encoding_dispatch() {
        let det = DetectionBuilder::new()
            .encoding(BoxEncoding::Corners {
                x1: 0.0,
                y1: 0.0,
                x2: 30.0,
                y2: 90.0,
            })
            .score(0.8)
            .build()
            .unwrap();
        assert_eq!(det.bbox.to_tlwh(), [0.0, 0.0, 30.0, 90.0]);
    }

    #[test]
    fn test_degenerate_boxes_are_rejected() {
        let inverted = DetectionBuilder::new()
            .corners(50.0, 20.0, 10.0, 80.0)
            .build();
        assert_eq!(inverted.unwrap_err(), MalformedDetection::EmptyBox);

        let nan = DetectionBuilder::new()
            .tlwh(f32::NAN, 0.0, 10.0, 10.0)
            .build();
        assert_eq!(nan.unwrap_err(), MalformedDetection::NonFinite);
    }
}
