//! Trait for external object-detection backends.

/// Bounding region encodings accepted at the detector boundary.
///
/// Backends report whichever form their model emits; the pipeline
/// canonicalizes to TLWH before anything downstream sees the box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoxEncoding {
    /// Absolute top-left origin plus dimensions.
    Tlwh {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    /// Two-corner form: top-left and bottom-right.
    Corners { x1: f32, y1: f32, x2: f32, y2: f32 },
}

/// One entry of a detector's output, before filtering or canonicalization.
#[derive(Debug, Clone)]
pub struct RawDetection {
    pub bbox: BoxEncoding,
    /// Model class label; the engine consumes only "person" entries.
    pub label: String,
    pub score: f32,
}

impl RawDetection {
    pub fn new(bbox: BoxEncoding, label: impl Into<String>, score: f32) -> Self {
        Self {
            bbox,
            label: label.into(),
            score,
        }
    }
}

/// Trait for object detection inference backends.
///
/// Implement this trait to connect any detection model to the monitor.
///
/// # Example
///
/// ```ignore
/// use crowdwatch_rs::{BoxEncoding, DetectionSource, RawDetection};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, input: &[u8], width: u32, height: u32) -> Result<Vec<RawDetection>, Self::Error> {
///         // Run inference and return labeled detections
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error;

    /// Run inference on raw image data and return labeled detections.
    ///
    /// # Arguments
    /// * `input` - Raw image bytes (format depends on implementation)
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    fn detect(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<RawDetection>, Self::Error>;
}
