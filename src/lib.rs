//! Real-time person tracking and altercation alerting over external
//! object detections.
//!
//! The engine consumes bounding-box detections from any backend
//! implementing [`DetectionSource`], assigns stable identities by
//! quantized geometry, attaches a sticky heuristic label to each identity,
//! ages out identities that disappear, and flags pairs whose proximity and
//! motion jointly suggest an altercation. Image capture, rendering, and
//! the detector model itself are external collaborators.

pub mod engine;
pub mod integration;

pub use engine::{
    ClassifierConfig, CycleOutcome, CycleSummary, Detection, EngineConfig, Gender,
    GenderClassifier, GenderCounts, HeuristicClassifier, IdentityKey, InteractionConfig,
    MonitorEngine, PersonRecord, Rect,
};
pub use integration::{
    BoxEncoding, DetectionBuilder, DetectionSource, DetectorInitError, MalformedDetection,
    MonitorPipeline, PipelineConfig, RawDetection,
};
