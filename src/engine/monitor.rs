//! Core engine: one resolve -> classify -> age -> evaluate pass per cycle.

use std::collections::HashSet;

use crate::engine::gender::{ClassifierConfig, GenderClassifier, HeuristicClassifier};
use crate::engine::identity::IdentityKey;
use crate::engine::interaction::{
    InteractionConfig, InteractionDetector, PositionSnapshot, TrackedPosition,
};
use crate::engine::lifecycle::TrackStore;
use crate::engine::rect::Rect;
use crate::engine::summary::{CycleSummary, GenderCounts, PersonRecord};

/// Canonical detection input for the engine.
///
/// Produced at the integration boundary from whatever encoding the external
/// detector emits, already filtered to person entries.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Bounding box in TLWH form, full-resolution coordinates
    pub bbox: Rect,
    /// Detection confidence score
    pub score: f32,
}

impl Detection {
    pub fn new(x: f32, y: f32, width: f32, height: f32, score: f32) -> Self {
        Self {
            bbox: Rect::new(x, y, width, height),
            score,
        }
    }

    pub fn from_rect(bbox: Rect, score: f32) -> Self {
        Self { bbox, score }
    }
}

/// Configuration for the engine's lifecycle and interaction stages.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Cycles an identity may stay unobserved before its track is evicted.
    pub max_absence: u32,
    pub interaction: InteractionConfig,
    pub classifier: ClassifierConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_absence: 50,
            interaction: InteractionConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

/// The tracking engine: all persistent state lives here, on one instance.
///
/// Each [`update`](Self::update) call is one complete synchronous cycle
/// over a frame's detections. Throttling, mutual exclusion, and detector
/// invocation belong to the pipeline layer, not the engine.
pub struct MonitorEngine {
    tracks: TrackStore,
    interaction: InteractionDetector,
    classifier: Box<dyn GenderClassifier>,
}

impl MonitorEngine {
    /// Engine with the built-in heuristic classifier.
    pub fn new(config: EngineConfig) -> Self {
        let classifier = Box::new(HeuristicClassifier::new(config.classifier.clone()));
        Self::with_classifier(config, classifier)
    }

    /// Engine with a custom classification strategy.
    pub fn with_classifier(config: EngineConfig, classifier: Box<dyn GenderClassifier>) -> Self {
        Self {
            tracks: TrackStore::new(config.max_absence),
            interaction: InteractionDetector::new(config.interaction),
            classifier,
        }
    }

    /// Run one cycle over the frame's person detections.
    ///
    /// Resolves every detection to its identity, labels identities on
    /// first sight, ages and evicts tracks, and evaluates the cycle's
    /// alert state against the previous snapshot.
    pub fn update(&mut self, detections: &[Detection]) -> CycleSummary {
        let mut snapshot = PositionSnapshot::with_capacity(detections.len());
        let mut seen = HashSet::with_capacity(detections.len());
        let mut people = Vec::with_capacity(detections.len());
        let mut gender_counts = GenderCounts::default();

        for detection in detections {
            let id = IdentityKey::from_rect(&detection.bbox);
            seen.insert(id);
            snapshot.insert(id, TrackedPosition::new(detection.bbox));

            let gender = self
                .tracks
                .observe(id, &detection.bbox, self.classifier.as_ref());
            gender_counts.add(gender);
            people.push(PersonRecord {
                id,
                bbox: detection.bbox,
                gender,
                score: detection.score,
            });
        }

        self.tracks.age(&seen);
        let altercation = self.interaction.evaluate(snapshot);

        CycleSummary {
            people_count: people.len(),
            gender_counts,
            altercation,
            people,
        }
    }

    /// Number of identities currently tracked, including recently absent
    /// ones not yet evicted.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn tracks(&self) -> &TrackStore {
        &self.tracks
    }

    /// Drop all tracks and position history.
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.interaction.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::gender::Gender;

    fn person(x: f32, y: f32, width: f32, height: f32) -> Detection {
        Detection::new(x, y, width, height, 0.9)
    }

    #[test]
    fn test_empty_frame_yields_neutral_summary() {
        let mut engine = MonitorEngine::new(EngineConfig::default());
        let summary = engine.update(&[]);

        assert_eq!(summary.people_count, 0);
        assert_eq!(summary.gender_counts, GenderCounts::default());
        assert!(!summary.altercation);
        assert!(summary.people.is_empty());
    }

    #[test]
    fn test_count_matches_people_list() {
        let mut engine = MonitorEngine::new(EngineConfig::default());
        let detections = [
            person(100.0, 100.0, 60.0, 140.0),
            person(400.0, 250.0, 80.0, 180.0),
            person(650.0, 90.0, 50.0, 120.0),
        ];
        let summary = engine.update(&detections);

        assert_eq!(summary.people_count, summary.people.len());
        assert_eq!(summary.people_count, 3);
        assert_eq!(
            summary.gender_counts.female + summary.gender_counts.male,
            summary.people_count
        );
    }

    #[test]
    fn test_label_sticks_across_cycles() {
        let mut engine = MonitorEngine::new(EngineConfig::default());
        let first = engine.update(&[person(100.0, 100.0, 60.0, 140.0)]);
        let label = first.people[0].gender;

        // Jitter within the quantization buckets keeps the identity and
        // therefore the label.
        let second = engine.update(&[person(108.0, 95.0, 63.0, 145.0)]);
        assert_eq!(second.people[0].id, first.people[0].id);
        assert_eq!(second.people[0].gender, label);
    }

    #[test]
    fn test_reset_forgets_identities() {
        struct Flipper(std::cell::Cell<bool>);
        impl GenderClassifier for Flipper {
            fn classify(&self, _bbox: &Rect) -> Gender {
                let female = self.0.get();
                self.0.set(!female);
                if female { Gender::Female } else { Gender::Male }
            }
        }

        let mut engine = MonitorEngine::with_classifier(
            EngineConfig::default(),
            Box::new(Flipper(std::cell::Cell::new(true))),
        );

        let first = engine.update(&[person(100.0, 100.0, 60.0, 140.0)]);
        assert_eq!(first.people[0].gender, Gender::Female);
        assert_eq!(engine.track_count(), 1);

        engine.reset();
        assert_eq!(engine.track_count(), 0);

        // Same geometry classifies again after the reset.
        let second = engine.update(&[person(100.0, 100.0, 60.0, 140.0)]);
        assert_eq!(second.people[0].gender, Gender::Male);
    }

    #[test]
    fn test_tracks_outlive_brief_absence() {
        let mut engine = MonitorEngine::new(EngineConfig::default());
        engine.update(&[person(100.0, 100.0, 60.0, 140.0)]);
        for _ in 0..10 {
            engine.update(&[]);
        }
        assert_eq!(engine.track_count(), 1);
    }
}
