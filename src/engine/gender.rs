//! Heuristic gender labeling for newly observed identities.
//!
//! The default classifier is an explicitly arbitrary, reproducible scoring
//! function over box geometry. It has no demographic grounding and is not a
//! trained model; it exists so an identity keeps one stable label for its
//! whole lifetime. Swap in another [`GenderClassifier`] to replace it
//! without touching the tracking machinery.

use nalgebra::Point2;
use serde::Serialize;

use crate::engine::rect::Rect;

/// Categorical label attached to an identity on first observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

/// Strategy interface for labeling a newly observed identity.
pub trait GenderClassifier {
    /// Label a first-time observation from its bounding box.
    fn classify(&self, bbox: &Rect) -> Gender;
}

/// Weights and thresholds for [`HeuristicClassifier`].
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Aspect ratios above this score toward Female.
    pub tall_aspect_min: f32,
    /// Aspect ratios below this score toward Male.
    pub broad_aspect_max: f32,
    /// Magnitude of the aspect-ratio term.
    pub aspect_weight: f32,
    /// Fixed reference point boxes are measured against.
    pub reference_center: Point2<f32>,
    /// Boxes centered within this radius of the reference lean Male.
    pub center_radius: f32,
    /// Magnitude of the reference-proximity term.
    pub center_weight: f32,
    /// Magnitude of the deterministic position perturbation.
    pub jitter_weight: f32,
    /// Area at which the size term saturates.
    pub area_norm: f32,
    /// Magnitude of the size term.
    pub area_weight: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            tall_aspect_min: 2.5,
            broad_aspect_max: 2.0,
            aspect_weight: 0.3,
            reference_center: Point2::new(400.0, 300.0),
            center_radius: 200.0,
            center_weight: 0.2,
            jitter_weight: 0.4,
            area_norm: 40_000.0,
            area_weight: 0.4,
        }
    }
}

/// Additive-score classifier over box geometry.
#[derive(Debug, Clone, Default)]
pub struct HeuristicClassifier {
    config: ClassifierConfig,
}

impl HeuristicClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Raw score; positive resolves to Female.
    ///
    /// All terms are additive and order-independent: an aspect-ratio term,
    /// a reference-proximity term, a deterministic perturbation seeded by
    /// the box's x coordinate, and a saturating size term.
    fn score(&self, bbox: &Rect) -> f32 {
        let c = &self.config;
        let mut score = 0.0;

        let aspect = bbox.aspect_ratio();
        if aspect > c.tall_aspect_min {
            score += c.aspect_weight;
        } else if aspect < c.broad_aspect_max {
            score -= c.aspect_weight;
        }

        let distance = nalgebra::distance(&bbox.center(), &c.reference_center);
        if distance < c.center_radius {
            score -= c.center_weight;
        }

        // Reproducible pseudo-noise: same box origin, same label.
        let jitter = ((bbox.x * 13.0) % 100.0) / 100.0;
        score += (jitter - 0.5) * c.jitter_weight;

        let size = (bbox.area() / c.area_norm).min(1.0);
        score -= size * c.area_weight;

        score
    }
}

impl GenderClassifier for HeuristicClassifier {
    fn classify(&self, bbox: &Rect) -> Gender {
        if self.score(bbox) > 0.0 {
            Gender::Female
        } else {
            Gender::Male
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_is_reproducible() {
        let classifier = HeuristicClassifier::default();
        let bbox = Rect::new(700.0, 50.0, 40.0, 110.0);
        let first = classifier.classify(&bbox);
        for _ in 0..10 {
            assert_eq!(classifier.classify(&bbox), first);
        }
    }

    #[test]
    fn test_tall_narrow_far_box_scores_female() {
        // Aspect 110/40 = 2.75 (+0.3), center (720, 105) is ~374 from the
        // reference so no proximity term, jitter for x=700 is
        // ((9100 % 100)/100 - 0.5) * 0.4 = -0.2, size 4400/40000 * 0.4 = -0.044.
        // Total +0.056 > 0.
        let classifier = HeuristicClassifier::default();
        let bbox = Rect::new(700.0, 50.0, 40.0, 110.0);
        assert_eq!(classifier.classify(&bbox), Gender::Female);
    }

    #[test]
    fn test_broad_central_box_scores_male() {
        // Aspect 150/100 = 1.5 (-0.3), center (400, 300) is the reference
        // itself (-0.2), jitter for x=350 is zero, size term -0.15.
        // Total -0.65.
        let classifier = HeuristicClassifier::default();
        let bbox = Rect::new(350.0, 225.0, 100.0, 150.0);
        assert_eq!(classifier.classify(&bbox), Gender::Male);
    }

    #[test]
    fn test_aspect_band_between_thresholds_is_neutral() {
        let config = ClassifierConfig::default();
        let classifier = HeuristicClassifier::new(config);
        // Aspect exactly 2.25 sits between 2.0 and 2.5: no aspect term.
        // Jitter for x=0 is -0.2, no proximity term (center far away),
        // size 3600/40000 * 0.4 = -0.036. Total -0.236.
        let bbox = Rect::new(0.0, 700.0, 40.0, 90.0);
        assert_eq!(classifier.classify(&bbox), Gender::Male);
    }
}
