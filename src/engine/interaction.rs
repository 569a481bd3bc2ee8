//! Pairwise proximity/motion evaluation for altercation alerts.

use std::collections::HashMap;

use nalgebra::Point2;
use ndarray::Array2;

use crate::engine::identity::IdentityKey;
use crate::engine::rect::Rect;

/// Where an identity sat during one cycle.
#[derive(Debug, Clone, Copy)]
pub struct TrackedPosition {
    pub bbox: Rect,
    pub center: Point2<f32>,
}

impl TrackedPosition {
    pub fn new(bbox: Rect) -> Self {
        Self {
            bbox,
            center: bbox.center(),
        }
    }
}

/// Positions of every identity observed in one cycle.
pub type PositionSnapshot = HashMap<IdentityKey, TrackedPosition>;

/// Thresholds for pairwise alert evaluation.
#[derive(Debug, Clone)]
pub struct InteractionConfig {
    /// A pair is "close" when the center distance is under the average of
    /// the two box widths times this multiplier.
    pub proximity_multiplier: f32,
    /// Center displacement since the previous cycle that counts as rapid.
    pub rapid_movement_threshold: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            proximity_multiplier: 1.5,
            rapid_movement_threshold: 20.0,
        }
    }
}

/// Evaluates each cycle's instantaneous alert state.
///
/// Retains exactly one step of history: the previous cycle's snapshot.
/// The result is this cycle's state only; holding an alert visible over
/// time is the host's job.
#[derive(Debug)]
pub struct InteractionDetector {
    config: InteractionConfig,
    previous: Option<PositionSnapshot>,
}

impl InteractionDetector {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            previous: None,
        }
    }

    /// Evaluate the cycle's alert state, then retire the snapshot.
    ///
    /// A pair alerts when its centers are within the proximity threshold
    /// and either identity moved rapidly since the previous snapshot. On
    /// the very first evaluated cycle there is no previous snapshot and
    /// proximity alone is enough.
    pub fn evaluate(&mut self, current: PositionSnapshot) -> bool {
        let alert = self.has_alert_pair(&current);
        self.previous = Some(current);
        alert
    }

    fn has_alert_pair(&self, current: &PositionSnapshot) -> bool {
        if current.len() < 2 {
            return false;
        }

        let entries: Vec<(&IdentityKey, &TrackedPosition)> = current.iter().collect();
        let distances = center_distances(&entries);

        for i in 0..entries.len() {
            for j in (i + 1)..entries.len() {
                let (_, a) = entries[i];
                let (_, b) = entries[j];

                // Relative box size stands in for distance from the camera.
                let average_width = (a.bbox.width + b.bbox.width) / 2.0;
                let threshold = average_width * self.config.proximity_multiplier;
                if distances[[i, j]] >= threshold {
                    continue;
                }

                match &self.previous {
                    None => return true,
                    Some(previous) => {
                        if self.moved_rapidly(previous, entries[i])
                            || self.moved_rapidly(previous, entries[j])
                        {
                            return true;
                        }
                    }
                }
            }
        }

        false
    }

    /// An identity absent from the previous snapshot contributes no motion
    /// signal.
    fn moved_rapidly(
        &self,
        previous: &PositionSnapshot,
        (key, position): (&IdentityKey, &TrackedPosition),
    ) -> bool {
        previous.get(key).is_some_and(|prior| {
            nalgebra::distance(&prior.center, &position.center)
                > self.config.rapid_movement_threshold
        })
    }

    /// Drop the retained snapshot, as if no cycle had ever been evaluated.
    pub fn reset(&mut self) {
        self.previous = None;
    }
}

/// Pairwise center-distance matrix over the cycle's positions.
fn center_distances(entries: &[(&IdentityKey, &TrackedPosition)]) -> Array2<f32> {
    let mut distances = Array2::zeros((entries.len(), entries.len()));
    for (i, (_, a)) in entries.iter().enumerate() {
        for (j, (_, b)) in entries.iter().enumerate() {
            distances[[i, j]] = nalgebra::distance(&a.center, &b.center);
        }
    }
    distances
}
