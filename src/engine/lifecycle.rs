//! Track lifecycle: birth on first observation, absence aging, eviction.

use std::collections::{HashMap, HashSet, hash_map::Entry};

use tracing::debug;

use crate::engine::gender::{Gender, GenderClassifier};
use crate::engine::identity::IdentityKey;
use crate::engine::rect::Rect;

/// Shape measurements cached when a track is created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proportions {
    pub aspect_ratio: f32,
    pub area: f32,
}

impl Proportions {
    fn of(bbox: &Rect) -> Self {
        Self {
            aspect_ratio: bbox.aspect_ratio(),
            area: bbox.area(),
        }
    }
}

/// Per-identity record owned by the [`TrackStore`].
///
/// The gender label and proportions are fixed at creation; only the
/// absence counter changes afterwards.
#[derive(Debug, Clone)]
pub struct Track {
    gender: Gender,
    proportions: Proportions,
    absence: u32,
}

impl Track {
    fn new(gender: Gender, proportions: Proportions) -> Self {
        Self {
            gender,
            proportions,
            absence: 0,
        }
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn proportions(&self) -> Proportions {
        self.proportions
    }

    /// Cycles since this identity was last observed.
    pub fn absence(&self) -> u32 {
        self.absence
    }
}

/// Sole owner of track records; nothing else creates or deletes them.
#[derive(Debug)]
pub struct TrackStore {
    tracks: HashMap<IdentityKey, Track>,
    /// Absence count past which a track is evicted.
    max_absence: u32,
}

impl TrackStore {
    pub fn new(max_absence: u32) -> Self {
        Self {
            tracks: HashMap::new(),
            max_absence,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&Track> {
        self.tracks.get(key)
    }

    /// Look up an identity's label, creating its track on first observation.
    ///
    /// The classifier runs only for brand-new identities; the result is
    /// memoized for the track's lifetime, so later geometry changes under
    /// the same key never flip the label.
    pub fn observe(
        &mut self,
        key: IdentityKey,
        bbox: &Rect,
        classifier: &dyn GenderClassifier,
    ) -> Gender {
        match self.tracks.entry(key) {
            Entry::Occupied(entry) => entry.get().gender,
            Entry::Vacant(entry) => {
                let gender = classifier.classify(bbox);
                entry.insert(Track::new(gender, Proportions::of(bbox)));
                gender
            }
        }
    }

    /// Age every track against the identities seen this cycle.
    ///
    /// Seen tracks get their absence counter reset to zero; unseen tracks
    /// are incremented and evicted once the counter exceeds the threshold.
    /// Each known identity is reset-or-incremented exactly once per call.
    pub fn age(&mut self, seen: &HashSet<IdentityKey>) {
        let max_absence = self.max_absence;
        self.tracks.retain(|key, track| {
            if seen.contains(key) {
                track.absence = 0;
                return true;
            }
            track.absence += 1;
            if track.absence > max_absence {
                debug!(identity = %key, "evicting stale track");
                false
            } else {
                true
            }
        });
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::gender::HeuristicClassifier;

    fn seen(keys: &[IdentityKey]) -> HashSet<IdentityKey> {
        keys.iter().copied().collect()
    }

    #[test]
    fn test_label_memoized_on_first_observation() {
        let classifier = HeuristicClassifier::default();
        let mut store = TrackStore::new(50);

        let bbox = Rect::new(700.0, 50.0, 40.0, 110.0);
        let key = IdentityKey::from_rect(&bbox);
        let first = store.observe(key, &bbox, &classifier);

        // Same key reported with completely different geometry keeps the
        // original label.
        let drifted = Rect::new(710.0, 55.0, 45.0, 105.0);
        assert_eq!(store.observe(key, &drifted, &classifier), first);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_proportions_cached_from_first_assignment() {
        let classifier = HeuristicClassifier::default();
        let mut store = TrackStore::new(50);

        let bbox = Rect::new(100.0, 100.0, 50.0, 125.0);
        let key = IdentityKey::from_rect(&bbox);
        store.observe(key, &bbox, &classifier);

        let proportions = store.get(&key).unwrap().proportions();
        assert!((proportions.aspect_ratio - 2.5).abs() < 1e-6);
        assert!((proportions.area - 6250.0).abs() < 1e-3);
    }

    #[test]
    fn test_eviction_boundary() {
        let classifier = HeuristicClassifier::default();
        let mut store = TrackStore::new(50);

        let bbox = Rect::new(100.0, 100.0, 60.0, 120.0);
        let key = IdentityKey::from_rect(&bbox);
        store.observe(key, &bbox, &classifier);

        // Absent for exactly 50 cycles: retained.
        for _ in 0..50 {
            store.age(&seen(&[]));
        }
        assert_eq!(store.get(&key).unwrap().absence(), 50);

        // The 51st consecutive absence crosses the threshold.
        store.age(&seen(&[]));
        assert!(store.get(&key).is_none());
    }

    #[test]
    fn test_reappearance_resets_absence() {
        let classifier = HeuristicClassifier::default();
        let mut store = TrackStore::new(50);

        let bbox = Rect::new(100.0, 100.0, 60.0, 120.0);
        let key = IdentityKey::from_rect(&bbox);
        store.observe(key, &bbox, &classifier);

        for _ in 0..49 {
            store.age(&seen(&[]));
        }
        store.age(&seen(&[key]));
        assert_eq!(store.get(&key).unwrap().absence(), 0);

        // The counter starts over after the reset.
        store.age(&seen(&[]));
        assert_eq!(store.get(&key).unwrap().absence(), 1);
    }
}
