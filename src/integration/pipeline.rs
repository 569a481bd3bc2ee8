//! Frame scheduler: one gated, throttled cycle per host tick.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use crate::engine::{CycleOutcome, CycleSummary, Detection, EngineConfig, MonitorEngine};
use crate::integration::builder::DetectionBuilder;
use crate::integration::detector::DetectionSource;

/// Only detector entries carrying this label enter the engine.
const PERSON_LABEL: &str = "person";

/// Initialization failure for the external detector.
#[derive(Debug, Error)]
pub enum DetectorInitError<E> {
    /// Both the primary and the fallback initialization paths failed;
    /// nothing can run and the host must surface this as fatal.
    #[error("detector unavailable: primary initialization failed ({primary}); fallback failed ({fallback})")]
    Unavailable { primary: E, fallback: E },
}

/// Configuration for the scheduling layer.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Minimum elapsed time between processed cycles; earlier ticks are
    /// skipped without touching any state.
    pub min_interval: Duration,
    pub engine: EngineConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(200),
            engine: EngineConfig::default(),
        }
    }
}

/// Two-state cycle gate: Idle or Running.
///
/// `try_acquire` never blocks; the returned guard flips the gate back to
/// Idle when dropped, so no exit path can leave the pipeline stuck in
/// Running.
#[derive(Debug, Default)]
struct CycleGate {
    running: AtomicBool,
}

impl CycleGate {
    fn try_acquire(&self) -> Option<CycleGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .ok()?;
        Some(CycleGuard { gate: self })
    }
}

struct CycleGuard<'a> {
    gate: &'a CycleGate,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.gate.running.store(false, Ordering::Release);
    }
}

/// Combines a detection backend with the tracking engine and schedules
/// one full cycle per [`process_frame`](Self::process_frame) call.
pub struct MonitorPipeline<D: DetectionSource> {
    detector: D,
    engine: MonitorEngine,
    gate: CycleGate,
    min_interval: Duration,
    last_processed: Option<Instant>,
}

impl<D: DetectionSource> MonitorPipeline<D> {
    /// Create a new pipeline around an already-initialized detector.
    pub fn new(detector: D, config: PipelineConfig) -> Self {
        Self {
            detector,
            engine: MonitorEngine::new(config.engine),
            gate: CycleGate::default(),
            min_interval: config.min_interval,
            last_processed: None,
        }
    }

    /// Create a new pipeline with default configuration.
    pub fn with_default_config(detector: D) -> Self {
        Self::new(detector, PipelineConfig::default())
    }

    /// Initialize the detector, falling back once if the primary path fails.
    ///
    /// Suits accelerated-then-CPU backend bring-up. If the fallback also
    /// fails, both errors are surfaced and no pipeline is constructed.
    pub fn initialize<P, F>(
        primary: P,
        fallback: F,
        config: PipelineConfig,
    ) -> Result<Self, DetectorInitError<D::Error>>
    where
        P: FnOnce() -> Result<D, D::Error>,
        F: FnOnce() -> Result<D, D::Error>,
        D::Error: fmt::Display,
    {
        let detector = match primary() {
            Ok(detector) => detector,
            Err(primary_err) => match fallback() {
                Ok(detector) => {
                    info!(error = %primary_err, "primary detector init failed; using fallback");
                    detector
                }
                Err(fallback_err) => {
                    return Err(DetectorInitError::Unavailable {
                        primary: primary_err,
                        fallback: fallback_err,
                    });
                }
            },
        };
        Ok(Self::new(detector, config))
    }

    /// Run one monitoring cycle over a frame, or skip it.
    ///
    /// A tick is skipped, with zero mutation and no detector call, when it
    /// arrives before the interval floor has elapsed or while a cycle is
    /// already running. A detector failure mid-cycle completes with the
    /// neutral summary and leaves all track and position state from the
    /// previous successful cycle untouched.
    pub fn process_frame(&mut self, input: &[u8], width: u32, height: u32) -> CycleOutcome
    where
        D::Error: fmt::Display,
    {
        if let Some(last) = self.last_processed {
            if last.elapsed() < self.min_interval {
                return CycleOutcome::Skipped;
            }
        }
        let Some(_guard) = self.gate.try_acquire() else {
            return CycleOutcome::Skipped;
        };
        self.last_processed = Some(Instant::now());

        let raw = match self.detector.detect(input, width, height) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(%error, "detection cycle failed; reporting neutral result");
                return CycleOutcome::Completed(CycleSummary::default());
            }
        };

        let detections: Vec<Detection> = raw
            .into_iter()
            .filter(|entry| entry.label == PERSON_LABEL)
            .filter_map(|entry| {
                DetectionBuilder::new()
                    .encoding(entry.bbox)
                    .score(entry.score)
                    .build()
                    .map_err(|reason| warn!(%reason, "skipping malformed detection entry"))
                    .ok()
            })
            .collect();

        CycleOutcome::Completed(self.engine.update(&detections))
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the underlying engine.
    pub fn engine(&self) -> &MonitorEngine {
        &self.engine
    }

    /// Get a mutable reference to the underlying engine.
    pub fn engine_mut(&mut self) -> &mut MonitorEngine {
        &mut self.engine
    }

    /// Forget all tracking state and the throttle timestamp.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.last_processed = None;
    }
}
