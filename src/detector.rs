//! Distance-based change detection over audio features.
//!
//! Keeps long- and short-window moving averages of the three spectral
//! features. The squared deviation between the windows is a distance:
//! it spikes when the music changes character and falls back toward zero
//! while the sound stays uniform. A change event fires when the distance
//! drops under an adaptive threshold, paced by a lockout and steered
//! toward an ideal change interval.

use embassy_time::{Duration, Instant};

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::audio::AudioFrame;

/// Long-window retention per sample (blends in 1% of the new value).
const LONG_RETAIN: f32 = 0.99;

/// Short-window retention per sample (blends in 10% of the new value).
const SHORT_RETAIN: f32 = 0.9;

/// Volume above which the averages track the input.
const ACTIVITY_FLOOR: f32 = 1.0;

/// Volume above which a change event may fire.
const CHANGE_FLOOR: f32 = 0.1;

/// Starting value of the adaptive change threshold.
const INITIAL_THRESHOLD: f32 = 50.0;

/// The relax step only applies while the tracked minimum is below this.
const RELAX_LIMIT: f32 = 1000.0;

/// Idle levels of the three features. Both windows start here, so the
/// initial distance is zero.
const IDLE_ZCR: f32 = 500.0;
const IDLE_ENERGY: f32 = 250.0;
const IDLE_LFC: f32 = 1000.0;

/// Pacing configuration for change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeTiming {
    /// Minimum interval between two accepted changes.
    pub lockout: Duration,
    /// Changes arriving faster than this tighten the threshold.
    pub ideal_min: Duration,
    /// Changes arriving slower than this loosen the threshold.
    pub ideal_max: Duration,
}

/// Long/short exponential moving averages of the audio features.
#[derive(Debug, Clone)]
pub struct FeatureAverages {
    long_zcr: f32,
    long_energy: f32,
    long_lfc: f32,
    short_zcr: f32,
    short_energy: f32,
    short_lfc: f32,
}

impl FeatureAverages {
    /// Create averages sitting at the idle levels.
    pub const fn new() -> Self {
        Self {
            long_zcr: IDLE_ZCR,
            long_energy: IDLE_ENERGY,
            long_lfc: IDLE_LFC,
            short_zcr: IDLE_ZCR,
            short_energy: IDLE_ENERGY,
            short_lfc: IDLE_LFC,
        }
    }

    /// Blend one sample into both windows.
    #[allow(clippy::cast_precision_loss)]
    pub fn update(&mut self, frame: &AudioFrame) {
        let zcr = frame.zcr as f32;
        let energy = frame.energy as f32;
        let lfc = frame.lfc as f32;

        self.long_zcr = self.long_zcr * LONG_RETAIN + zcr * (1.0 - LONG_RETAIN);
        self.long_energy = self.long_energy * LONG_RETAIN + energy * (1.0 - LONG_RETAIN);
        self.long_lfc = self.long_lfc * LONG_RETAIN + lfc * (1.0 - LONG_RETAIN);

        self.short_zcr = self.short_zcr * SHORT_RETAIN + zcr * (1.0 - SHORT_RETAIN);
        self.short_energy = self.short_energy * SHORT_RETAIN + energy * (1.0 - SHORT_RETAIN);
        self.short_lfc = self.short_lfc * SHORT_RETAIN + lfc * (1.0 - SHORT_RETAIN);
    }

    /// Sum of squared deviations between the short and long windows.
    pub fn distance(&self) -> f32 {
        let zcr = self.short_zcr - self.long_zcr;
        let energy = self.short_energy - self.long_energy;
        let lfc = self.short_lfc - self.long_lfc;
        zcr * zcr + energy * energy + lfc * lfc
    }
}

impl Default for FeatureAverages {
    fn default() -> Self {
        Self::new()
    }
}

/// Adaptive change detector over [`FeatureAverages`].
///
/// Call [`step`](Self::step) once per tick with the current frame. The
/// detector owns all pacing state; a `true` return means "change now".
#[derive(Debug)]
pub struct ChangeDetector {
    averages: FeatureAverages,
    timing: ChangeTiming,
    distance: f32,
    /// Lowest distance seen since the last threshold adjustment,
    /// `f32::INFINITY` until the first capture.
    tracker: f32,
    threshold: f32,
    last_change: Instant,
    relax_timer: Instant,
}

impl ChangeDetector {
    pub const fn new(timing: ChangeTiming) -> Self {
        Self {
            averages: FeatureAverages::new(),
            timing,
            distance: 0.0,
            tracker: f32::INFINITY,
            threshold: INITIAL_THRESHOLD,
            last_change: Instant::from_millis(0),
            relax_timer: Instant::from_millis(0),
        }
    }

    /// Arm the pacing timers. Call once when ticking starts.
    pub fn arm(&mut self, now: Instant) {
        self.last_change = now;
        self.relax_timer = now;
    }

    /// Replace the pacing configuration. Analysis state is kept.
    pub fn set_timing(&mut self, timing: ChangeTiming) {
        self.timing = timing;
    }

    /// Current distance between the short and long windows.
    pub const fn distance(&self) -> f32 {
        self.distance
    }

    /// Current adaptive threshold.
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Lowest distance seen since the last threshold adjustment.
    pub const fn tracked_min(&self) -> f32 {
        self.tracker
    }

    /// Ingest one frame and decide whether a change should happen now.
    ///
    /// Order matters: averages first, then distance, the tracked minimum,
    /// the periodic relax step, and last the change test.
    pub fn step(&mut self, now: Instant, frame: &AudioFrame) -> bool {
        if frame.volume > ACTIVITY_FLOOR {
            self.averages.update(frame);
        }
        self.distance = self.averages.distance();

        let interval = now.as_millis().saturating_sub(self.last_change.as_millis());

        if self.distance < self.tracker && interval > self.timing.lockout.as_millis() {
            self.tracker = self.distance;
        }

        // When no change landed for a whole window, relax the threshold;
        // uniform stretches otherwise leave it stuck below every distance
        // the track still produces.
        if now.as_millis() > self.relax_timer.as_millis() + self.timing.ideal_min.as_millis() {
            if interval > self.timing.ideal_min.as_millis() && self.tracker < RELAX_LIMIT {
                self.threshold += self.nudge();
                #[cfg(feature = "esp32-log")]
                println!(
                    "[ChangeDetector.step] relaxing threshold to {} (lowest distance {})",
                    self.threshold, self.tracker
                );
                self.tracker = f32::INFINITY;
            }
            self.relax_timer = now;
        }

        if self.distance <= self.threshold
            && interval > self.timing.lockout.as_millis()
            && frame.volume > CHANGE_FLOOR
        {
            if interval > self.timing.ideal_max.as_millis() {
                self.threshold += self.nudge();
            } else if interval < self.timing.ideal_min.as_millis() {
                self.threshold -= self.nudge();
            }
            self.threshold = self.threshold.max(0.0);
            self.tracker = f32::INFINITY;
            self.last_change = now;
            #[cfg(feature = "esp32-log")]
            println!(
                "[ChangeDetector.step] change at distance {} after {} ms, threshold now {}",
                self.distance, interval, self.threshold
            );
            return true;
        }

        false
    }

    /// Threshold adjustment magnitude: a tenth of the tracked minimum,
    /// floored at 1. The floor also covers a freshly reset tracker.
    fn nudge(&self) -> f32 {
        if self.tracker.is_finite() {
            (self.tracker / 10.0).max(1.0)
        } else {
            1.0
        }
    }
}
