//! Silence detection over the smoothed volume level.

use embassy_time::{Duration, Instant};

/// Volume above which the input counts as sound.
const SOUND_FLOOR: f32 = 0.5;

/// State flip reported by [`SilenceGate::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SilenceEdge {
    /// The timeout elapsed without sound.
    FellSilent,
    /// Sound came back after a silent stretch.
    SoundResumed,
}

/// Edge-triggered silence gate.
///
/// Tracks the last time the volume exceeded the sound floor and flips to
/// silent once the timeout passes without it. Each flip is reported
/// exactly once; holding a state yields `None`.
#[derive(Debug)]
pub struct SilenceGate {
    timeout: Duration,
    last_sound: Instant,
    silent: bool,
}

impl SilenceGate {
    /// Create a gate that starts out silent.
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_sound: Instant::from_millis(0),
            silent: true,
        }
    }

    /// Restart the gate: silent, with the sound clock at `now`.
    pub fn arm(&mut self, now: Instant) {
        self.last_sound = now;
        self.silent = true;
    }

    /// Replace the timeout. Takes effect on the next update.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Whether the gate currently considers the input silent.
    pub const fn is_silent(&self) -> bool {
        self.silent
    }

    /// When the volume last exceeded the sound floor.
    pub const fn last_sound(&self) -> Instant {
        self.last_sound
    }

    /// Force the silent state without reporting an edge.
    ///
    /// For ticks with no analysis data at all: the state flips quietly,
    /// and the resume edge fires once data returns.
    pub fn mark_silent(&mut self) {
        self.silent = true;
    }

    /// Ingest one volume sample; reports a state flip, if any.
    pub fn update(&mut self, now: Instant, volume: f32) -> Option<SilenceEdge> {
        if volume > SOUND_FLOOR {
            self.last_sound = now;
        }

        let quiet_for = now.as_millis().saturating_sub(self.last_sound.as_millis());
        if quiet_for > self.timeout.as_millis() {
            if !self.silent {
                self.silent = true;
                return Some(SilenceEdge::FellSilent);
            }
        } else if self.silent {
            self.silent = false;
            return Some(SilenceEdge::SoundResumed);
        }

        None
    }
}
