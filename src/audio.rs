//! Audio feature input.
//!
//! The host's audio-reactive pipeline (sampling, FFT, smoothing) lives
//! outside this crate; add-ons only consume its per-tick scalar outputs.

/// One tick's worth of audio analysis output.
///
/// Feature magnitudes carry whatever units the analysis pipeline produces;
/// consumers only compare them against their own running averages of the
/// same stream. `volume` is the pipeline's smoothed level on its native
/// scale; the built-in thresholds assume the firmware's usual 0-255 range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFrame {
    /// Zero-crossing rate.
    pub zcr: u32,
    /// Broadband energy.
    pub energy: u32,
    /// Low-frequency content.
    pub lfc: u32,
    /// Smoothed volume level.
    pub volume: f32,
}

/// Source of per-tick audio features.
///
/// `None` is a valid, non-error state: the analysis collaborator is absent
/// or produced nothing this tick. Consumers treat it as silence.
pub trait AudioSource {
    /// The current frame, if analysis data is available.
    fn frame(&mut self) -> Option<AudioFrame>;
}
