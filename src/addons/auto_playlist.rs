//! Audio-driven playlist and preset switching.
//!
//! Two independent decisions, evaluated once per tick:
//!
//! - A silence gate switches between an ambient playlist (quiet room)
//!   and a music playlist (sound present).
//! - While music plays, a change detector watches the spectral feature
//!   distance and swaps in a random preset of the current playlist
//!   whenever the music changes character.

use embassy_time::{Duration, Instant};
use heapless::Vec;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::addon::Addon;
use crate::audio::AudioSource;
use crate::config::{Record, Value};
use crate::detector::{ChangeDetector, ChangeTiming};
use crate::host::{PlaylistId, PresetHost, PresetId};
use crate::rng::SmallRng;
use crate::silence::{SilenceEdge, SilenceGate};

/// Ticks are ignored for this long after boot while readings settle.
const SETTLE_MS: u64 = 10_000;

const DEFAULT_AMBIENT_PLAYLIST: PlaylistId = 1;
const DEFAULT_MUSIC_PLAYLIST: PlaylistId = 2;
const DEFAULT_TIMEOUT_S: u16 = 60;
const DEFAULT_LOCKOUT_MS: u32 = 1_000;
const DEFAULT_IDEAL_MIN_MS: u32 = 10_000;
const DEFAULT_IDEAL_MAX_MS: u32 = 20_000;

/// Persistent settings of the auto-playlist module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoPlaylistConfig {
    /// Playlist applied when the room falls silent.
    pub ambient_playlist: PlaylistId,
    /// Playlist applied when sound resumes.
    pub music_playlist: PlaylistId,
    /// Silence duration after which the ambient playlist kicks in.
    pub timeout: Duration,
    /// Enables distance-based preset changes while music plays.
    pub auto_change: bool,
    /// Pacing of distance-based changes.
    pub timing: ChangeTiming,
}

impl Default for AutoPlaylistConfig {
    fn default() -> Self {
        Self {
            ambient_playlist: DEFAULT_AMBIENT_PLAYLIST,
            music_playlist: DEFAULT_MUSIC_PLAYLIST,
            timeout: Duration::from_secs(u64::from(DEFAULT_TIMEOUT_S)),
            auto_change: false,
            timing: ChangeTiming {
                lockout: Duration::from_millis(u64::from(DEFAULT_LOCKOUT_MS)),
                ideal_min: Duration::from_millis(u64::from(DEFAULT_IDEAL_MIN_MS)),
                ideal_max: Duration::from_millis(u64::from(DEFAULT_IDEAL_MAX_MS)),
            },
        }
    }
}

/// The auto-playlist add-on.
///
/// `MAX_PRESETS` bounds the candidate preset set; ids beyond the capacity
/// are ignored when a playlist is loaded.
pub struct AutoPlaylist<A: AudioSource, H: PresetHost, const MAX_PRESETS: usize> {
    audio: A,
    host: H,
    config: AutoPlaylistConfig,
    enabled: bool,
    boot: Instant,
    gate: SilenceGate,
    detector: ChangeDetector,
    /// Preset ids of the current playlist, filled lazily on the first
    /// change event and cleared when settings are saved.
    candidates: Vec<PresetId, MAX_PRESETS>,
    /// Last playlist this module applied, 0 if none. Lets the tick spot
    /// playlist changes made by the user.
    last_auto_playlist: PlaylistId,
    rng: SmallRng,
}

impl<A: AudioSource, H: PresetHost, const MAX_PRESETS: usize> AutoPlaylist<A, H, MAX_PRESETS> {
    /// Create the module with default configuration, disabled.
    pub fn new(audio: A, host: H) -> Self {
        let config = AutoPlaylistConfig::default();
        Self {
            audio,
            host,
            enabled: false,
            boot: Instant::from_millis(0),
            gate: SilenceGate::new(config.timeout),
            detector: ChangeDetector::new(config.timing),
            candidates: Vec::new(),
            last_auto_playlist: 0,
            rng: SmallRng::seeded(0),
            config,
        }
    }

    /// Enable or disable the module.
    pub fn enable(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the module is currently enabled.
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current configuration.
    pub const fn config(&self) -> &AutoPlaylistConfig {
        &self.config
    }

    /// Get a reference to the audio source.
    pub fn audio(&self) -> &A {
        &self.audio
    }

    /// Get a mutable reference to the audio source.
    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    /// Get a reference to the host surface.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Get a mutable reference to the host surface.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Follow playlist changes made by the user.
    ///
    /// Leaving the playlist this module applied disables it; coming back
    /// to the music playlist (or selecting it while disabled) enables it.
    fn track_manual_override(&mut self) {
        let playlist = self.host.current_playlist();
        if self.last_auto_playlist != 0
            && playlist != self.last_auto_playlist
            && self.host.current_preset() != 0
        {
            if playlist == self.config.music_playlist {
                #[cfg(feature = "esp32-log")]
                println!(
                    "[AutoPlaylist.tick] re-enabled by manual switch back to playlist {}",
                    playlist
                );
                self.enabled = true;
                self.last_auto_playlist = playlist;
            } else if self.enabled {
                #[cfg(feature = "esp32-log")]
                println!(
                    "[AutoPlaylist.tick] disabled by manual switch to playlist {}",
                    playlist
                );
                self.enabled = false;
            }
        }
        if !self.enabled && playlist == self.config.music_playlist {
            self.enabled = true;
        }
    }

    /// Apply a playlist and remember it as ours.
    fn switch_playlist(&mut self, id: PlaylistId) {
        #[cfg(feature = "esp32-log")]
        println!(
            "[AutoPlaylist.switch_playlist] apply {}",
            self.host.preset_name(id)
        );
        self.host.apply_preset(id, true);
        self.last_auto_playlist = id;
    }

    /// Swap in a random preset of the current playlist.
    ///
    /// A set with no alternative to the active preset skips the swap;
    /// the detector has already recorded the event's pacing, so skipping
    /// only means the lights keep their preset.
    fn switch_preset(&mut self) {
        if self.candidates.is_empty() {
            let playlist = self.host.current_playlist();
            for &id in self.host.presets_of(playlist) {
                let _ = self.candidates.push(id);
            }
            #[cfg(feature = "esp32-log")]
            println!(
                "[AutoPlaylist.switch_preset] loaded {} presets from playlist {}",
                self.candidates.len(),
                playlist
            );
        }
        if self.candidates.len() <= 1 {
            return;
        }

        let current = self.host.current_preset();
        let mut pick = self.candidates[self.rng.pick(self.candidates.len())];
        if pick == current {
            match self.draw_excluding(current) {
                Some(id) => pick = id,
                None => return,
            }
        }
        self.host.apply_preset(pick, false);
    }

    /// One uniform draw over the candidates that differ from `current`.
    fn draw_excluding(&mut self, current: PresetId) -> Option<PresetId> {
        let others = self.candidates.iter().filter(|&&id| id != current).count();
        if others == 0 {
            return None;
        }
        let nth = self.rng.pick(others);
        self.candidates
            .iter()
            .filter(|&&id| id != current)
            .nth(nth)
            .copied()
    }
}

impl<A: AudioSource, H: PresetHost, const MAX_PRESETS: usize> Addon
    for AutoPlaylist<A, H, MAX_PRESETS>
{
    fn name(&self) -> &'static str {
        "AutoPlaylist"
    }

    fn setup(&mut self, now: Instant) {
        self.boot = now;
        self.gate.arm(now);
        self.detector.arm(now);
        self.rng = SmallRng::seeded(now.as_ticks());
        #[cfg(feature = "esp32-log")]
        println!("[AutoPlaylist.setup] ready");
    }

    fn tick(&mut self, now: Instant) {
        if now.as_millis() < self.boot.as_millis() + SETTLE_MS {
            return;
        }

        self.track_manual_override();
        if !self.enabled {
            return;
        }
        if self.host.brightness() == 0 {
            return;
        }

        let Some(frame) = self.audio.frame() else {
            // No analysis data this tick: hold everything and wait.
            self.gate.mark_silent();
            return;
        };

        match self.gate.update(now, frame.volume) {
            Some(SilenceEdge::FellSilent) => self.switch_playlist(self.config.ambient_playlist),
            Some(SilenceEdge::SoundResumed) => self.switch_playlist(self.config.music_playlist),
            None => {}
        }

        if !self.gate.is_silent() && self.config.auto_change && self.detector.step(now, &frame) {
            self.switch_preset();
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn save_config(&mut self, record: &mut Record) {
        let _ = record.set("enabled", Value::Bool(self.enabled));
        let _ = record.set("timeout", Value::U16(self.config.timeout.as_secs() as u16));
        let _ = record.set("ambientPlaylist", Value::U8(self.config.ambient_playlist));
        let _ = record.set("musicPlaylist", Value::U8(self.config.music_playlist));
        let _ = record.set("autoChange", Value::Bool(self.config.auto_change));
        let _ = record.set(
            "change_lockout",
            Value::U32(self.config.timing.lockout.as_millis() as u32),
        );
        let _ = record.set(
            "ideal_change_min",
            Value::U32(self.config.timing.ideal_min.as_millis() as u32),
        );
        let _ = record.set(
            "ideal_change_max",
            Value::U32(self.config.timing.ideal_max.as_millis() as u32),
        );

        // Saving settings may have rewritten the playlists.
        self.candidates.clear();
        self.last_auto_playlist = 0;
    }

    fn load_config(&mut self, record: &Record) -> bool {
        let mut complete = true;
        self.enabled = record.read_or("enabled", false, &mut complete);
        let timeout: u16 = record.read_or("timeout", DEFAULT_TIMEOUT_S, &mut complete);
        self.config.timeout = Duration::from_secs(u64::from(timeout));
        self.config.ambient_playlist =
            record.read_or("ambientPlaylist", DEFAULT_AMBIENT_PLAYLIST, &mut complete);
        self.config.music_playlist =
            record.read_or("musicPlaylist", DEFAULT_MUSIC_PLAYLIST, &mut complete);
        self.config.auto_change = record.read_or("autoChange", false, &mut complete);
        let lockout: u32 = record.read_or("change_lockout", DEFAULT_LOCKOUT_MS, &mut complete);
        let ideal_min: u32 =
            record.read_or("ideal_change_min", DEFAULT_IDEAL_MIN_MS, &mut complete);
        let ideal_max: u32 =
            record.read_or("ideal_change_max", DEFAULT_IDEAL_MAX_MS, &mut complete);
        self.config.timing = ChangeTiming {
            lockout: Duration::from_millis(u64::from(lockout)),
            ideal_min: Duration::from_millis(u64::from(ideal_min)),
            ideal_max: Duration::from_millis(u64::from(ideal_max)),
        };
        self.gate.set_timeout(self.config.timeout);
        self.detector.set_timing(self.config.timing);
        complete
    }

    #[allow(clippy::cast_possible_truncation)]
    fn read_state(&self, record: &mut Record) {
        let _ = record.set("enabled", Value::Bool(self.enabled));
        let _ = record.set(
            "lastSoundTime",
            Value::U32(self.gate.last_sound().as_millis() as u32),
        );
    }

    fn write_state(&mut self, record: &Record) {
        if let Some(enabled) = record.get_as("enabled") {
            self.enabled = enabled;
        }
    }
}
