//! MP3 playback over a serial player module.
//!
//! Wraps a `DFPlayer`-style driver: folder/track selection, volume, and
//! a polled play-to-end loop with sequential or shuffled track advance.

use embassy_time::Instant;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::addon::Addon;
use crate::config::{Record, Value};
use crate::rng::SmallRng;

/// Interval between two playback-state polls.
const POLL_INTERVAL_MS: u64 = 3_000;

/// Loudest volume step the player accepts.
const MAX_VOLUME: u8 = 30;

const DEFAULT_FOLDER: u8 = 1;
const DEFAULT_VOLUME: u8 = 15;
const DEFAULT_TRACK: u8 = 1;
const DEFAULT_RX_PIN: u8 = 17;
const DEFAULT_TX_PIN: u8 = 16;

/// Serial MP3 player driver. `DFPlayer`-shaped; UART framing lives in
/// the host's hardware layer.
pub trait Mp3Driver {
    /// Open the serial link. Returns whether the player answered.
    fn begin(&mut self, rx_pin: u8, tx_pin: u8) -> bool;

    /// Set the output volume (0..=30).
    fn set_volume(&mut self, volume: u8);

    /// Start playback of a track inside a folder.
    fn play_folder_track(&mut self, folder: u8, track: u8);

    /// Stop playback.
    fn stop(&mut self);

    /// Whether a track is playing right now.
    fn is_playing(&mut self) -> bool;

    /// Number of tracks in a folder, if the player knows it.
    fn tracks_in_folder(&mut self, folder: u8) -> Option<u8>;

    /// Hardware reset.
    fn reset(&mut self);
}

/// Persistent settings of the MP3 player module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mp3PlayerConfig {
    /// Folder the tracks play from.
    pub folder: u8,
    /// Shuffle instead of sequential advance.
    pub random: bool,
    /// Keep playing through the folder when a track ends.
    pub loop_folder: bool,
    /// Output volume (0..=30).
    pub volume: u8,
    /// Track selected for playback.
    pub track: u8,
    /// Whether playback is (or should be) running.
    pub start: bool,
    /// UART receive pin.
    pub rx_pin: u8,
    /// UART transmit pin.
    pub tx_pin: u8,
}

impl Default for Mp3PlayerConfig {
    fn default() -> Self {
        Self {
            folder: DEFAULT_FOLDER,
            random: false,
            loop_folder: false,
            volume: DEFAULT_VOLUME,
            track: DEFAULT_TRACK,
            start: false,
            rx_pin: DEFAULT_RX_PIN,
            tx_pin: DEFAULT_TX_PIN,
        }
    }
}

/// The MP3 player add-on.
pub struct Mp3Player<D: Mp3Driver> {
    driver: D,
    config: Mp3PlayerConfig,
    /// Track count of the configured folder, at least 1.
    track_count: u8,
    /// Playback state at the previous poll, for edge detection.
    was_playing: bool,
    poll_timer: Instant,
    rng: SmallRng,
}

impl<D: Mp3Driver> Mp3Player<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            config: Mp3PlayerConfig::default(),
            track_count: 1,
            was_playing: false,
            poll_timer: Instant::from_millis(0),
            rng: SmallRng::seeded(0),
        }
    }

    /// Current configuration.
    pub const fn config(&self) -> &Mp3PlayerConfig {
        &self.config
    }

    /// Track count of the configured folder.
    pub const fn track_count(&self) -> u8 {
        self.track_count
    }

    /// Get a reference to the driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the driver.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Push the configured volume to the player. Out-of-range values are
    /// stored but never sent.
    fn apply_volume(&mut self) {
        if self.config.volume <= MAX_VOLUME {
            self.driver.set_volume(self.config.volume);
        }
    }

    /// Start or stop playback according to the start flag.
    fn apply_transport(&mut self) {
        if self.config.start {
            self.driver
                .play_folder_track(self.config.folder, self.config.track);
        } else {
            self.driver.stop();
        }
    }

    /// Pick the track to play after the current one.
    ///
    /// Sequential mode wraps through the folder; shuffle mode draws
    /// uniformly over the other tracks. A single-track folder keeps the
    /// current track.
    fn next_track(&mut self) -> u8 {
        if self.track_count <= 1 {
            return self.config.track;
        }
        if self.config.random {
            let current = self.config.track;
            let in_folder = (1..=self.track_count).contains(&current);
            let pool = if in_folder {
                self.track_count - 1
            } else {
                self.track_count
            };
            #[allow(clippy::cast_possible_truncation)]
            let mut track = self.rng.pick(usize::from(pool)) as u8 + 1;
            if in_folder && track >= current {
                track += 1;
            }
            track
        } else if self.config.track >= self.track_count {
            1
        } else {
            self.config.track + 1
        }
    }
}

impl<D: Mp3Driver> Addon for Mp3Player<D> {
    fn name(&self) -> &'static str {
        "dfplayer"
    }

    fn setup(&mut self, now: Instant) {
        let _online = self.driver.begin(self.config.rx_pin, self.config.tx_pin);
        #[cfg(feature = "esp32-log")]
        println!(
            "[Mp3Player.setup] player {}",
            if _online { "online" } else { "failed" }
        );
        self.apply_volume();
        self.track_count = self
            .driver
            .tracks_in_folder(self.config.folder)
            .unwrap_or(1);
        self.was_playing = self.driver.is_playing();
        self.poll_timer = now;
        self.rng = SmallRng::seeded(now.as_ticks());
    }

    fn tick(&mut self, now: Instant) {
        if now.as_millis().saturating_sub(self.poll_timer.as_millis()) <= POLL_INTERVAL_MS {
            return;
        }
        if self.config.start {
            let playing = self.driver.is_playing();
            if playing != self.was_playing {
                self.was_playing = playing;
                if !playing {
                    // Track ran to its end.
                    if self.config.loop_folder {
                        self.config.track = self.next_track();
                        #[cfg(feature = "esp32-log")]
                        println!(
                            "[Mp3Player.tick] track finished, continuing with {}",
                            self.config.track
                        );
                    } else {
                        self.config.start = false;
                    }
                    self.apply_transport();
                }
            }
        }
        self.poll_timer = now;
    }

    fn save_config(&mut self, record: &mut Record) {
        let _ = record.set("folder", Value::U8(self.config.folder));
        let _ = record.set("random", Value::Bool(self.config.random));
        let _ = record.set("loopfolder", Value::Bool(self.config.loop_folder));
        let _ = record.set("volume", Value::U8(self.config.volume));
        let _ = record.set("tracknr", Value::U8(self.config.track));
        let _ = record.set("start", Value::Bool(self.config.start));
        let _ = record.set("rxPin", Value::U8(self.config.rx_pin));
        let _ = record.set("txPin", Value::U8(self.config.tx_pin));
    }

    fn load_config(&mut self, record: &Record) -> bool {
        let mut complete = true;
        self.config.folder = record.read_or("folder", DEFAULT_FOLDER, &mut complete);
        self.config.random = record.read_or("random", false, &mut complete);
        self.config.loop_folder = record.read_or("loopfolder", false, &mut complete);
        self.config.volume = record.read_or("volume", DEFAULT_VOLUME, &mut complete);
        self.config.track = record.read_or("tracknr", DEFAULT_TRACK, &mut complete);
        self.config.start = record.read_or("start", false, &mut complete);
        self.config.rx_pin = record.read_or("rxPin", DEFAULT_RX_PIN, &mut complete);
        self.config.tx_pin = record.read_or("txPin", DEFAULT_TX_PIN, &mut complete);
        complete
    }

    fn read_state(&self, record: &mut Record) {
        let _ = record.set("folder", Value::U8(self.config.folder));
        let _ = record.set("random", Value::Bool(self.config.random));
        let _ = record.set("loopfolder", Value::Bool(self.config.loop_folder));
        let _ = record.set("volume", Value::U8(self.config.volume));
        let _ = record.set("tracknr", Value::U8(self.config.track));
        let _ = record.set("start", Value::Bool(self.config.start));
    }

    fn write_state(&mut self, record: &Record) {
        // A present reset key short-circuits every other command.
        if let Some(reset) = record.get_as::<bool>("reset") {
            if reset {
                self.driver.reset();
            }
            return;
        }
        if let Some(volume) = record.get_as("volume") {
            self.config.volume = volume;
            self.apply_volume();
        }
        // Absent booleans fall back to off.
        self.config.random = record.get_as("random").unwrap_or(false);
        self.config.loop_folder = record.get_as("loopfolder").unwrap_or(false);
        if let Some(folder) = record.get_as("folder") {
            self.config.folder = folder;
            self.track_count = self.driver.tracks_in_folder(folder).unwrap_or(1);
        }
        if let Some(track) = record.get_as("tracknr") {
            // Shuffle overrides an explicit track selection.
            self.config.track = if self.config.random {
                self.next_track()
            } else {
                track
            };
        }
        if let Some(start) = record.get_as("play") {
            self.config.start = start;
            self.apply_transport();
        }
    }
}
