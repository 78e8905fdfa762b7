#![no_std]

pub mod addon;
pub mod addons;
pub mod audio;
pub mod config;
pub mod detector;
pub mod host;
pub mod rng;
pub mod silence;

pub use addon::Addon;
pub use addons::auto_playlist::{AutoPlaylist, AutoPlaylistConfig};
pub use addons::bt_audio::{BtAudio, BtAudioConfig, I2sPins, SinkDriver};
pub use addons::mcu_temp::{McuTemp, TelemetrySink, TempSensor};
pub use addons::mp3_player::{Mp3Driver, Mp3Player, Mp3PlayerConfig};

pub use audio::{AudioFrame, AudioSource};
pub use config::{FromValue, Record, RecordFull, Value};
pub use detector::{ChangeDetector, ChangeTiming, FeatureAverages};
pub use host::{PlaylistId, PresetHost, PresetId};
pub use rng::SmallRng;
pub use silence::{SilenceEdge, SilenceGate};

pub use embassy_time::{Duration, Instant};
