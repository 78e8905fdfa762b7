//! Bluetooth audio sink control.
//!
//! Thin switch around an A2DP sink driver: carries the advertised device
//! name and the I²S output wiring, and starts or stops the sink with the
//! module's enabled state.

use embassy_time::Instant;
use heapless::String;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::addon::Addon;
use crate::config::{MAX_STR, Record, Value};

const DEFAULT_NAME: &str = "Forty-Two";
const DEFAULT_BCK_PIN: i8 = 26;
const DEFAULT_WS_PIN: i8 = 25;
const DEFAULT_DATA_PIN: i8 = 22;

/// I²S output pin assignment; -1 marks an unset pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2sPins {
    pub bck: i8,
    pub ws: i8,
    pub data: i8,
}

impl I2sPins {
    /// Whether every pin carries a real assignment.
    pub const fn all_set(&self) -> bool {
        self.bck >= 0 && self.ws >= 0 && self.data >= 0
    }
}

/// Bluetooth sink driver. A2DP-shaped; the radio stack is the host's
/// business.
pub trait SinkDriver {
    /// Bring the sink up under `name`, outputting through the internal
    /// DAC or the given I²S pins.
    fn start(&mut self, name: &str, internal_dac: bool, pins: I2sPins);

    /// Tear the sink down.
    fn stop(&mut self);
}

/// Persistent settings of the Bluetooth audio module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BtAudioConfig {
    /// Name the sink advertises to sources.
    pub device_name: String<MAX_STR>,
    /// Route audio through the chip's internal DAC instead of I²S.
    pub internal_dac: bool,
    /// External I²S wiring, used when the internal DAC is off.
    pub pins: I2sPins,
}

impl Default for BtAudioConfig {
    fn default() -> Self {
        Self {
            device_name: String::try_from(DEFAULT_NAME).unwrap_or_default(),
            internal_dac: false,
            pins: I2sPins {
                bck: DEFAULT_BCK_PIN,
                ws: DEFAULT_WS_PIN,
                data: DEFAULT_DATA_PIN,
            },
        }
    }
}

/// The Bluetooth audio sink add-on.
pub struct BtAudio<S: SinkDriver> {
    sink: S,
    config: BtAudioConfig,
    enabled: bool,
    running: bool,
}

impl<S: SinkDriver> BtAudio<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            config: BtAudioConfig::default(),
            enabled: false,
            running: false,
        }
    }

    /// Current configuration.
    pub const fn config(&self) -> &BtAudioConfig {
        &self.config
    }

    /// Whether the module is currently enabled.
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the sink has been started.
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Get a reference to the sink driver.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Get a mutable reference to the sink driver.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Enable or disable the module, starting or stopping the sink
    /// immediately.
    pub fn enable(&mut self, enabled: bool) {
        self.enabled = enabled;
        if enabled {
            self.start_sink();
        } else {
            self.stop_sink();
        }
    }

    fn start_sink(&mut self) {
        if self.running {
            return;
        }
        // The sink needs an output route: internal DAC or a full pin set.
        if !self.config.internal_dac && !self.config.pins.all_set() {
            return;
        }
        #[cfg(feature = "esp32-log")]
        println!(
            "[BtAudio.start_sink] starting as {}",
            self.config.device_name.as_str()
        );
        self.sink.start(
            self.config.device_name.as_str(),
            self.config.internal_dac,
            self.config.pins,
        );
        self.running = true;
    }

    fn stop_sink(&mut self) {
        if !self.running {
            return;
        }
        self.sink.stop();
        self.running = false;
    }
}

impl<S: SinkDriver> Addon for BtAudio<S> {
    fn name(&self) -> &'static str {
        "a2dp"
    }

    fn setup(&mut self, _now: Instant) {
        if self.enabled {
            self.start_sink();
        }
    }

    fn tick(&mut self, _now: Instant) {}

    fn save_config(&mut self, record: &mut Record) {
        let _ = record.set("enabled", Value::Bool(self.enabled));
        let _ = record.set("btName", Value::str(&self.config.device_name));
        let _ = record.set("internalDac", Value::Bool(self.config.internal_dac));
        let _ = record.set("bckPin", Value::I32(i32::from(self.config.pins.bck)));
        let _ = record.set("wsPin", Value::I32(i32::from(self.config.pins.ws)));
        let _ = record.set("dataPin", Value::I32(i32::from(self.config.pins.data)));
    }

    fn load_config(&mut self, record: &Record) -> bool {
        let defaults = BtAudioConfig::default();
        let mut complete = true;
        self.enabled = record.read_or("enabled", false, &mut complete);
        self.config.device_name = record.read_or("btName", defaults.device_name, &mut complete);
        self.config.internal_dac =
            record.read_or("internalDac", defaults.internal_dac, &mut complete);
        self.config.pins.bck = record.read_or("bckPin", defaults.pins.bck, &mut complete);
        self.config.pins.ws = record.read_or("wsPin", defaults.pins.ws, &mut complete);
        self.config.pins.data = record.read_or("dataPin", defaults.pins.data, &mut complete);
        complete
    }

    fn read_state(&self, record: &mut Record) {
        let _ = record.set("enabled", Value::Bool(self.enabled));
    }

    fn write_state(&mut self, record: &Record) {
        if let Some(enabled) = record.get_as("enabled") {
            self.enable(enabled);
        }
    }
}
