//! Internal MCU temperature reporting.
//!
//! Polls the chip's built-in sensor and publishes the Celsius reading
//! once per second over the host's telemetry transport.

use core::fmt::Write as _;

use embassy_time::Instant;
use heapless::String;
use libm::roundf;

use crate::addon::Addon;
use crate::config::{Record, Value};

/// Telemetry subtopic for temperature readings. The device prefix is the
/// transport's business.
const TOPIC: &str = "mcutemp";

/// Minimum interval between two published readings.
const PUBLISH_INTERVAL_MS: u64 = 1_000;

/// Internal temperature sensor, reporting raw degrees Fahrenheit.
pub trait TempSensor {
    fn read_fahrenheit(&mut self) -> u8;
}

/// Outbound telemetry transport. MQTT-shaped; the connection is the
/// host's business.
pub trait TelemetrySink {
    fn publish(&mut self, topic: &str, payload: &str);
}

/// The MCU temperature add-on.
pub struct McuTemp<S: TempSensor, T: TelemetrySink> {
    sensor: S,
    sink: T,
    enabled: bool,
    celsius: f32,
    last_publish: Instant,
}

impl<S: TempSensor, T: TelemetrySink> McuTemp<S, T> {
    pub fn new(sensor: S, sink: T) -> Self {
        Self {
            sensor,
            sink,
            enabled: false,
            celsius: 0.0,
            last_publish: Instant::from_millis(0),
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

    /// Latest Celsius reading, rounded to two decimals.
    pub const fn celsius(&self) -> f32 {
        self.celsius
    }

    /// Get a reference to the sensor.
    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    /// Get a mutable reference to the sensor.
    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Get a reference to the telemetry sink.
    pub fn sink(&self) -> &T {
        &self.sink
    }

    /// Get a mutable reference to the telemetry sink.
    pub fn sink_mut(&mut self) -> &mut T {
        &mut self.sink
    }
}

impl<S: TempSensor, T: TelemetrySink> Addon for McuTemp<S, T> {
    fn name(&self) -> &'static str {
        "mcuTemp"
    }

    fn setup(&mut self, _now: Instant) {}

    fn tick(&mut self, now: Instant) {
        if !self.enabled {
            return;
        }

        let raw = self.sensor.read_fahrenheit();
        self.celsius = roundf((f32::from(raw) - 32.0) / 1.8 * 100.0) / 100.0;

        if now.as_millis().saturating_sub(self.last_publish.as_millis()) > PUBLISH_INTERVAL_MS {
            let mut payload: String<16> = String::new();
            let _ = write!(payload, "{:.2}", self.celsius);
            self.sink.publish(TOPIC, &payload);
            self.last_publish = now;
        }
    }

    fn save_config(&mut self, record: &mut Record) {
        let _ = record.set("enabled", Value::Bool(self.enabled));
    }

    fn load_config(&mut self, record: &Record) -> bool {
        let mut complete = true;
        self.enabled = record.read_or("enabled", false, &mut complete);
        complete
    }

    fn read_state(&self, record: &mut Record) {
        let _ = record.set("temperature", Value::F32(self.celsius));
        let _ = record.set("unit", Value::str(" °C"));
    }
}
