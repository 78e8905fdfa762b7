//! The add-on lifecycle.
//!
//! The host firmware owns the main loop, persistence and the state API;
//! add-ons only react to the hooks below. `load_config` runs before
//! `setup` and again whenever settings are saved, so persistent fields
//! are always in place by the time ticking starts.

use embassy_time::Instant;

use crate::config::Record;

/// A host-driven add-on module.
///
/// `setup` and `tick` carry the host's monotonic clock; implementations
/// never read time themselves.
pub trait Addon {
    /// Stable identifier. The host namespaces the module's config and
    /// state records under this name.
    fn name(&self) -> &'static str;

    /// Called once at boot, after the first `load_config`.
    fn setup(&mut self, now: Instant);

    /// Called once per host loop iteration. Must not block.
    fn tick(&mut self, now: Instant);

    /// Write all persistent fields into `record`.
    fn save_config(&mut self, _record: &mut Record) {}

    /// Read persistent fields from `record`, falling back to defaults
    /// for missing keys. Returns `true` only if every key was present.
    fn load_config(&mut self, _record: &Record) -> bool {
        true
    }

    /// Fill `record` with the module's live state.
    fn read_state(&self, _record: &mut Record) {}

    /// Apply client-writable fields from a state record.
    fn write_state(&mut self, _record: &Record) {}
}
