//! Host-side preset and playlist surface.

/// Identifier of a stored preset. Id 0 means "no preset".
pub type PresetId = u8;

/// Identifier of a playlist. Id 0 means "no playlist".
pub type PlaylistId = u8;

/// Preset and playlist capabilities the host firmware exposes to add-ons.
///
/// Playlists are applied through [`apply_preset`](Self::apply_preset) like
/// any other preset; the host resolves the id.
pub trait PresetHost {
    /// Id of the playlist currently driving the strip, 0 if none.
    fn current_playlist(&self) -> PlaylistId;

    /// Id of the active preset, 0 if none.
    fn current_preset(&self) -> PresetId;

    /// Ordered preset ids belonging to a playlist; empty if unknown.
    fn presets_of(&self, playlist: PlaylistId) -> &[PresetId];

    /// Activate a preset, optionally notifying linked controllers.
    fn apply_preset(&mut self, id: PresetId, notify: bool);

    /// Human-readable preset name, for diagnostics.
    fn preset_name(&self, id: PresetId) -> &str;

    /// Master brightness, 0 while the strip is dark.
    fn brightness(&self) -> u8;
}
