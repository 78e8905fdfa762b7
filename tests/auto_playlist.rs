mod tests {
    use embassy_time::{Duration, Instant};
    use heapless::Vec;
    use lumora_addons::{
        Addon, AudioFrame, AudioSource, AutoPlaylist, PlaylistId, PresetHost, PresetId, Record,
        Value,
    };

    /// Loud frame sitting at the detector's idle feature levels, so the
    /// feature distance stays zero while it repeats.
    const MUSIC: AudioFrame = AudioFrame {
        zcr: 500,
        energy: 250,
        lfc: 1000,
        volume: 2.0,
    };

    const QUIET: AudioFrame = AudioFrame {
        zcr: 0,
        energy: 0,
        lfc: 0,
        volume: 0.0,
    };

    struct ScriptedAudio {
        frame: Option<AudioFrame>,
    }

    impl AudioSource for ScriptedAudio {
        fn frame(&mut self) -> Option<AudioFrame> {
            self.frame
        }
    }

    struct FakeHost {
        playlist: PlaylistId,
        preset: PresetId,
        presets: Vec<PresetId, 8>,
        brightness: u8,
        applied: Vec<(PresetId, bool), 32>,
    }

    impl PresetHost for FakeHost {
        fn current_playlist(&self) -> PlaylistId {
            self.playlist
        }

        fn current_preset(&self) -> PresetId {
            self.preset
        }

        fn presets_of(&self, playlist: PlaylistId) -> &[PresetId] {
            if playlist == self.playlist {
                &self.presets
            } else {
                &[]
            }
        }

        fn apply_preset(&mut self, id: PresetId, notify: bool) {
            self.applied.push((id, notify)).unwrap();
        }

        fn preset_name(&self, _id: PresetId) -> &str {
            "preset"
        }

        fn brightness(&self) -> u8 {
            self.brightness
        }
    }

    fn fake_host(playlist: PlaylistId, presets: &[PresetId]) -> FakeHost {
        let mut host = FakeHost {
            playlist,
            preset: 0,
            presets: Vec::new(),
            brightness: 128,
            applied: Vec::new(),
        };
        host.presets.extend_from_slice(presets).unwrap();
        host
    }

    /// Module with `enabled` set, loaded config and `setup` at t=0.
    fn configured(host: FakeHost, auto_change: bool) -> AutoPlaylist<ScriptedAudio, FakeHost, 8> {
        let audio = ScriptedAudio { frame: Some(MUSIC) };
        let mut module = AutoPlaylist::<_, _, 8>::new(audio, host);

        let mut record = Record::new();
        record.set("enabled", Value::Bool(true)).unwrap();
        record.set("autoChange", Value::Bool(auto_change)).unwrap();
        assert!(!module.load_config(&record));

        module.setup(Instant::from_millis(0));
        module
    }

    fn activations(module: &AutoPlaylist<ScriptedAudio, FakeHost, 8>) -> usize {
        module
            .host()
            .applied
            .iter()
            .filter(|&&(_, notify)| !notify)
            .count()
    }

    #[test]
    fn test_ticks_before_settle_are_ignored() {
        let mut module = configured(fake_host(2, &[]), false);
        module.tick(Instant::from_millis(5_000));
        module.tick(Instant::from_millis(9_999));
        assert!(module.host().applied.is_empty());

        module.tick(Instant::from_millis(10_000));
        assert_eq!(module.host().applied.len(), 1);
    }

    #[test]
    fn test_silence_switches_to_ambient_once() {
        let mut module = configured(fake_host(2, &[]), false);
        module.audio_mut().frame = Some(QUIET);

        // One tick per second from the end of the settle window.
        for s in 10..=70u64 {
            module.tick(Instant::from_millis(s * 1_000));
        }

        // Sound never arrived: the armed gate resolves to the music
        // playlist once, then the timeout switches to ambient exactly
        // once. Nothing repeats afterwards.
        assert_eq!(module.host().applied, [(2, true), (1, true)]);
    }

    #[test]
    fn test_sound_resume_switches_back_to_music() {
        let mut module = configured(fake_host(2, &[]), false);
        module.audio_mut().frame = Some(QUIET);
        for s in 10..=70u64 {
            module.tick(Instant::from_millis(s * 1_000));
        }

        module.audio_mut().frame = Some(MUSIC);
        module.tick(Instant::from_millis(71_000));
        module.tick(Instant::from_millis(72_000));
        assert_eq!(module.host().applied, [(2, true), (1, true), (2, true)]);
    }

    #[test]
    fn test_missing_audio_means_silence_without_switching() {
        let mut module = configured(fake_host(2, &[]), false);
        module.audio_mut().frame = None;

        for s in 10..=80u64 {
            module.tick(Instant::from_millis(s * 1_000));
        }
        // No analysis collaborator: no playlist changes at all.
        assert!(module.host().applied.is_empty());

        // When analysis data appears, the music playlist comes back.
        module.audio_mut().frame = Some(MUSIC);
        module.tick(Instant::from_millis(81_000));
        assert_eq!(module.host().applied, [(2, true)]);
    }

    #[test]
    fn test_dark_strip_suspends_the_module() {
        let mut host = fake_host(2, &[]);
        host.brightness = 0;
        let mut module = configured(host, false);

        module.tick(Instant::from_millis(10_000));
        assert!(module.host().applied.is_empty());
    }

    #[test]
    fn test_change_event_activates_a_different_preset() {
        let mut module = configured(fake_host(2, &[4, 5, 6]), true);
        module.host_mut().preset = 5;

        // Distance is zero from the start, so the first tick past the
        // settle window (and the lockout) fires a change.
        module.tick(Instant::from_millis(10_000));
        assert_eq!(activations(&module), 1);
        let (id, notify) = *module.host().applied.last().unwrap();
        assert!(!notify);
        assert!(id == 4 || id == 6);

        // Within the lockout no second activation fires.
        module.tick(Instant::from_millis(10_500));
        assert_eq!(activations(&module), 1);
    }

    #[test]
    fn test_singleton_playlist_never_activates() {
        let mut module = configured(fake_host(2, &[7]), true);
        module.host_mut().preset = 7;

        for s in 10..=30u64 {
            module.tick(Instant::from_millis(s * 1_000));
        }
        // Change events keep firing, but with a single candidate there
        // is nothing to switch to.
        assert_eq!(activations(&module), 0);
    }

    #[test]
    fn test_all_duplicate_playlist_never_activates() {
        let mut module = configured(fake_host(2, &[7, 7]), true);
        module.host_mut().preset = 7;

        for s in 10..=30u64 {
            module.tick(Instant::from_millis(s * 1_000));
        }
        // Two candidates pass the size check, but both are the active
        // preset: every exclusion draw comes up empty. The one apply is
        // the armed gate resolving to the music playlist.
        assert_eq!(activations(&module), 0);
        assert_eq!(module.host().applied, [(2, true)]);
    }

    #[test]
    fn test_empty_playlist_is_harmless() {
        let mut module = configured(fake_host(2, &[]), true);
        for s in 10..=20u64 {
            module.tick(Instant::from_millis(s * 1_000));
        }
        assert_eq!(activations(&module), 0);
    }

    #[test]
    fn test_saving_config_invalidates_the_candidate_set() {
        let mut module = configured(fake_host(2, &[4, 5, 6]), true);
        module.host_mut().preset = 5;
        module.tick(Instant::from_millis(10_000));
        assert_eq!(activations(&module), 1);

        let mut record = Record::new();
        module.save_config(&mut record);

        // The playlist content changes; the next event must reload it.
        module.host_mut().presets.clear();
        module.host_mut().presets.extend_from_slice(&[20, 21]).unwrap();
        module.host_mut().preset = 20;
        module.tick(Instant::from_millis(12_000));

        assert_eq!(*module.host().applied.last().unwrap(), (21, false));
    }

    #[test]
    fn test_manual_playlist_change_disables_the_module() {
        let mut module = configured(fake_host(2, &[]), false);

        // The module switches to the music playlist and records it.
        module.tick(Instant::from_millis(10_000));
        assert!(module.is_enabled());

        // The user picks another playlist by hand.
        module.host_mut().playlist = 9;
        module.host_mut().preset = 3;
        module.tick(Instant::from_millis(11_000));
        assert!(!module.is_enabled());

        // Ticking on changes nothing while disabled.
        module.tick(Instant::from_millis(12_000));
        assert_eq!(module.host().applied.len(), 1);
    }

    #[test]
    fn test_manual_switch_back_to_music_re_enables() {
        let mut module = configured(fake_host(2, &[]), false);
        module.tick(Instant::from_millis(10_000));

        module.host_mut().playlist = 9;
        module.host_mut().preset = 3;
        module.tick(Instant::from_millis(11_000));
        assert!(!module.is_enabled());

        module.host_mut().playlist = 2;
        module.tick(Instant::from_millis(12_000));
        assert!(module.is_enabled());
    }

    #[test]
    fn test_selecting_music_playlist_enables_a_disabled_module() {
        let audio = ScriptedAudio { frame: Some(MUSIC) };
        let mut module = AutoPlaylist::<_, _, 8>::new(audio, fake_host(2, &[]));
        module.setup(Instant::from_millis(0));
        assert!(!module.is_enabled());

        // The host's current playlist is the default music playlist.
        module.tick(Instant::from_millis(10_000));
        assert!(module.is_enabled());
    }

    #[test]
    fn test_config_round_trip() {
        let audio = ScriptedAudio { frame: Some(MUSIC) };
        let mut module = AutoPlaylist::<_, _, 8>::new(audio, fake_host(2, &[]));

        let mut record = Record::new();
        record.set("enabled", Value::Bool(true)).unwrap();
        record.set("timeout", Value::U16(45)).unwrap();
        record.set("ambientPlaylist", Value::U8(3)).unwrap();
        record.set("musicPlaylist", Value::U8(4)).unwrap();
        record.set("autoChange", Value::Bool(true)).unwrap();
        record.set("change_lockout", Value::U32(1_500)).unwrap();
        record.set("ideal_change_min", Value::U32(12_000)).unwrap();
        record.set("ideal_change_max", Value::U32(24_000)).unwrap();
        assert!(module.load_config(&record));

        let mut saved = Record::new();
        module.save_config(&mut saved);
        assert_eq!(saved, record);

        // Loading the saved record reproduces the same configuration.
        let other_audio = ScriptedAudio { frame: None };
        let mut other = AutoPlaylist::<_, _, 8>::new(other_audio, fake_host(2, &[]));
        assert!(other.load_config(&saved));
        assert_eq!(other.config(), module.config());
        assert!(other.is_enabled());
    }

    #[test]
    fn test_missing_config_keys_fall_back_to_defaults() {
        let audio = ScriptedAudio { frame: None };
        let mut module = AutoPlaylist::<_, _, 8>::new(audio, fake_host(2, &[]));
        assert!(!module.load_config(&Record::new()));

        let config = module.config();
        assert_eq!(config.ambient_playlist, 1);
        assert_eq!(config.music_playlist, 2);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(!config.auto_change);
        assert_eq!(config.timing.lockout, Duration::from_millis(1_000));
        assert_eq!(config.timing.ideal_min, Duration::from_millis(10_000));
        assert_eq!(config.timing.ideal_max, Duration::from_millis(20_000));
        assert!(!module.is_enabled());
    }

    #[test]
    fn test_state_reports_enabled_and_last_sound() {
        let mut module = configured(fake_host(2, &[]), false);
        module.tick(Instant::from_millis(10_000));

        let mut state = Record::new();
        module.read_state(&mut state);
        assert_eq!(state.get_as::<bool>("enabled"), Some(true));
        assert_eq!(state.get_as::<u32>("lastSoundTime"), Some(10_000));
    }

    #[test]
    fn test_write_state_toggles_enabled() {
        let mut module = configured(fake_host(2, &[]), false);

        let mut state = Record::new();
        state.set("enabled", Value::Bool(false)).unwrap();
        module.write_state(&state);
        assert!(!module.is_enabled());

        // An unrelated record leaves the flag alone.
        module.write_state(&Record::new());
        assert!(!module.is_enabled());

        state.set("enabled", Value::Bool(true)).unwrap();
        module.write_state(&state);
        assert!(module.is_enabled());
    }
}
