mod tests {
    use heapless::String;
    use lumora_addons::{Record, RecordFull, Value};

    #[test]
    fn test_set_and_get() {
        let mut record = Record::new();
        assert!(record.is_empty());

        record.set("enabled", Value::Bool(true)).unwrap();
        record.set("volume", Value::U8(15)).unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("enabled"), Some(&Value::Bool(true)));
        assert_eq!(record.get_as::<u8>("volume"), Some(15));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut record = Record::new();
        record.set("a", Value::U8(1)).unwrap();
        record.set("b", Value::U8(2)).unwrap();
        record.set("a", Value::U8(9)).unwrap();

        assert_eq!(record.len(), 2);
        assert_eq!(record.get_as::<u8>("a"), Some(9));
        let keys: heapless::Vec<&str, 4> = record.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn test_integer_coercion_with_range_checks() {
        let mut record = Record::new();
        record.set("n", Value::I32(200)).unwrap();
        assert_eq!(record.get_as::<u8>("n"), Some(200));
        assert_eq!(record.get_as::<u16>("n"), Some(200));

        record.set("big", Value::I32(300)).unwrap();
        assert_eq!(record.get_as::<u8>("big"), None);
        assert_eq!(record.get_as::<u16>("big"), Some(300));

        record.set("neg", Value::I32(-1)).unwrap();
        assert_eq!(record.get_as::<u8>("neg"), None);
        assert_eq!(record.get_as::<i8>("neg"), Some(-1));
    }

    #[test]
    fn test_float_accepts_integers() {
        let mut record = Record::new();
        record.set("f", Value::U16(250)).unwrap();
        assert_eq!(record.get_as::<f32>("f"), Some(250.0));
        record.set("g", Value::F32(0.5)).unwrap();
        assert_eq!(record.get_as::<f32>("g"), Some(0.5));
    }

    #[test]
    fn test_bool_requires_exact_type() {
        let mut record = Record::new();
        record.set("flag", Value::U8(1)).unwrap();
        assert_eq!(record.get_as::<bool>("flag"), None);
    }

    #[test]
    fn test_read_or_tracks_completeness() {
        let mut record = Record::new();
        record.set("present", Value::U8(5)).unwrap();

        let mut complete = true;
        let present: u8 = record.read_or("present", 0, &mut complete);
        assert_eq!(present, 5);
        assert!(complete);

        let missing: u8 = record.read_or("missing", 7, &mut complete);
        assert_eq!(missing, 7);
        assert!(!complete);
    }

    #[test]
    fn test_mistyped_value_falls_back() {
        let mut record = Record::new();
        record.set("flag", Value::Bool(true)).unwrap();

        let mut complete = true;
        let value: u8 = record.read_or("flag", 3, &mut complete);
        assert_eq!(value, 3);
        assert!(!complete);
    }

    #[test]
    fn test_full_record_rejects_new_keys() {
        let mut record = Record::new();
        for i in 0..16u32 {
            let key = format!("k{}", i);
            assert!(record.set(&key, Value::U8(0)).is_ok());
        }

        let err = record.set("overflow", Value::U8(7)).unwrap_err();
        assert_eq!(err, RecordFull(Value::U8(7)));

        // Replacing an existing key still works at capacity.
        assert!(record.set("k3", Value::U8(9)).is_ok());
        assert_eq!(record.get_as::<u8>("k3"), Some(9));
    }

    #[test]
    fn test_oversized_key_is_rejected() {
        let mut record = Record::new();
        let key = "k".repeat(25);
        assert!(record.set(&key, Value::Bool(true)).is_err());
        assert!(record.get(&key).is_none());
    }

    #[test]
    fn test_string_values_truncate_to_capacity() {
        let long = "0123456789012345678901234567890123456789";
        let value = Value::str(long);
        assert_eq!(value.as_str(), Some(&long[..32]));

        let mut record = Record::new();
        record.set("name", Value::str("Kitchen")).unwrap();
        let name: String<32> = record.get_as("name").unwrap();
        assert_eq!(name.as_str(), "Kitchen");
    }

    #[test]
    fn test_clear_empties_the_record() {
        let mut record = Record::new();
        record.set("a", Value::U8(1)).unwrap();
        record.clear();
        assert!(record.is_empty());
        assert_eq!(record.get("a"), None);
    }
}
