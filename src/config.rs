//! Flat key-value records for config and state exchange.
//!
//! The host persists each add-on's settings and surfaces its live state as a
//! flat object of short keys. [`Record`] models that object with bounded
//! capacity; [`Value`] covers the scalar types a settings page can produce.
//! The host owns serialization and namespacing (one record per add-on,
//! stored under [`crate::Addon::name`]).

use heapless::{String, Vec};

/// Maximum number of entries a record can hold.
pub const MAX_ENTRIES: usize = 16;

/// Maximum byte length of a record key.
pub const MAX_KEY: usize = 24;

/// Maximum byte length of a string value.
pub const MAX_STR: usize = 32;

/// Record key storage.
pub type Key = String<MAX_KEY>;

/// Error returned when a record has no room for another entry.
///
/// Carries the rejected value back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFull(pub Value);

/// A single typed record value.
///
/// Settings pages deliver numbers as `i32` or `f32` regardless of the width
/// a module stores, so the integer getters coerce between integer variants
/// with range checks.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    I32(i32),
    F32(f32),
    Str(String<MAX_STR>),
}

impl Value {
    /// Build a string value, truncating to the storage capacity.
    pub fn str(text: &str) -> Self {
        let mut s = String::new();
        for ch in text.chars() {
            if s.push(ch).is_err() {
                break;
            }
        }
        Self::Str(s)
    }

    /// Borrow the string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Widen any integer variant; `None` for bool, float and string.
    fn integer(&self) -> Option<i64> {
        match *self {
            Self::U8(v) => Some(i64::from(v)),
            Self::U16(v) => Some(i64::from(v)),
            Self::U32(v) => Some(i64::from(v)),
            Self::I32(v) => Some(i64::from(v)),
            Self::Bool(_) | Self::F32(_) | Self::Str(_) => None,
        }
    }
}

/// Conversion from a record [`Value`] into a concrete field type.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match *value {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! integer_from_value {
    ($($ty:ty),+) => {
        $(impl FromValue for $ty {
            fn from_value(value: &Value) -> Option<Self> {
                value.integer().and_then(|v| Self::try_from(v).ok())
            }
        })+
    };
}

integer_from_value!(i8, u8, u16, u32, i32);

impl FromValue for f32 {
    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: &Value) -> Option<Self> {
        match *value {
            Value::F32(v) => Some(v),
            _ => value.integer().map(|v| v as f32),
        }
    }
}

impl<const N: usize> FromValue for String<N> {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().and_then(|s| Self::try_from(s).ok())
    }
}

/// A flat, ordered key-value record with bounded capacity.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Record {
    entries: Vec<(Key, Value), MAX_ENTRIES>,
}

impl Record {
    /// Create an empty record.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the record holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Set a key, replacing any existing entry in place.
    ///
    /// Returns `Err(RecordFull(value))` if the record is full or the key
    /// does not fit.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), RecordFull> {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| k.as_str() == key) {
            slot.1 = value;
            return Ok(());
        }
        let Ok(key) = Key::try_from(key) else {
            return Err(RecordFull(value));
        };
        self.entries
            .push((key, value))
            .map_err(|(_, value)| RecordFull(value))
    }

    /// Look up a raw value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    /// Look up a key and convert it to `T`.
    pub fn get_as<T: FromValue>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(T::from_value)
    }

    /// Read a key, falling back to `default` when missing or mistyped.
    ///
    /// Clears `complete` on fallback so a module can report whether the
    /// record held every field it expects.
    pub fn read_or<T: FromValue>(&self, key: &str, default: T, complete: &mut bool) -> T {
        match self.get_as(key) {
            Some(value) => value,
            None => {
                *complete = false;
                default
            }
        }
    }

    /// Iterate entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
