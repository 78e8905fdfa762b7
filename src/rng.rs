//! Small deterministic PRNG for draw decisions.
//!
//! One additive step and one `SplitMix64` mixing round per draw. Plenty
//! for shuffling presets and tracks; not for anything cryptographic.

/// `SplitMix64` sequence generator.
#[derive(Debug, Clone)]
pub struct SmallRng {
    state: u64,
}

impl SmallRng {
    /// Create a generator from a seed. Any value works, including 0.
    pub const fn seeded(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next pseudo-random 32-bit value.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        #[allow(clippy::cast_possible_truncation)]
        {
            (z ^ (z >> 31)) as u32
        }
    }

    /// Uniform index in `0..len`, picked by multiply-shift.
    ///
    /// `len` must be non-zero.
    pub fn pick(&mut self, len: usize) -> usize {
        #[allow(clippy::cast_possible_truncation)]
        {
            ((u64::from(self.next_u32()) * len as u64) >> 32) as usize
        }
    }
}
