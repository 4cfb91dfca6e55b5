//! Seeded random source.
//!
//! Every draw made while building an attempt (template variants, candidate
//! picks, allocator remainders, question id salts) comes from one
//! [`SeededRng`], so an attempt is fully reproducible from its seed string.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::RngError;

/// Deterministic pseudo-random source parameterized by a seed string.
#[derive(Debug, Clone)]
pub struct SeededRng {
    seed: String,
    inner: ChaCha8Rng,
}

impl SeededRng {
    pub fn new(seed: impl Into<String>) -> Self {
        let seed = seed.into();
        let inner = ChaCha8Rng::seed_from_u64(fnv1a(&seed));
        Self { seed, inner }
    }

    /// The seed this source was created from.
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform integer in `[min, max]`. Callers must ensure `min <= max`.
    pub fn int_between(&mut self, min: i64, max: i64) -> i64 {
        debug_assert!(min <= max, "int_between called with {min} > {max}");
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f64;
        let offset = (self.next_f64() * span).floor() as i64;
        (min + offset).min(max)
    }

    /// Uniform float in `[min, max)`.
    pub fn float_between(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    /// Uniform index in `[0, len)`, or `None` when `len == 0`.
    pub fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let i = (self.next_f64() * len as f64).floor() as usize;
        Some(i.min(len - 1))
    }

    /// Uniform choice over a non-empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Result<&'a T, RngError> {
        let i = self.index(items.len()).ok_or(RngError::EmptyChoice)?;
        Ok(&items[i])
    }
}

/// Build a seed string from its inputs (mode, timestamp, salt, ...).
pub fn seed_from_inputs(parts: &[&str]) -> String {
    parts.join("|")
}

/// 64-bit FNV-1a. Stable across platforms and releases, unlike std's hasher.
fn fnv1a(input: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    input.bytes().fold(OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    })
}
