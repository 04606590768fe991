//! Fixed-size Bloom filter used as a fast-reject pre-filter for k-mer lookups.
//!
//! The filter is sized from the expected number of insertions `n` and the
//! target false-positive rate `p`:
//!
//! - bits `m = ceil(-n * ln(p) / ln(2)^2)`
//! - probes `k = round(m / n * ln(2))`, at least 1
//!
//! Probe positions use double hashing, `h1 + i * h2 (mod m)`, where both
//! digests come from a single `FxHasher` pass followed by two independent
//! 64-bit finalizers.

use std::hash::Hasher;

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, ScreenError};

const SEED_H1: u64 = 0x9e37_79b9_7f4a_7c15;
const SEED_H2: u64 = 0xbf58_476d_1ce4_e5b9;

/// splitmix64 finalizer
#[inline]
fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

#[inline]
fn digests(item: &[u8]) -> (u64, u64) {
    let mut hasher = FxHasher::default();
    hasher.write(item);
    let base = hasher.finish();
    // h2 must be odd so successive probes never collapse onto h1
    (mix64(base ^ SEED_H1), mix64(base ^ SEED_H2) | 1)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloomFilter {
    bits: Vec<u64>,
    num_bits: u64,
    num_hashes: u32,
    error_rate: f64,
    inserted: u64,
}

impl BloomFilter {
    /// Create an empty filter sized for `expected_insertions` items at
    /// `error_rate` false positives.
    ///
    /// # Errors
    ///
    /// Returns `ScreenError::Configuration` if `error_rate` is not in (0, 1).
    pub fn with_rate(expected_insertions: usize, error_rate: f64) -> Result<Self> {
        if !(error_rate > 0.0 && error_rate < 1.0) {
            return Err(ScreenError::Configuration(format!(
                "Bloom filter error rate must be in (0, 1), got {error_rate}"
            )));
        }

        let n = expected_insertions.max(1) as f64;
        let ln2 = std::f64::consts::LN_2;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let num_bits = ((-n * error_rate.ln()) / (ln2 * ln2)).ceil().max(1.0) as u64;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let num_hashes = ((num_bits as f64 / n) * ln2).round().max(1.0) as u32;

        let words = usize::try_from(num_bits.div_ceil(64)).map_err(|_| {
            ScreenError::Configuration(format!("Bloom filter too large: {num_bits} bits"))
        })?;

        Ok(Self {
            bits: vec![0; words],
            num_bits,
            num_hashes,
            error_rate,
            inserted: 0,
        })
    }

    #[inline]
    fn positions(&self, item: &[u8]) -> impl Iterator<Item = u64> {
        let (h1, h2) = digests(item);
        let m = self.num_bits;
        (0..u64::from(self.num_hashes)).map(move |i| h1.wrapping_add(i.wrapping_mul(h2)) % m)
    }

    /// Set the probe bits for `item`. Inserting the same item twice leaves
    /// the bit array unchanged.
    pub fn insert(&mut self, item: &[u8]) {
        let (h1, h2) = digests(item);
        for i in 0..u64::from(self.num_hashes) {
            let pos = h1.wrapping_add(i.wrapping_mul(h2)) % self.num_bits;
            #[allow(clippy::cast_possible_truncation)]
            let word = (pos >> 6) as usize;
            self.bits[word] |= 1u64 << (pos & 63);
        }
        self.inserted += 1;
    }

    /// `false` means `item` was definitely never inserted.
    #[must_use]
    pub fn may_contain(&self, item: &[u8]) -> bool {
        self.positions(item).all(|pos| {
            #[allow(clippy::cast_possible_truncation)]
            let word = (pos >> 6) as usize;
            self.bits[word] & (1u64 << (pos & 63)) != 0
        })
    }

    #[must_use]
    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    #[must_use]
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Configured target false-positive rate
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    /// Number of `insert` calls made
    #[must_use]
    pub fn len(&self) -> u64 {
        self.inserted
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inserted == 0
    }

    /// Expected false-positive rate for the current fill:
    /// `(1 - e^(-k * n / m))^k`
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn estimated_error_rate(&self) -> f64 {
        let k = f64::from(self.num_hashes);
        let fill = -k * self.inserted as f64 / self.num_bits as f64;
        (1.0 - fill.exp()).powf(k)
    }
}
