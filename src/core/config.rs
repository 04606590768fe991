use serde::{Deserialize, Serialize};

use crate::core::error::{Result, ScreenError};
use crate::core::types::KmerSize;

/// Default Bloom filter false-positive rate
pub const DEFAULT_ERROR_RATE: f64 = 0.001;

/// Default multiplier applied to the observed distinct k-mer count when
/// sizing the Bloom filter
pub const DEFAULT_CAPACITY_FACTOR: f64 = 1.0;

/// Default minimum Jaccard similarity for a reported hit
pub const DEFAULT_JACCARD_THRESHOLD: f64 = 0.95;

/// Default minimum reference coverage for a reported hit
pub const DEFAULT_COVERAGE_THRESHOLD: f64 = 0.8;

/// Bloom filter parameters used when building a database
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloomConfig {
    /// Target false-positive rate
    pub error_rate: f64,
    /// Capacity as a multiple of the distinct k-mer count
    pub capacity_factor: f64,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            error_rate: DEFAULT_ERROR_RATE,
            capacity_factor: DEFAULT_CAPACITY_FACTOR,
        }
    }
}

impl BloomConfig {
    /// # Errors
    ///
    /// Returns `ScreenError::Configuration` unless `0 < error_rate < 1` and
    /// `capacity_factor >= 1`.
    pub fn validate(&self) -> Result<()> {
        if !(self.error_rate > 0.0 && self.error_rate < 1.0) {
            return Err(ScreenError::Configuration(format!(
                "Bloom filter error rate must be in (0, 1), got {}",
                self.error_rate
            )));
        }
        if !(self.capacity_factor >= 1.0 && self.capacity_factor.is_finite()) {
            return Err(ScreenError::Configuration(format!(
                "Bloom filter capacity factor must be >= 1, got {}",
                self.capacity_factor
            )));
        }
        Ok(())
    }
}

/// Score thresholds applied by the scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub jaccard: f64,
    pub coverage: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            jaccard: DEFAULT_JACCARD_THRESHOLD,
            coverage: DEFAULT_COVERAGE_THRESHOLD,
        }
    }
}

impl Thresholds {
    /// # Errors
    ///
    /// Returns `ScreenError::Configuration` if either threshold is outside [0, 1].
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("Jaccard", self.jaccard), ("coverage", self.coverage)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScreenError::Configuration(format!(
                    "{name} threshold must be in [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Full configuration of a screening run
#[derive(Debug, Clone, Default)]
pub struct ScreenConfig {
    pub kmer_size: KmerSize,
    pub bloom: BloomConfig,
    pub thresholds: Thresholds,
}

impl ScreenConfig {
    /// # Errors
    ///
    /// Returns `ScreenError::Configuration` for an invalid k-mer size,
    /// Bloom filter parameter or threshold.
    pub fn new(kmer_size: usize, bloom: BloomConfig, thresholds: Thresholds) -> Result<Self> {
        let config = Self {
            kmer_size: KmerSize::new(kmer_size)?,
            bloom,
            thresholds,
        };
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ScreenError::Configuration` if any parameter is out of range.
    pub fn validate(&self) -> Result<()> {
        self.bloom.validate()?;
        self.thresholds.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScreenConfig::default();
        assert_eq!(config.kmer_size.get(), 21);
        assert!((config.bloom.error_rate - 0.001).abs() < f64::EPSILON);
        assert!((config.thresholds.jaccard - 0.95).abs() < f64::EPSILON);
        assert!((config.thresholds.coverage - 0.8).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(ScreenConfig::new(0, BloomConfig::default(), Thresholds::default()).is_err());

        let bad_rate = BloomConfig {
            error_rate: 1.0,
            ..BloomConfig::default()
        };
        assert!(ScreenConfig::new(21, bad_rate, Thresholds::default()).is_err());

        let bad_factor = BloomConfig {
            capacity_factor: 0.5,
            ..BloomConfig::default()
        };
        assert!(bad_factor.validate().is_err());

        let bad_threshold = Thresholds {
            jaccard: 1.5,
            coverage: 0.8,
        };
        assert!(matches!(
            bad_threshold.validate(),
            Err(ScreenError::Configuration(_))
        ));
    }
}
