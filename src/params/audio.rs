//! Frequency analysis and blow-detection configuration.

use serde::{Deserialize, Serialize};

use crate::error::{WishError, WishResult};

/// Frequency analyser configuration (byte spectrum on a decibel scale)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyserConfig {
    /// Transform window in samples (power of two, 32..=32768)
    pub fft_size: usize,

    /// Weight of the previous spectrum when smoothing (0 = none, <1)
    pub smoothing_time_constant: f32,

    /// Magnitude mapped to byte 0 (dBFS)
    pub min_decibels: f32,

    /// Magnitude mapped to byte 255 (dBFS)
    pub max_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 256,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyserConfig {
    /// Number of frequency bins produced per read (half the window)
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> WishResult<()> {
        if !self.fft_size.is_power_of_two() || !(32..=32768).contains(&self.fft_size) {
            return Err(WishError::config(format!(
                "FFT size must be a power of 2 within 32..=32768, got {}",
                self.fft_size
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing_time_constant) {
            return Err(WishError::config(format!(
                "smoothing_time_constant must be within [0, 1), got {}",
                self.smoothing_time_constant
            )));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(WishError::config(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }
}

/// Blow-gesture detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Mean byte magnitude (0–255) that must be exceeded to count as a blow
    pub threshold: f32,

    /// Analyser feeding the detector
    pub analyser: AnalyserConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: 40.0,
            analyser: AnalyserConfig::default(),
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> WishResult<()> {
        if !(0.0..=255.0).contains(&self.threshold) {
            return Err(WishError::config(format!(
                "blow threshold must be within [0, 255], got {}",
                self.threshold
            )));
        }
        self.analyser.validate()
    }
}
