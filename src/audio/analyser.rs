//! Byte-scaled frequency analysis of the most recent input samples.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::params::AnalyserConfig;

/// Turns a stream of mono samples into a smoothed 0–255 spectrum.
///
/// Each read windows the latest `fft_size` samples (Blackman), takes the
/// magnitude of the first `fft_size / 2` bins, blends it with the previous
/// read, and maps decibels in `[min_decibels, max_decibels]` onto bytes.
pub struct Analyser {
    config: AnalyserConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    /// Ring of the latest `fft_size` samples; `write_pos` is the oldest
    history: Vec<f32>,
    write_pos: usize,
    spectrum: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl Analyser {
    pub fn new(config: AnalyserConfig) -> Self {
        let size = config.fft_size;
        let fft = FftPlanner::new().plan_fft_forward(size);
        let window = (0..size).map(|i| blackman_window(i, size)).collect();

        Self {
            fft,
            window,
            history: vec![0.0; size],
            write_pos: 0,
            spectrum: vec![Complex::new(0.0, 0.0); size],
            smoothed: vec![0.0; config.bin_count()],
            config,
        }
    }

    pub fn config(&self) -> &AnalyserConfig {
        &self.config
    }

    pub fn bin_count(&self) -> usize {
        self.config.bin_count()
    }

    /// Append samples; only the newest `fft_size` are kept.
    pub fn push_samples(&mut self, samples: &[f32]) {
        let size = self.history.len();
        let skip = samples.len().saturating_sub(size);
        for &sample in &samples[skip..] {
            self.history[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % size;
        }
    }

    /// Forget buffered samples and smoothing state
    pub fn reset(&mut self) {
        self.history.fill(0.0);
        self.smoothed.fill(0.0);
        self.write_pos = 0;
    }

    /// Fill `out` with the current byte spectrum (up to `bin_count` entries).
    pub fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.update_spectrum();

        let min_db = self.config.min_decibels;
        let max_db = self.config.max_decibels;
        for (byte, &magnitude) in out.iter_mut().zip(&self.smoothed) {
            *byte = magnitude_to_byte(magnitude, min_db, max_db);
        }
    }

    fn update_spectrum(&mut self) {
        let size = self.history.len();

        // Apply window, oldest sample first
        for i in 0..size {
            let sample = self.history[(self.write_pos + i) % size];
            self.spectrum[i] = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.spectrum);

        let tau = self.config.smoothing_time_constant;
        let scale = 1.0 / size as f32;
        for (smoothed, bin) in self.smoothed.iter_mut().zip(&self.spectrum) {
            let magnitude = bin.norm() * scale;
            let blended = tau * *smoothed + (1.0 - tau) * magnitude;
            *smoothed = if blended.is_finite() { blended } else { 0.0 };
        }
    }
}

/// Blackman window (α = 0.16) over a window of `size` samples
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let x = index as f32 / size as f32;
    0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
}

/// Linear magnitude → byte on the `[min_db, max_db]` decibel scale
pub fn magnitude_to_byte(magnitude: f32, min_db: f32, max_db: f32) -> u8 {
    let db = 20.0 * magnitude.log10();
    if !db.is_finite() {
        return 0;
    }
    let scaled = 255.0 / (max_db - min_db) * (db - min_db);
    scaled.clamp(0.0, 255.0) as u8
}

/// Arithmetic mean of a byte spectrum (0 for an empty one)
pub fn mean_magnitude(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }
    bins.iter().map(|&b| u32::from(b)).sum::<u32>() as f32 / bins.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(bin: usize, size: usize, amplitude: f32) -> Vec<f32> {
        (0..size)
            .map(|i| amplitude * (2.0 * PI * bin as f32 * i as f32 / size as f32).sin())
            .collect()
    }

    #[test]
    fn test_blackman_window() {
        let size = 256;

        // Zero at the start, 1 at the centre
        assert!(blackman_window(0, size).abs() < 1e-6);
        assert!((blackman_window(size / 2, size) - 1.0).abs() < 1e-6);
        assert!(blackman_window(size / 4, size) < blackman_window(size / 2, size));
    }

    #[test]
    fn test_magnitude_to_byte() {
        assert_eq!(magnitude_to_byte(0.0, -100.0, -30.0), 0);
        // Louder than -30 dBFS saturates
        assert_eq!(magnitude_to_byte(1.0, -100.0, -30.0), 255);
        // -65 dBFS sits halfway
        assert_eq!(magnitude_to_byte(10f32.powf(-65.0 / 20.0), -100.0, -30.0), 127);
        // Below the floor
        assert_eq!(magnitude_to_byte(1e-6, -100.0, -30.0), 0);
    }

    #[test]
    fn test_mean_magnitude() {
        assert_eq!(mean_magnitude(&[]), 0.0);
        assert_eq!(mean_magnitude(&[40, 42]), 41.0);
        assert_eq!(mean_magnitude(&[255; 128]), 255.0);
    }

    #[test]
    fn test_silence_is_all_zero() {
        let mut analyser = Analyser::new(AnalyserConfig::default());
        analyser.push_samples(&[0.0; 256]);

        let mut bins = vec![7u8; analyser.bin_count()];
        analyser.byte_frequency_data(&mut bins);
        assert!(bins.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_tone_lights_up_its_bin() {
        let config = AnalyserConfig::default();
        let size = config.fft_size;
        let mut analyser = Analyser::new(config);
        let tone = sine(8, size, 0.5);

        let mut bins = vec![0u8; analyser.bin_count()];
        for _ in 0..30 {
            analyser.push_samples(&tone);
            analyser.byte_frequency_data(&mut bins);
        }

        assert_eq!(bins[8], 255);
        assert!(bins[60] < 10, "far bin leaked: {}", bins[60]);
        assert!(mean_magnitude(&bins) < 40.0);
    }

    #[test]
    fn test_smoothing_ramps_up() {
        let config = AnalyserConfig::default();
        let size = config.fft_size;
        let mut analyser = Analyser::new(config);
        let tone = sine(20, size, 0.01);

        let mut first = vec![0u8; analyser.bin_count()];
        analyser.push_samples(&tone);
        analyser.byte_frequency_data(&mut first);

        let mut later = vec![0u8; analyser.bin_count()];
        for _ in 0..20 {
            analyser.push_samples(&tone);
            analyser.byte_frequency_data(&mut later);
        }

        assert!(later[20] > first[20]);
    }

    #[test]
    fn test_push_keeps_latest_window() {
        let config = AnalyserConfig {
            smoothing_time_constant: 0.0,
            ..AnalyserConfig::default()
        };
        let mut analyser = Analyser::new(config);
        let mut bins = vec![0u8; analyser.bin_count()];

        analyser.push_samples(&sine(8, 256, 0.5));
        analyser.byte_frequency_data(&mut bins);
        assert_eq!(bins[8], 255);

        // A long run of silence fully replaces the tone.
        analyser.push_samples(&[0.0; 1000]);
        analyser.byte_frequency_data(&mut bins);
        assert!(bins.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_reset_clears_smoothing() {
        let mut analyser = Analyser::new(AnalyserConfig::default());
        let mut bins = vec![0u8; analyser.bin_count()];
        analyser.push_samples(&sine(8, 256, 0.5));
        analyser.byte_frequency_data(&mut bins);
        assert!(bins[8] > 0);

        analyser.reset();
        analyser.byte_frequency_data(&mut bins);
        assert!(bins.iter().all(|&b| b == 0));
    }
}
