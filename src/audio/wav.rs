//! Replay of a recorded WAV file in place of a live microphone.

use std::future::{self, Future};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::analyser::Analyser;
use super::capture::{CaptureBackend, FrequencySource};
use crate::error::CaptureError;
use crate::params::AnalyserConfig;

/// Opens a WAV file and feeds it to the analyser at frame pace
#[derive(Debug, Clone)]
pub struct WavBackend {
    path: PathBuf,
    /// Frame rate of the reader, sets how much audio one read consumes
    fps: u32,
}

impl WavBackend {
    pub fn new(path: impl Into<PathBuf>, fps: u32) -> Self {
        Self {
            path: path.into(),
            fps: fps.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn open_now(
        &mut self,
        config: &AnalyserConfig,
    ) -> Result<WavSource, CaptureError> {
        let (samples, sample_rate) = read_mono(&self.path)?;
        let samples_per_read = (sample_rate / self.fps).max(1) as usize;

        info!(
            path = %self.path.display(),
            sample_rate,
            samples = samples.len(),
            "replaying wav input"
        );

        Ok(WavSource::new(samples, samples_per_read, config))
    }
}

impl CaptureBackend for WavBackend {
    type Source = WavSource;

    fn open(
        &mut self,
        config: &AnalyserConfig,
    ) -> impl Future<Output = Result<WavSource, CaptureError>> {
        future::ready(self.open_now(config))
    }
}

/// Decode a WAV file to mono f32 samples. Returns the samples and the rate.
fn read_mono(path: &Path) -> Result<(Vec<f32>, u32), CaptureError> {
    let reader = hound::WavReader::open(path).map_err(|e| {
        CaptureError::unavailable(format!("cannot open {}: {}", path.display(), e))
    })?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels);
    if channels == 0 {
        return Err(CaptureError::unavailable("wav file has 0 channels"));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| CaptureError::unavailable(format!("corrupt wav data: {}", e)))?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .map_err(|e| CaptureError::unavailable(format!("corrupt wav data: {}", e)))?
        }
    };

    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    Ok((mono, spec.sample_rate))
}

/// Decoded file being consumed one frame's worth at a time
pub struct WavSource {
    samples: Vec<f32>,
    cursor: usize,
    samples_per_read: usize,
    analyser: Analyser,
    open: bool,
}

impl WavSource {
    /// Source over already decoded mono samples
    pub fn new(samples: Vec<f32>, samples_per_read: usize, config: &AnalyserConfig) -> Self {
        Self {
            samples,
            cursor: 0,
            samples_per_read: samples_per_read.max(1),
            analyser: Analyser::new(config.clone()),
            open: true,
        }
    }

    /// Samples not yet consumed
    pub fn remaining(&self) -> usize {
        self.samples.len() - self.cursor
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl FrequencySource for WavSource {
    fn bin_count(&self) -> usize {
        self.analyser.bin_count()
    }

    fn read_byte_frequency_data(&mut self, out: &mut [u8]) -> Result<(), CaptureError> {
        if !self.open || self.cursor >= self.samples.len() {
            return Err(CaptureError::StreamEnded);
        }

        let end = (self.cursor + self.samples_per_read).min(self.samples.len());
        self.analyser.push_samples(&self.samples[self.cursor..end]);
        self.cursor = end;

        self.analyser.byte_frequency_data(out);
        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            debug!(consumed = self.cursor, "wav input closed");
        }
    }
}
