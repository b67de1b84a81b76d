//! Capture backends: where the detector's frequency data comes from.

use std::future::{self, Future};

use super::microphone::{MicrophoneBackend, MicrophoneSource};
use super::wav::{WavBackend, WavSource};
use crate::error::CaptureError;
use crate::params::AnalyserConfig;

/// An open analysis pipeline producing byte spectra.
pub trait FrequencySource {
    /// Bins produced per read
    fn bin_count(&self) -> usize;

    /// Fill `out` with the current spectrum. An error means the input is gone.
    fn read_byte_frequency_data(&mut self, out: &mut [u8]) -> Result<(), CaptureError>;

    /// Stop capturing and release the input. Must be idempotent.
    fn close(&mut self);
}

/// Opens analysis pipelines. Opening is the only step that may suspend
/// (e.g. while the host asks the user for microphone access).
pub trait CaptureBackend {
    type Source: FrequencySource;

    fn open(
        &mut self,
        config: &AnalyserConfig,
    ) -> impl Future<Output = Result<Self::Source, CaptureError>>;
}

/// Runtime choice of input
pub enum InputBackend {
    Microphone(MicrophoneBackend),
    Wav(WavBackend),
    /// Manual trigger only; every open is refused
    Disabled,
}

pub enum InputSource {
    Microphone(MicrophoneSource),
    Wav(WavSource),
}

impl InputBackend {
    fn open_now(&mut self, config: &AnalyserConfig) -> Result<InputSource, CaptureError> {
        match self {
            Self::Microphone(backend) => backend.open_now(config).map(InputSource::Microphone),
            Self::Wav(backend) => backend.open_now(config).map(InputSource::Wav),
            Self::Disabled => Err(CaptureError::unavailable("audio input disabled")),
        }
    }
}

impl CaptureBackend for InputBackend {
    type Source = InputSource;

    fn open(
        &mut self,
        config: &AnalyserConfig,
    ) -> impl Future<Output = Result<InputSource, CaptureError>> {
        future::ready(self.open_now(config))
    }
}

impl FrequencySource for InputSource {
    fn bin_count(&self) -> usize {
        match self {
            Self::Microphone(source) => source.bin_count(),
            Self::Wav(source) => source.bin_count(),
        }
    }

    fn read_byte_frequency_data(&mut self, out: &mut [u8]) -> Result<(), CaptureError> {
        match self {
            Self::Microphone(source) => source.read_byte_frequency_data(out),
            Self::Wav(source) => source.read_byte_frequency_data(out),
        }
    }

    fn close(&mut self) {
        match self {
            Self::Microphone(source) => source.close(),
            Self::Wav(source) => source.close(),
        }
    }
}
