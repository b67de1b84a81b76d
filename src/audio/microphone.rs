//! Live microphone capture through cpal.

use std::future::{self, Future};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use tracing::{debug, info, warn};

use super::analyser::Analyser;
use super::capture::{CaptureBackend, FrequencySource};
use crate::error::CaptureError;
use crate::params::AnalyserConfig;

/// Samples kept between reads, in transform windows
const PENDING_WINDOWS: usize = 64;

/// Opens the default (or a named) input device
#[derive(Debug, Clone, Default)]
pub struct MicrophoneBackend {
    /// Exact cpal device name; `None` picks the host default
    pub device_name: Option<String>,
}

impl MicrophoneBackend {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }

    pub(crate) fn open_now(
        &mut self,
        config: &AnalyserConfig,
    ) -> Result<MicrophoneSource, CaptureError> {
        let host = cpal::default_host();
        let device = match &self.device_name {
            Some(name) => host
                .input_devices()
                .map_err(|e| {
                    CaptureError::unavailable(format!("cannot list input devices: {}", e))
                })?
                .find(|d| d.name().is_ok_and(|n| n == *name))
                .ok_or_else(|| {
                    CaptureError::unavailable(format!("no input device named '{}'", name))
                })?,
            None => host
                .default_input_device()
                .ok_or_else(|| CaptureError::unavailable("no audio input device found"))?,
        };

        let supported = device.default_input_config().map_err(|e| {
            CaptureError::unavailable(format!("no supported input config: {}", e))
        })?;

        let channels = usize::from(supported.channels());
        if channels == 0 {
            return Err(CaptureError::unavailable("input device reported 0 channels"));
        }

        let tap = InputTap {
            channels,
            capacity: config.fft_size * PENDING_WINDOWS,
            pending: Arc::new(Mutex::new(Vec::new())),
            ended: Arc::new(AtomicBool::new(false)),
        };
        let stream_config: cpal::StreamConfig = supported.config();

        let stream = match supported.sample_format() {
            SampleFormat::F32 => tap.build::<f32>(&device, &stream_config),
            SampleFormat::I16 => tap.build::<i16>(&device, &stream_config),
            SampleFormat::U16 => tap.build::<u16>(&device, &stream_config),
            SampleFormat::I32 => tap.build::<i32>(&device, &stream_config),
            other => Err(CaptureError::unavailable(format!(
                "unsupported sample format {:?}",
                other
            ))),
        }?;

        stream.play().map_err(|e| {
            CaptureError::unavailable(format!("failed to start input stream: {}", e))
        })?;

        info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate = stream_config.sample_rate.0,
            channels,
            "microphone capture started"
        );

        Ok(MicrophoneSource {
            stream: Some(stream),
            pending: tap.pending,
            ended: tap.ended,
            analyser: Analyser::new(config.clone()),
        })
    }
}

impl CaptureBackend for MicrophoneBackend {
    type Source = MicrophoneSource;

    fn open(
        &mut self,
        config: &AnalyserConfig,
    ) -> impl Future<Output = Result<MicrophoneSource, CaptureError>> {
        future::ready(self.open_now(config))
    }
}

/// Running input stream feeding an analyser.
///
/// The cpal callback mixes each frame down to mono and appends it to
/// `pending`; every read drains `pending` into the analyser.
pub struct MicrophoneSource {
    stream: Option<cpal::Stream>,
    pending: Arc<Mutex<Vec<f32>>>,
    ended: Arc<AtomicBool>,
    analyser: Analyser,
}

impl FrequencySource for MicrophoneSource {
    fn bin_count(&self) -> usize {
        self.analyser.bin_count()
    }

    fn read_byte_frequency_data(&mut self, out: &mut [u8]) -> Result<(), CaptureError> {
        if self.stream.is_none() || self.ended.load(Ordering::SeqCst) {
            return Err(CaptureError::StreamEnded);
        }

        {
            let mut pending = self.pending.lock().map_err(|_| CaptureError::StreamEnded)?;
            self.analyser.push_samples(&pending);
            pending.clear();
        }

        self.analyser.byte_frequency_data(out);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                debug!(error = %e, "pausing input stream failed");
            }
            drop(stream);
            info!("microphone released");
        }
    }
}

impl Drop for MicrophoneSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Shared state between the cpal callback and the reading side
#[derive(Clone)]
struct InputTap {
    channels: usize,
    /// Most samples buffered between reads
    capacity: usize,
    pending: Arc<Mutex<Vec<f32>>>,
    ended: Arc<AtomicBool>,
}

impl InputTap {
    fn build<T>(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
    ) -> Result<cpal::Stream, CaptureError>
    where
        T: SizedSample,
        f32: FromSample<T>,
    {
        let InputTap {
            channels,
            capacity,
            pending,
            ended,
        } = self.clone();

        device
            .build_input_stream(
                config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    let Ok(mut pending) = pending.lock() else {
                        return;
                    };
                    for frame in data.chunks(channels) {
                        let sum: f32 = frame.iter().map(|&s| f32::from_sample(s)).sum();
                        pending.push(sum / frame.len() as f32);
                    }
                    // Nobody is reading; keep only the newest samples
                    if pending.len() > capacity {
                        let excess = pending.len() - capacity;
                        pending.drain(..excess);
                    }
                },
                move |err| {
                    warn!(error = %err, "microphone stream error");
                    ended.store(true, Ordering::SeqCst);
                },
                None,
            )
            .map_err(|e| match e {
                cpal::BuildStreamError::DeviceNotAvailable => {
                    CaptureError::permission_denied("input device not available")
                }
                other => {
                    CaptureError::unavailable(format!("failed to build input stream: {}", other))
                }
            })
    }
}
