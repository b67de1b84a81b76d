//! Microphone blow detection.
//!
//! A [`CaptureBackend`] opens a [`FrequencySource`] (live microphone or a
//! replayed WAV file), an [`Analyser`] turns its samples into a byte
//! spectrum, and the [`GestureDetector`] fires once when the mean of that
//! spectrum rises above the threshold.

mod analyser;
mod capture;
mod detector;
mod microphone;
mod wav;

// Re-export public types
pub use analyser::{blackman_window, magnitude_to_byte, mean_magnitude, Analyser};
pub use capture::{CaptureBackend, FrequencySource, InputBackend, InputSource};
pub use detector::{GestureDetector, GestureState};
pub use microphone::{MicrophoneBackend, MicrophoneSource};
pub use wav::{WavBackend, WavSource};
