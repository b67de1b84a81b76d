//! One-shot blow detection on top of a capture backend.

use tracing::{debug, info, warn};

use super::analyser::mean_magnitude;
use super::capture::{CaptureBackend, FrequencySource};
use crate::params::DetectorConfig;
use crate::scheduler::Flow;

/// Detector lifecycle.
///
/// `Idle → Listening → {Detected | Stopped}` and `Idle → Stopped`. A new
/// `start_listening` from `Detected` or `Stopped` opens a fresh session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    Listening,
    Detected,
    Stopped,
}

/// Everything held while listening; dropped as a unit on release
struct Session<S> {
    source: S,
    /// Reused by every read
    bins: Vec<u8>,
    on_detected: Option<Box<dyn FnOnce()>>,
}

/// Watches a frequency source for a loud enough burst and fires once.
///
/// The detector owns the session it opens. The source is closed on every
/// way out of `Listening`: detection, a read failure, `stop_listening`, and
/// drop.
pub struct GestureDetector<B: CaptureBackend> {
    backend: B,
    config: DetectorConfig,
    state: GestureState,
    session: Option<Session<B::Source>>,
    last_level: Option<f32>,
}

impl<B: CaptureBackend> GestureDetector<B> {
    pub fn new(backend: B, config: DetectorConfig) -> Self {
        Self {
            backend,
            config,
            state: GestureState::Idle,
            session: None,
            last_level: None,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == GestureState::Listening
    }

    /// Mean magnitude of the latest read, if any
    pub fn last_level(&self) -> Option<f32> {
        self.last_level
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Open a capture session and start listening.
    ///
    /// Failure to open is not an error for the caller: the detector logs it,
    /// moves to `Stopped` and the manual trigger remains the only way in.
    pub async fn start_listening(&mut self, on_detected: impl FnOnce() + 'static) {
        if self.state == GestureState::Listening {
            debug!("already listening, keeping the current session");
            return;
        }

        match self.backend.open(&self.config.analyser).await {
            Ok(source) => {
                let bins = vec![0u8; source.bin_count()];
                self.session = Some(Session {
                    source,
                    bins,
                    on_detected: Some(Box::new(on_detected)),
                });
                self.last_level = None;
                self.state = GestureState::Listening;
                info!(threshold = self.config.threshold, "listening for a blow");
            }
            Err(e) => {
                warn!(error = %e, "microphone unavailable, falling back to manual trigger");
                self.state = GestureState::Stopped;
            }
        }
    }

    /// Read one spectrum and check it against the threshold.
    ///
    /// Returns `Flow::Continue` while the detector wants to be sampled again.
    pub fn sample(&mut self) -> Flow {
        if self.state != GestureState::Listening {
            return Flow::Stop;
        }
        let Some(session) = self.session.as_mut() else {
            self.state = GestureState::Stopped;
            return Flow::Stop;
        };

        if let Err(e) = session.source.read_byte_frequency_data(&mut session.bins) {
            warn!(error = %e, "audio input lost, falling back to manual trigger");
            self.release();
            self.state = GestureState::Stopped;
            return Flow::Stop;
        }

        let level = mean_magnitude(&session.bins);
        self.last_level = Some(level);
        if level <= self.config.threshold {
            return Flow::Continue;
        }

        self.state = GestureState::Detected;
        let on_detected = self.release();
        info!(level, threshold = self.config.threshold, "blow detected");
        if let Some(callback) = on_detected {
            callback();
        }
        Flow::Stop
    }

    /// Stop listening and release the input. No-op once detected or stopped.
    pub fn stop_listening(&mut self) {
        match self.state {
            GestureState::Idle | GestureState::Listening => {
                self.release();
                self.state = GestureState::Stopped;
                debug!("stopped listening");
            }
            GestureState::Detected | GestureState::Stopped => {}
        }
    }

    /// Close the held session, handing back its callback if it never fired
    fn release(&mut self) -> Option<Box<dyn FnOnce()>> {
        let mut session = self.session.take()?;
        session.source.close();
        session.on_detected.take()
    }
}

impl<B: CaptureBackend> Drop for GestureDetector<B> {
    fn drop(&mut self) {
        self.release();
    }
}
