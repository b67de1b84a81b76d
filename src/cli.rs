//! Command-line argument parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::audio::{InputBackend, MicrophoneBackend, WavBackend};
use crate::error::{WishError, WishResult};
use crate::params::{Params, RecordingConfig};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "candlewish")]
#[command(about = "Blow out the birthday candles and watch the confetti", long_about = None)]
pub struct Args {
    /// JSON parameter file; missing fields keep their defaults
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Viewport width (pixels)
    #[arg(long, value_name = "PIXELS")]
    pub width: Option<u32>,

    /// Viewport height (pixels)
    #[arg(long, value_name = "PIXELS")]
    pub height: Option<u32>,

    /// Frames per second
    #[arg(long)]
    pub fps: Option<u32>,

    /// Seed for the confetti burst (random if omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Replay a WAV file instead of listening to the microphone
    #[arg(long, value_name = "FILE", conflicts_with = "no_mic")]
    pub wav: Option<PathBuf>,

    /// Input device name (default: host default input)
    #[arg(long, value_name = "NAME")]
    pub device: Option<String>,

    /// Do not open any audio input; only the manual trigger works
    #[arg(long)]
    pub no_mic: bool,

    /// Press the manual trigger this many seconds after the candles are
    /// ready (0 never presses it)
    #[arg(long, value_name = "SECONDS", default_value = "10")]
    pub manual_after: f32,

    /// Render every frame to DIR/frames/frame_NNNNN.png
    #[arg(long, value_name = "DIR")]
    pub record: Option<PathBuf>,

    /// Recording length cap (seconds)
    #[arg(long, value_name = "SECONDS", default_value = "30")]
    pub duration: f32,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parameters from `--config` (or defaults) with command-line overrides
    pub fn load_params(&self) -> WishResult<Params> {
        let mut params = match &self.config {
            Some(path) => Params::load(path)?,
            None => Params::default(),
        };

        if let Some(width) = self.width {
            params.render.viewport_width = width;
        }
        if let Some(height) = self.height {
            params.render.viewport_height = height;
        }
        if let Some(fps) = self.fps {
            params.render.fps = fps;
        }

        params.validate()?;
        Ok(params)
    }

    /// Audio input selected by `--wav`, `--no-mic` and `--device`
    pub fn input_backend(&self, fps: u32) -> InputBackend {
        if let Some(path) = &self.wav {
            info!(path = %path.display(), "input: wav replay");
            InputBackend::Wav(WavBackend::new(path, fps))
        } else if self.no_mic {
            info!("input: disabled, manual trigger only");
            InputBackend::Disabled
        } else {
            info!("input: microphone");
            InputBackend::Microphone(MicrophoneBackend::new(self.device.clone()))
        }
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Delay after the candles are ready before the automatic manual press.
    /// `None` when disabled with 0.
    pub fn manual_after(&self) -> WishResult<Option<Duration>> {
        if self.manual_after == 0.0 {
            return Ok(None);
        }
        if !self.manual_after.is_finite() || self.manual_after < 0.0 {
            return Err(WishError::config(format!(
                "--manual-after must be a finite number of seconds >= 0, got {}",
                self.manual_after
            )));
        }
        Duration::try_from_secs_f32(self.manual_after)
            .map(Some)
            .map_err(|e| WishError::config(format!("--manual-after out of range: {}", e)))
    }

    /// Scene time of the automatic manual press, given when the candles
    /// become ready. `None` when disabled or when the sum overflows.
    pub fn manual_press_at(&self, candles_ready_at: Duration) -> WishResult<Option<Duration>> {
        let Some(delay) = self.manual_after()? else {
            return Ok(None);
        };
        let at = candles_ready_at.checked_add(delay);
        if at.is_none() {
            warn!("manual press delay overflows the scene clock, never pressing it");
        }
        Ok(at)
    }

    /// Create recording configuration if recording mode is enabled
    pub fn create_recording_config(&self) -> WishResult<Option<RecordingConfig>> {
        let Some(dir) = &self.record else {
            return Ok(None);
        };

        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(WishError::config(format!(
                "--duration must be a positive number of seconds, got {}",
                self.duration
            )));
        }

        let mut config = RecordingConfig::new(dir);
        config.max_duration_secs = self.duration;
        config.prepare()?;
        Ok(Some(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("candlewish").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        let params = args.load_params().unwrap();
        assert_eq!(params, Params::default());
        assert_eq!(args.manual_after().unwrap(), Some(Duration::from_secs(10)));
        assert!(matches!(args.input_backend(60), InputBackend::Microphone(_)));
        assert!(args.create_recording_config().unwrap().is_none());
    }

    #[test]
    fn test_overrides() {
        let args = parse(&[
            "--width", "1920", "--height", "1080", "--fps", "30", "--no-mic", "--manual-after", "0",
        ]);
        let params = args.load_params().unwrap();
        assert_eq!(params.render.viewport_width, 1920);
        assert_eq!(params.render.viewport_height, 1080);
        assert_eq!(params.render.fps, 30);
        assert_eq!(args.manual_after().unwrap(), None);
        assert!(matches!(args.input_backend(30), InputBackend::Disabled));
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let args = parse(&["--fps", "0"]);
        assert!(args.load_params().is_err());
    }

    #[test]
    fn test_wav_conflicts_with_no_mic() {
        let result = Args::try_parse_from(["candlewish", "--wav", "a.wav", "--no-mic"]);
        assert!(result.is_err());

        let args = parse(&["--wav", "a.wav"]);
        assert!(matches!(args.input_backend(60), InputBackend::Wav(_)));
    }

    #[test]
    fn test_seeded_rng_is_repeatable() {
        use rand::Rng;

        let args = parse(&["--seed", "42"]);
        let a: u64 = args.rng().random();
        let b: u64 = args.rng().random();
        assert_eq!(a, b);
    }

    #[test]
    fn test_recording_config_creates_frames_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("take1");
        let args = parse(&["--record", out.to_str().unwrap(), "--duration", "2"]);

        let config = args.create_recording_config().unwrap().unwrap();
        assert!(config.frames_dir().is_dir());
        assert_eq!(config.total_frames(60), 120);
    }

    #[test]
    fn test_out_of_range_manual_after_is_rejected() {
        for value in ["inf", "NaN", "1e30", "-1"] {
            let arg = format!("--manual-after={}", value);
            let args = parse(&[&arg]);
            assert!(args.manual_after().is_err(), "accepted {}", value);
        }
    }

    #[test]
    fn test_manual_press_at_does_not_overflow() {
        let args = parse(&[]);
        let ready = Duration::from_millis(6600);
        assert_eq!(args.manual_press_at(ready).unwrap(), Some(Duration::from_millis(16_600)));
        assert_eq!(args.manual_press_at(Duration::MAX).unwrap(), None);

        let args = parse(&["--manual-after", "0"]);
        assert_eq!(args.manual_press_at(ready).unwrap(), None);
        let args = parse(&["--manual-after", "inf"]);
        assert!(args.manual_press_at(ready).is_err());
    }

    #[test]
    fn test_bad_duration_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("take2");
        for value in ["0", "inf", "NaN", "-3"] {
            let duration = format!("--duration={}", value);
            let args = parse(&["--record", out.to_str().unwrap(), &duration]);
            assert!(args.create_recording_config().is_err(), "accepted {}", value);
        }
        assert!(!out.exists());
    }
}
