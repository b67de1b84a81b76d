//! Parameter definitions with physical units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Units (pixels, ticks, milliseconds, dBFS)
//! - Documented ranges and meanings
//! - A `validate()` per group
//!
//! Every group deserializes with `#[serde(default)]`, so a JSON config file
//! only needs the fields it overrides.

mod audio;
mod confetti;
mod render;
mod stage;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{WishError, WishResult};

// Re-export all types
pub use audio::{AnalyserConfig, DetectorConfig};
pub use confetti::{ConfettiParams, Rgb8, DEFAULT_PALETTE};
pub use render::{RecordingConfig, RenderConfig};
pub use stage::StageTimeline;

/// Complete configuration of the cake scene
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub confetti: ConfettiParams,
    pub detector: DetectorConfig,
    pub render: RenderConfig,
    pub stage: StageTimeline,
}

impl Params {
    /// Load and validate parameters from a JSON file
    pub fn load(path: impl AsRef<Path>) -> WishResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            WishError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let params = Self::from_json(&text)?;
        tracing::debug!(path = %path.display(), "loaded parameters");
        Ok(params)
    }

    /// Parse and validate parameters from JSON text
    pub fn from_json(text: &str) -> WishResult<Self> {
        let params: Self = serde_json::from_str(text)
            .map_err(|e| WishError::config(format!("invalid parameter file: {}", e)))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> WishResult<()> {
        self.confetti.validate()?;
        self.detector.validate()?;
        self.render.validate()?;
        self.stage.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let params = Params::from_json(
            r#"{
                "confetti": { "decay_start_fraction": 0.5 },
                "detector": { "threshold": 55 }
            }"#,
        )
        .unwrap();

        assert_eq!(params.confetti.decay_start_fraction, 0.5);
        assert_eq!(params.confetti.count, 100);
        assert_eq!(params.detector.threshold, 55.0);
        assert_eq!(params.detector.analyser.fft_size, 256);
        assert_eq!(params.stage, StageTimeline::default());
    }

    #[test]
    fn test_palette_from_json() {
        let params =
            Params::from_json(r#"{ "confetti": { "palette": [[255, 0, 0], [0, 0, 255]] } }"#)
                .unwrap();
        assert_eq!(params.confetti.palette, vec![Rgb8(255, 0, 0), Rgb8(0, 0, 255)]);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = Params::from_json(r#"{ "detector": { "analyser": { "fft_size": 100 } } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("config error:"));

        assert!(Params::from_json("not json").is_err());

        let err = Params::from_json(r#"{ "stage": { "title_ms": 18446744073709551615 } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("overflow"));
    }

    #[test]
    fn test_palette_accepts_hex_strings() {
        let params = Params::from_json(
            r##"{
                "confetti": { "palette": ["#FFB6C1", [0, 0, 255], "ff69b4"] },
                "render": { "background": "#FFF0F5" }
            }"##,
        )
        .unwrap();
        assert_eq!(
            params.confetti.palette,
            vec![Rgb8(0xFF, 0xB6, 0xC1), Rgb8(0, 0, 255), Rgb8(0xFF, 0x69, 0xB4)]
        );
        assert_eq!(params.render.background, Rgb8(0xFF, 0xF0, 0xF5));

        assert!(Params::from_json(r##"{ "confetti": { "palette": ["#GG0000"] } }"##).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{ "render": { "fps": 30 } }"#).unwrap();

        let params = Params::load(&path).unwrap();
        assert_eq!(params.render.fps, 30);

        assert!(Params::load(dir.path().join("missing.json")).is_err());
    }
}
