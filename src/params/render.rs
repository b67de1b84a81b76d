//! Rendering and recording configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::Rgb8;
use crate::error::{WishError, WishResult};

/// Rendering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Viewport width (pixels)
    pub viewport_width: u32,

    /// Viewport height (pixels)
    pub viewport_height: u32,

    /// Frame cadence (frames per second)
    pub fps: u32,

    /// Opaque background the surface is cleared to each frame
    pub background: Rgb8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 720,
            fps: 60,
            background: Rgb8(0xFF, 0xF0, 0xF5), // lavender blush
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> WishResult<()> {
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(WishError::config(format!(
                "viewport must be non-empty, got {}x{}",
                self.viewport_width, self.viewport_height
            )));
        }
        // vello_cpu pixmaps are addressed with u16
        if self.viewport_width > u32::from(u16::MAX) || self.viewport_height > u32::from(u16::MAX) {
            return Err(WishError::config("viewport exceeds 65535 pixels"));
        }
        if self.fps == 0 {
            return Err(WishError::config("fps must be > 0"));
        }
        Ok(())
    }
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Upper bound on the recording length (seconds)
    pub max_duration_secs: f32,

    /// Output directory for frames
    pub output_dir: PathBuf,
}

impl RecordingConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            max_duration_secs: 30.0,
            output_dir: output_dir.into(),
        }
    }

    /// Frame cap at the given rate
    pub fn total_frames(&self, fps: u32) -> u64 {
        (self.max_duration_secs * fps as f32).ceil() as u64
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> PathBuf {
        self.output_dir.join("frames")
    }

    /// Path of one numbered frame
    pub fn frame_path(&self, frame: u64) -> PathBuf {
        self.frames_dir().join(format!("frame_{:05}.png", frame))
    }

    /// Create the output directories
    pub fn prepare(&self) -> WishResult<&Path> {
        std::fs::create_dir_all(self.frames_dir())?;
        Ok(&self.output_dir)
    }
}
