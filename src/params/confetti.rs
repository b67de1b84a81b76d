//! Confetti burst and physics parameters.
//!
//! Units are screen pixels and display frames ("ticks"): velocities are in
//! pixels per tick, gravity in pixels per tick².

use serde::{Deserialize, Serialize};

use crate::error::{WishError, WishResult};

/// 8-bit RGB color.
///
/// Deserializes from `[r, g, b]` or a `"#RRGGBB"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ColorSpec")]
pub struct Rgb8(pub u8, pub u8, pub u8);

/// Accepted spellings of a color in parameter files
#[derive(Deserialize)]
#[serde(untagged)]
enum ColorSpec {
    Hex(String),
    Channels(u8, u8, u8),
}

impl TryFrom<ColorSpec> for Rgb8 {
    type Error = String;

    fn try_from(spec: ColorSpec) -> Result<Self, Self::Error> {
        match spec {
            ColorSpec::Hex(hex) => {
                Rgb8::from_hex(&hex).ok_or_else(|| format!("invalid hex color '{}'", hex))
            }
            ColorSpec::Channels(r, g, b) => Ok(Rgb8(r, g, b)),
        }
    }
}

impl Rgb8 {
    /// Parse `#RRGGBB` (the leading `#` is optional)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// Pastel confetti palette: light pink, lavender, powder blue, gold,
/// peach, mint, hot pink.
pub const DEFAULT_PALETTE: [Rgb8; 7] = [
    Rgb8(0xFF, 0xB6, 0xC1),
    Rgb8(0xE6, 0xE6, 0xFA),
    Rgb8(0xB0, 0xE0, 0xE6),
    Rgb8(0xFF, 0xD7, 0x00),
    Rgb8(0xFF, 0xDA, 0xB9),
    Rgb8(0xE0, 0xF8, 0xE0),
    Rgb8(0xFF, 0x69, 0xB4),
];

/// Confetti burst parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfettiParams {
    /// Particles seeded per burst
    pub count: usize,

    /// How far below the bottom edge particles spawn (pixels)
    pub spawn_offset_px: f32,

    /// Horizontal launch speed bound (px/tick), vx ∈ [-bound, bound)
    pub horizontal_speed: f32,

    /// Upward launch speed range (px/tick), vy ∈ (-max, -min]
    pub launch_speed_range: (f32, f32),

    /// Downward acceleration (px/tick²)
    pub gravity: f32,

    /// Spin bound (degrees/tick), spin ∈ [-bound, bound)
    pub max_rotation_speed_deg: f32,

    /// Particle size range (pixels), size ∈ [min, max)
    pub size_range_px: (f32, f32),

    /// Fraction of the viewport height (from the top) below which particles fade
    pub decay_start_fraction: f32,

    /// Opacity lost per tick while below the decay line
    pub fade_step: f32,

    /// Colors drawn uniformly per particle
    pub palette: Vec<Rgb8>,
}

impl Default for ConfettiParams {
    fn default() -> Self {
        Self {
            count: 100,
            spawn_offset_px: 10.0,
            horizontal_speed: 4.0,
            launch_speed_range: (12.0, 27.0),
            gravity: 0.3,
            max_rotation_speed_deg: 7.5,
            size_range_px: (6.0, 16.0),
            decay_start_fraction: 0.6,
            fade_step: 0.02,
            palette: DEFAULT_PALETTE.to_vec(),
        }
    }
}

impl ConfettiParams {
    /// Validate ranges (non-empty palette, positive fade, ordered ranges)
    pub fn validate(&self) -> WishResult<()> {
        if self.palette.is_empty() {
            return Err(WishError::config("confetti palette must not be empty"));
        }
        if !(self.fade_step > 0.0) {
            return Err(WishError::config(format!(
                "fade_step must be > 0, got {}",
                self.fade_step
            )));
        }
        if !(0.0..=1.0).contains(&self.decay_start_fraction) {
            return Err(WishError::config(format!(
                "decay_start_fraction must be within [0, 1], got {}",
                self.decay_start_fraction
            )));
        }
        let (min_size, max_size) = self.size_range_px;
        if !(min_size > 0.0 && min_size <= max_size) {
            return Err(WishError::config(format!(
                "size_range_px must satisfy 0 < min <= max, got {:?}",
                self.size_range_px
            )));
        }
        let (min_launch, max_launch) = self.launch_speed_range;
        if !(min_launch >= 0.0 && min_launch <= max_launch) {
            return Err(WishError::config(format!(
                "launch_speed_range must satisfy 0 <= min <= max, got {:?}",
                self.launch_speed_range
            )));
        }
        if self.horizontal_speed < 0.0 || self.max_rotation_speed_deg < 0.0 {
            return Err(WishError::config("speed bounds must be non-negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        let params = ConfettiParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.count, 100);
        assert_eq!(params.palette.len(), 7);
    }

    #[test]
    fn test_rgb8_from_hex() {
        assert_eq!(Rgb8::from_hex("#FFB6C1"), Some(Rgb8(0xFF, 0xB6, 0xC1)));
        assert_eq!(Rgb8::from_hex("ff69b4"), Some(Rgb8(0xFF, 0x69, 0xB4)));
        assert_eq!(Rgb8::from_hex("#FFF"), None);
        assert_eq!(Rgb8::from_hex("#GG0000"), None);
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let mut params = ConfettiParams::default();
        params.palette.clear();
        assert!(params.validate().is_err());

        let mut params = ConfettiParams::default();
        params.fade_step = 0.0;
        assert!(params.validate().is_err());

        let mut params = ConfettiParams::default();
        params.size_range_px = (10.0, 5.0);
        assert!(params.validate().is_err());

        let mut params = ConfettiParams::default();
        params.decay_start_fraction = 1.5;
        assert!(params.validate().is_err());
    }
}
