//! Confetti particle state and per-tick integration.

use glam::Vec2;
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::params::{ConfettiParams, Rgb8, DEFAULT_PALETTE};

/// Confetti silhouette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Circle,
    Square,
    Triangle,
    Heart,
}

impl Shape {
    pub const ALL: [Shape; 4] = [Shape::Circle, Shape::Square, Shape::Triangle, Shape::Heart];
}

/// A single confetti piece with physics and rendering state
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Screen position (pixels, y grows downward)
    pub position: Vec2,
    /// Pixels per tick
    pub velocity: Vec2,
    /// Added to `velocity.y` every tick
    pub gravity: f32,
    pub rotation_deg: f32,
    pub rotation_speed_deg: f32,
    /// 1 at spawn, only ever decreases
    pub opacity: f32,
    pub size: f32,
    pub color: Rgb8,
    pub shape: Shape,
}

impl Particle {
    /// Fully opaque, unrotated particle
    pub fn new(
        position: Vec2,
        velocity: Vec2,
        gravity: f32,
        size: f32,
        color: Rgb8,
        shape: Shape,
    ) -> Self {
        Self {
            position,
            velocity,
            gravity,
            rotation_deg: 0.0,
            rotation_speed_deg: 0.0,
            opacity: 1.0,
            size,
            color,
            shape,
        }
    }

    /// Random particle launched upward from just below the bottom edge
    pub fn spawn<R: Rng + ?Sized>(
        rng: &mut R,
        params: &ConfettiParams,
        viewport_width: f32,
        viewport_height: f32,
    ) -> Self {
        let (min_launch, max_launch) = params.launch_speed_range;
        let (min_size, max_size) = params.size_range_px;
        let spin = params.max_rotation_speed_deg;

        let position = Vec2::new(
            uniform(rng, 0.0, viewport_width.max(0.0)),
            viewport_height + params.spawn_offset_px,
        );
        let velocity = Vec2::new(
            uniform(rng, -params.horizontal_speed, params.horizontal_speed),
            -uniform(rng, min_launch, max_launch),
        );
        let color = *params
            .palette
            .choose(rng)
            .unwrap_or(&DEFAULT_PALETTE[0]);
        let shape = *Shape::ALL.choose(rng).unwrap_or(&Shape::Circle);

        Self {
            position,
            velocity,
            gravity: params.gravity,
            rotation_deg: uniform(rng, 0.0, 360.0),
            rotation_speed_deg: uniform(rng, -spin, spin),
            opacity: 1.0,
            size: uniform(rng, min_size, max_size),
            color,
            shape,
        }
    }

    /// Advance one tick. Fades only while below `decay_line_y`.
    pub fn step(&mut self, decay_line_y: f32, fade_step: f32) {
        self.velocity.y += self.gravity;
        self.position += self.velocity;
        self.rotation_deg += self.rotation_speed_deg;

        if self.position.y > decay_line_y {
            self.opacity -= fade_step;
        }
    }

    pub fn is_alive(&self) -> bool {
        self.opacity > 0.0
    }

    pub fn rotation_rad(&self) -> f32 {
        self.rotation_deg.to_radians()
    }
}

/// Uniform sample in `[lo, hi)`; degenerates to `lo` for empty ranges.
fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    lo + rng.random::<f32>() * (hi - lo)
}
