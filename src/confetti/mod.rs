//! Confetti particle simulation and rendering.
//!
//! A burst of particles is launched from below the bottom edge, arcs under
//! gravity and fades out once it falls past a line across the viewport.

mod engine;
mod particle;
mod render;

// Re-export public types
pub use engine::ConfettiEngine;
pub use particle::{Particle, Shape};
pub use render::{particle_transform, render, shape_path, PixmapSurface, Surface};
