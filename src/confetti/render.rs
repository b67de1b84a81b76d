//! Confetti drawing: per-shape geometry and a CPU pixmap surface.

use std::path::Path;

use vello_cpu::kurbo::{Affine, BezPath, Circle, Rect, Shape as _};
use vello_cpu::peniko::Color;

use super::particle::{Particle, Shape};
use crate::error::{WishError, WishResult};
use crate::params::Rgb8;

/// Flattening tolerance for curved outlines (pixels)
const PATH_TOLERANCE: f64 = 0.1;

/// Something confetti can be drawn onto.
///
/// The surface is shared with the rest of the view; the engine only ever
/// fills paths on it.
pub trait Surface {
    /// Reset the surface for a new frame
    fn clear(&mut self);

    /// Fill `path` (local coordinates) placed by `transform`
    fn fill_path(&mut self, path: &BezPath, transform: Affine, color: Rgb8, opacity: f32);
}

/// Outline of a shape centred on the origin, before rotation and placement.
pub fn shape_path(shape: Shape, size: f64) -> BezPath {
    let half = size / 2.0;
    match shape {
        Shape::Circle => Circle::new((0.0, 0.0), half).to_path(PATH_TOLERANCE),
        Shape::Square => Rect::new(-half, -half, half, half).to_path(PATH_TOLERANCE),
        Shape::Triangle => {
            let mut path = BezPath::new();
            path.move_to((0.0, -half));
            path.line_to((-half, half));
            path.line_to((half, half));
            path.close_path();
            path
        }
        Shape::Heart => {
            // Two mirrored cubic lobes meeting at the bottom tip.
            let s = size / 4.0;
            let mut path = BezPath::new();
            path.move_to((0.0, s));
            path.curve_to((-s * 2.0, -s), (-s * 2.0, -s * 2.5), (0.0, -s * 1.5));
            path.curve_to((s * 2.0, -s * 2.5), (s * 2.0, -s), (0.0, s));
            path.close_path();
            path
        }
    }
}

/// Rotation about the particle centre followed by translation to its position.
pub fn particle_transform(particle: &Particle) -> Affine {
    Affine::translate((f64::from(particle.position.x), f64::from(particle.position.y)))
        * Affine::rotate(f64::from(particle.rotation_rad()))
}

/// Draw every visible particle. Without a surface this is a no-op.
pub fn render<S: Surface + ?Sized>(surface: Option<&mut S>, particles: &[Particle]) {
    let Some(surface) = surface else {
        return;
    };

    for particle in particles.iter().filter(|p| p.is_alive()) {
        let path = shape_path(particle.shape, f64::from(particle.size));
        surface.fill_path(
            &path,
            particle_transform(particle),
            particle.color,
            particle.opacity.min(1.0),
        );
    }
}

/// CPU raster surface backed by `vello_cpu`
pub struct PixmapSurface {
    width: u16,
    height: u16,
    background: Rgb8,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
}

impl PixmapSurface {
    pub fn new(width: u32, height: u32, background: Rgb8) -> WishResult<Self> {
        let width: u16 = width
            .try_into()
            .map_err(|_| WishError::render("surface width exceeds u16"))?;
        let height: u16 = height
            .try_into()
            .map_err(|_| WishError::render("surface height exceeds u16"))?;
        if width == 0 || height == 0 {
            return Err(WishError::render("surface must be non-empty"));
        }

        let mut surface = Self {
            width,
            height,
            background,
            ctx: vello_cpu::RenderContext::new(width, height),
            pixmap: vello_cpu::Pixmap::new(width, height),
        };
        surface.clear();
        surface.present();
        Ok(surface)
    }

    pub fn width(&self) -> u32 {
        u32::from(self.width)
    }

    pub fn height(&self) -> u32 {
        u32::from(self.height)
    }

    /// Rasterize everything filled since the last `clear` into the pixmap.
    pub fn present(&mut self) {
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
    }

    /// Straight-alpha RGBA8 copy of the pixmap
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut rgba = self.pixmap.data_as_u8_slice().to_vec();
        for px in rgba.chunks_exact_mut(4) {
            unpremultiply(px);
        }
        rgba
    }

    /// Straight-alpha RGBA of one pixel
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let offset = ((y * self.width() + x) * 4) as usize;
        let data = self.pixmap.data_as_u8_slice();
        let mut px = [0u8; 4];
        px.copy_from_slice(&data[offset..offset + 4]);
        unpremultiply(&mut px);
        Some(px)
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> WishResult<()> {
        let path = path.as_ref();
        image::save_buffer(
            path,
            &self.to_rgba8(),
            self.width(),
            self.height(),
            image::ColorType::Rgba8,
        )
        .map_err(|e| WishError::recording(format!("failed to save {}: {}", path.display(), e)))
    }
}

impl Surface for PixmapSurface {
    fn clear(&mut self) {
        self.ctx = vello_cpu::RenderContext::new(self.width, self.height);
        let Rgb8(r, g, b) = self.background;
        self.ctx.set_transform(Affine::IDENTITY);
        self.ctx.set_paint(Color::from_rgba8(r, g, b, 255));
        self.ctx.fill_rect(&Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));
    }

    fn fill_path(&mut self, path: &BezPath, transform: Affine, color: Rgb8, opacity: f32) {
        let Rgb8(r, g, b) = color;
        self.ctx.set_transform(transform);
        self.ctx.set_paint(Color::from_rgba8(r, g, b, 255));
        if opacity < 1.0 {
            self.ctx.push_opacity_layer(opacity);
        }
        self.ctx.fill_path(path);
        if opacity < 1.0 {
            self.ctx.pop_layer();
        }
    }
}

fn unpremultiply(px: &mut [u8]) {
    let a = u16::from(px[3]);
    if a == 0 || a == 255 {
        return;
    }
    for c in &mut px[..3] {
        *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
    }
}
