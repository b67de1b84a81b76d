//! Confetti burst simulation.

use glam::Vec2;
use rand::Rng;
use tracing::debug;

use super::particle::Particle;
use crate::params::ConfettiParams;

/// Owns one confetti burst and advances it frame by frame.
///
/// The live set only shrinks between `start` calls: particles are removed
/// the tick their opacity reaches zero and nothing is ever added mid-burst.
/// The animation is self-ending; once [`ConfettiEngine::is_finished`]
/// reports true the caller should stop scheduling ticks.
#[derive(Debug, Clone)]
pub struct ConfettiEngine {
    params: ConfettiParams,
    particles: Vec<Particle>,
    viewport: Vec2,
}

impl ConfettiEngine {
    pub fn new(params: ConfettiParams) -> Self {
        Self {
            params,
            particles: Vec::new(),
            viewport: Vec2::ZERO,
        }
    }

    pub fn params(&self) -> &ConfettiParams {
        &self.params
    }

    /// Seed a fresh burst of `params.count` particles along the bottom edge,
    /// replacing any burst still in flight.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        viewport_width: f32,
        viewport_height: f32,
        rng: &mut R,
    ) {
        let particles = (0..self.params.count)
            .map(|_| Particle::spawn(rng, &self.params, viewport_width, viewport_height))
            .collect();
        self.start_with(viewport_width, viewport_height, particles);
    }

    /// Seed an explicit burst, replacing any burst still in flight.
    pub fn start_with(
        &mut self,
        viewport_width: f32,
        viewport_height: f32,
        particles: Vec<Particle>,
    ) {
        self.viewport = Vec2::new(viewport_width, viewport_height);
        self.particles = particles;
        self.particles.retain(Particle::is_alive);
        debug!(
            count = self.particles.len(),
            width = viewport_width,
            height = viewport_height,
            "confetti burst started"
        );
    }

    /// Screen y below which particles fade
    pub fn decay_line_y(&self) -> f32 {
        self.viewport.y * self.params.decay_start_fraction
    }

    /// Advance every live particle one frame and drop the fully faded ones.
    pub fn tick(&mut self) -> &[Particle] {
        if self.particles.is_empty() {
            return &self.particles;
        }

        let decay_line_y = self.decay_line_y();
        let fade_step = self.params.fade_step;
        for particle in &mut self.particles {
            particle.step(decay_line_y, fade_step);
        }
        self.particles.retain(Particle::is_alive);

        if self.particles.is_empty() {
            debug!("confetti burst finished");
        }
        &self.particles
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn live_count(&self) -> usize {
        self.particles.len()
    }

    pub fn is_finished(&self) -> bool {
        self.particles.is_empty()
    }

    /// Drop the burst immediately. Idempotent.
    pub fn stop(&mut self) {
        if !self.particles.is_empty() {
            debug!(dropped = self.particles.len(), "confetti stopped");
        }
        self.particles.clear();
    }
}

impl Default for ConfettiEngine {
    fn default() -> Self {
        Self::new(ConfettiParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confetti::Shape;
    use crate::params::DEFAULT_PALETTE;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded_engine(width: f32, height: f32, seed: u64) -> ConfettiEngine {
        let mut engine = ConfettiEngine::default();
        engine.start(width, height, &mut StdRng::seed_from_u64(seed));
        engine
    }

    #[test]
    fn test_start_seeds_full_burst() {
        let engine = seeded_engine(1920.0, 1080.0, 3);
        assert_eq!(engine.live_count(), 100);
        assert!(engine.particles().iter().all(|p| p.opacity == 1.0));
        assert_eq!(engine.decay_line_y(), 648.0);
    }

    #[test]
    fn test_start_replaces_previous_burst() {
        let mut engine = seeded_engine(800.0, 600.0, 3);
        engine.tick();
        engine.start(800.0, 600.0, &mut StdRng::seed_from_u64(4));
        assert_eq!(engine.live_count(), 100);
    }

    #[test]
    fn test_opacity_and_gravity_are_monotonic() {
        let mut engine = seeded_engine(1280.0, 720.0, 11);
        let mut previous = engine.particles().to_vec();

        while !engine.is_finished() {
            let live = engine.tick().to_vec();
            assert!(live.len() <= previous.len());

            // Particles keep their relative order, so match by walking both lists.
            let mut prev_iter = previous.iter();
            for p in &live {
                let before = prev_iter
                    .find(|q| q.size == p.size && q.color == p.color && q.shape == p.shape)
                    .unwrap();
                assert!(p.opacity <= before.opacity);
                assert!(p.velocity.y >= before.velocity.y);
                assert!(p.opacity > 0.0);
            }
            previous = live;
        }
    }

    #[test]
    fn test_faded_particles_never_reappear() {
        let mut engine = seeded_engine(1280.0, 720.0, 5);
        let mut last = engine.live_count();
        for _ in 0..300 {
            let now = engine.tick().len();
            assert!(now <= last);
            last = now;
        }
        assert_eq!(last, 0);
        assert!(engine.tick().is_empty());
    }

    #[test]
    fn test_burst_terminates() {
        for seed in 0..10 {
            let mut engine = seeded_engine(1024.0, 768.0, seed);
            let mut ticks = 0;
            while !engine.is_finished() {
                engine.tick();
                ticks += 1;
                assert!(ticks < 1000, "burst did not terminate");
            }
        }
    }

    #[test]
    fn test_no_decay_above_the_line() {
        let mut engine = ConfettiEngine::default();
        // Dropped from y = 100 with no launch speed; crosses y = 648 at tick ~60.
        let particle = Particle::new(
            Vec2::new(500.0, 100.0),
            Vec2::ZERO,
            0.3,
            10.0,
            DEFAULT_PALETTE[2],
            Shape::Heart,
        );
        engine.start_with(1920.0, 1080.0, vec![particle]);
        let line = engine.decay_line_y();

        for _ in 0..50 {
            let live = engine.tick();
            assert_eq!(live.len(), 1);
            assert!(live[0].position.y < line);
            assert_eq!(live[0].opacity, 1.0);
        }

        while engine.particles()[0].position.y <= line {
            engine.tick();
        }
        assert!(engine.particles()[0].opacity < 1.0);
    }

    #[test]
    fn test_configurable_decay_line() {
        let params = ConfettiParams {
            decay_start_fraction: 0.25,
            ..ConfettiParams::default()
        };
        let mut engine = ConfettiEngine::new(params);
        engine.start_with(
            100.0,
            400.0,
            vec![Particle::new(
                Vec2::new(0.0, 150.0),
                Vec2::ZERO,
                0.0,
                10.0,
                DEFAULT_PALETTE[0],
                Shape::Circle,
            )],
        );
        engine.tick();
        assert!(engine.particles()[0].opacity < 1.0);
    }

    #[test]
    fn test_full_hd_burst_clears_within_200_ticks() {
        let mut engine = seeded_engine(1920.0, 1080.0, 2024);
        for _ in 0..200 {
            for p in engine.tick() {
                assert!(p.opacity >= 0.0);
            }
        }
        assert_eq!(engine.live_count(), 0);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut engine = seeded_engine(640.0, 480.0, 9);
        engine.stop();
        assert!(engine.is_finished());
        engine.stop();
        assert!(engine.tick().is_empty());
    }
}
