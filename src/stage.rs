//! Cake scene controller.
//!
//! Drives the timed reveal of the cake, arms the blow detector once the
//! candles can be blown out, and runs the confetti celebration afterwards.
//! One call to [`CakeStage::frame`] per scheduler frame.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use glam::Vec2;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::audio::{CaptureBackend, GestureDetector};
use crate::confetti::{render, ConfettiEngine, Surface};
use crate::params::{Params, StageTimeline};
use crate::scheduler::{FrameClock, Flow};

/// Scene progression, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StagePhase {
    Title,
    Cake,
    CandlesLit,
    /// Candles can be blown out; the detector is listening
    CandlesReady,
    Blown,
    /// Confetti in flight
    Celebrating,
    MessageShown,
    SurpriseReady,
}

/// What blew the candles out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlowTrigger {
    Manual,
    Microphone,
}

pub struct CakeStage<B: CaptureBackend> {
    timeline: StageTimeline,
    viewport: Vec2,
    detector: GestureDetector<B>,
    confetti: ConfettiEngine,
    rng: StdRng,
    phase: StagePhase,
    /// Scene time of the latest frame
    now: Duration,
    blown_at: Option<Duration>,
    blown_by: Option<BlowTrigger>,
    /// Set by the detector callback, consumed on the same frame
    heard: Rc<Cell<bool>>,
    listening_requested: bool,
    torn_down: bool,
}

impl<B: CaptureBackend> CakeStage<B> {
    pub fn new(params: &Params, backend: B, rng: StdRng) -> Self {
        Self {
            timeline: params.stage.clone(),
            viewport: Vec2::new(
                params.render.viewport_width as f32,
                params.render.viewport_height as f32,
            ),
            detector: GestureDetector::new(backend, params.detector.clone()),
            confetti: ConfettiEngine::new(params.confetti.clone()),
            rng,
            phase: StagePhase::Title,
            now: Duration::ZERO,
            blown_at: None,
            blown_by: None,
            heard: Rc::new(Cell::new(false)),
            listening_requested: false,
            torn_down: false,
        }
    }

    pub fn phase(&self) -> StagePhase {
        self.phase
    }

    pub fn blown_by(&self) -> Option<BlowTrigger> {
        self.blown_by
    }

    pub fn timeline(&self) -> &StageTimeline {
        &self.timeline
    }

    pub fn confetti(&self) -> &ConfettiEngine {
        &self.confetti
    }

    pub fn detector(&self) -> &GestureDetector<B> {
        &self.detector
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// True once the candles accept a blow and nothing has blown them yet
    pub fn can_blow(&self) -> bool {
        !self.torn_down && self.phase == StagePhase::CandlesReady
    }

    /// Advance the scene to `clock.elapsed` and draw the confetti.
    ///
    /// Returns `Flow::Stop` once the surprise is ready and the confetti has
    /// settled, or after `teardown`.
    pub fn frame<S: Surface + ?Sized>(
        &mut self,
        clock: FrameClock,
        surface: Option<&mut S>,
    ) -> Flow {
        if self.torn_down {
            return Flow::Stop;
        }
        self.now = clock.elapsed;

        self.advance_intro();

        if self.phase == StagePhase::CandlesReady && !self.listening_requested {
            self.listening_requested = true;
            let heard = Rc::clone(&self.heard);
            pollster::block_on(self.detector.start_listening(move || heard.set(true)));
        }

        if self.detector.is_listening() {
            self.detector.sample();
        }
        if self.heard.take() {
            self.blow(BlowTrigger::Microphone);
        }

        self.advance_celebration();

        if self.phase >= StagePhase::Celebrating {
            self.confetti.tick();
        }
        if let Some(surface) = surface {
            surface.clear();
            render(Some(surface), self.confetti.particles());
        }

        if self.phase == StagePhase::SurpriseReady && self.confetti.is_finished() {
            info!(frame = clock.frame, "scene complete");
            Flow::Stop
        } else {
            Flow::Continue
        }
    }

    /// Blow the candles out. Only the first blow after the candles are
    /// ready counts; returns whether this one did.
    pub fn blow(&mut self, trigger: BlowTrigger) -> bool {
        if !self.can_blow() {
            debug!(?trigger, phase = ?self.phase, "blow ignored");
            return false;
        }

        self.detector.stop_listening();
        self.phase = StagePhase::Blown;
        self.blown_at = Some(self.now);
        self.blown_by = Some(trigger);
        info!(?trigger, at_ms = self.now.as_millis() as u64, "candles blown out");
        true
    }

    /// Stop listening and drop the confetti. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.detector.stop_listening();
        self.confetti.stop();
        debug!(phase = ?self.phase, "stage torn down");
    }

    fn advance_intro(&mut self) {
        if self.phase >= StagePhase::CandlesReady {
            return;
        }

        let target = if self.now >= self.timeline.candles_ready_at() {
            StagePhase::CandlesReady
        } else if self.now >= self.timeline.candles_lit_at() {
            StagePhase::CandlesLit
        } else if self.now >= self.timeline.cake_at() {
            StagePhase::Cake
        } else {
            StagePhase::Title
        };
        self.enter(target);
    }

    fn advance_celebration(&mut self) {
        let Some(blown_at) = self.blown_at else {
            return;
        };
        let since = self.now.saturating_sub(blown_at);

        if self.phase < StagePhase::Celebrating && since >= self.timeline.celebration_after() {
            self.confetti.start(self.viewport.x, self.viewport.y, &mut self.rng);
            self.enter(StagePhase::Celebrating);
        }
        if self.phase < StagePhase::MessageShown && since >= self.timeline.message_after() {
            self.enter(StagePhase::MessageShown);
        }
        if self.phase < StagePhase::SurpriseReady && since >= self.timeline.surprise_after() {
            self.enter(StagePhase::SurpriseReady);
        }
    }

    fn enter(&mut self, phase: StagePhase) {
        if phase > self.phase {
            info!(?phase, at_ms = self.now.as_millis() as u64, "stage phase");
            self.phase = phase;
        }
    }
}
