//! Frame-driven cooperative scheduler.
//!
//! Tasks are plain closures run once per frame on the calling thread. A task
//! keeps running until it returns [`Flow::Stop`] or is cancelled, so
//! self-ending animations and polling loops share one mechanism.

use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

/// What a tick wants to happen next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Run again next frame
    Continue,
    /// Drop this task
    Stop,
}

/// Frame number and the scheduler time at which it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameClock {
    pub frame: u64,
    /// `frame × cadence`, independent of wall-clock drift
    pub elapsed: Duration,
}

/// How `run` spaces frames out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Sleep out the rest of each cadence
    RealTime,
    /// Back-to-back frames (offline rendering)
    Immediate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

struct Task {
    id: TaskId,
    tick: Box<dyn FnMut(FrameClock) -> Flow>,
}

pub struct FrameScheduler {
    cadence: Duration,
    tasks: Vec<Task>,
    next_id: u64,
    frame: u64,
}

impl FrameScheduler {
    pub fn new(cadence: Duration) -> Self {
        Self {
            cadence,
            tasks: Vec::new(),
            next_id: 0,
            frame: 0,
        }
    }

    /// Scheduler ticking `fps` times per second (at least once)
    pub fn from_fps(fps: u32) -> Self {
        Self::new(Duration::from_nanos(1_000_000_000 / u64::from(fps.max(1))))
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    /// Frames stepped so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Register a tick closure, first run on the next `step`
    pub fn schedule(&mut self, tick: impl FnMut(FrameClock) -> Flow + 'static) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Task {
            id,
            tick: Box::new(tick),
        });
        id
    }

    /// Drop a pending task. Returns false if it already finished.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn clock(&self) -> FrameClock {
        let nanos = u64::try_from(self.cadence.as_nanos()).unwrap_or(u64::MAX);
        FrameClock {
            frame: self.frame,
            elapsed: Duration::from_nanos(nanos.saturating_mul(self.frame)),
        }
    }

    /// Run every task once, without sleeping. Returns the number still live.
    pub fn step(&mut self) -> usize {
        let clock = self.clock();
        self.tasks
            .retain_mut(|task| (task.tick)(clock) == Flow::Continue);
        self.frame += 1;
        trace!(frame = clock.frame, live = self.tasks.len(), "frame");
        self.tasks.len()
    }

    /// Step until no task is left or `max_frames` frames have run.
    /// Returns the number of frames stepped.
    pub fn run(&mut self, pacing: Pacing, max_frames: Option<u64>) -> u64 {
        let mut frames = 0;
        while !self.tasks.is_empty() {
            if max_frames.is_some_and(|max| frames >= max) {
                break;
            }

            let started = Instant::now();
            self.step();
            frames += 1;

            if pacing == Pacing::RealTime {
                if let Some(rest) = self.cadence.checked_sub(started.elapsed()) {
                    thread::sleep(rest);
                }
            }
        }
        frames
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::from_fps(60)
    }
}
