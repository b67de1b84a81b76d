//! Candlewish library - birthday cake with blowable candles and confetti

pub mod audio;
pub mod cli;
pub mod confetti;
pub mod error;
pub mod params;
pub mod scheduler;
pub mod stage;

pub use error::{CaptureError, WishError, WishResult};
pub use scheduler::{Flow, FrameClock, FrameScheduler, Pacing};
pub use stage::{BlowTrigger, CakeStage, StagePhase};
