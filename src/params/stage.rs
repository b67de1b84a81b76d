//! Stage timeline: when each part of the cake scene appears.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{WishError, WishResult};

/// Delays (milliseconds) driving the cake scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageTimeline {
    /// Title letter animation, from scene start
    pub title_ms: u64,

    /// Pause between the finished title and the cake appearing
    pub cake_delay_ms: u64,

    /// Cake visible until the candles are lit
    pub candles_delay_ms: u64,

    /// Candles lit until they can be blown out
    pub candles_ready_delay_ms: u64,

    /// Blow until the confetti celebration starts
    pub celebration_delay_ms: u64,

    /// Blow until the greeting message appears
    pub message_delay_ms: u64,

    /// Blow until the surprise button appears
    pub surprise_delay_ms: u64,
}

impl Default for StageTimeline {
    fn default() -> Self {
        Self {
            title_ms: 2600,
            cake_delay_ms: 1000,
            candles_delay_ms: 2200,
            candles_ready_delay_ms: 800,
            celebration_delay_ms: 600,
            message_delay_ms: 1500,
            surprise_delay_ms: 2500,
        }
    }
}

impl StageTimeline {
    pub fn cake_at(&self) -> Duration {
        Duration::from_millis(self.intro_ms()[0])
    }

    pub fn candles_lit_at(&self) -> Duration {
        Duration::from_millis(self.intro_ms()[1])
    }

    pub fn candles_ready_at(&self) -> Duration {
        Duration::from_millis(self.intro_ms()[2])
    }

    /// Cake, candles lit and candles ready times (ms), saturating
    fn intro_ms(&self) -> [u64; 3] {
        let cake = self.title_ms.saturating_add(self.cake_delay_ms);
        let lit = cake.saturating_add(self.candles_delay_ms);
        [cake, lit, lit.saturating_add(self.candles_ready_delay_ms)]
    }

    pub fn celebration_after(&self) -> Duration {
        Duration::from_millis(self.celebration_delay_ms)
    }

    pub fn message_after(&self) -> Duration {
        Duration::from_millis(self.message_delay_ms)
    }

    pub fn surprise_after(&self) -> Duration {
        Duration::from_millis(self.surprise_delay_ms)
    }

    /// The intro must fit in a u64 of milliseconds and the post-blow delays
    /// must be ordered: celebration <= message <= surprise
    pub fn validate(&self) -> WishResult<()> {
        let intro = [
            self.cake_delay_ms,
            self.candles_delay_ms,
            self.candles_ready_delay_ms,
        ]
        .into_iter()
        .try_fold(self.title_ms, u64::checked_add);
        if intro.is_none() {
            return Err(WishError::config(
                "intro delays overflow when added up (milliseconds)",
            ));
        }

        if self.celebration_delay_ms > self.message_delay_ms
            || self.message_delay_ms > self.surprise_delay_ms
        {
            return Err(WishError::config(format!(
                "post-blow delays must be ordered, got celebration={} message={} surprise={}",
                self.celebration_delay_ms, self.message_delay_ms, self.surprise_delay_ms
            )));
        }
        Ok(())
    }
}
