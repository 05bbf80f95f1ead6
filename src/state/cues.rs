use serde::Serialize;
use utoipa::ToSchema;

use crate::state::timer::{TimerMode, TimerState};

/// Last whole second that still produces a countdown tick.
pub const TICK_THRESHOLD: u64 = 10;

/// Audio cue a viewer should play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum AudioCue {
    /// One of the final ten seconds was reached.
    Tick(u64),
    /// The countdown went from one to zero.
    Alarm,
}

/// Per-viewer memory of the last cued value.
#[derive(Debug, Clone, Default)]
pub struct CueTracker {
    last: Option<u64>,
}

impl CueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the latest displayed value and get the cue to play, if any.
    pub fn observe(&mut self, state: &TimerState, display: u64) -> Option<AudioCue> {
        if !(state.is_running && state.mode == TimerMode::Countdown) {
            self.last = None;
            return None;
        }

        if self.last == Some(display) {
            return None;
        }
        let previous = self.last.replace(display);

        match display {
            0 if previous == Some(1) => Some(AudioCue::Alarm),
            1..=TICK_THRESHOLD => Some(AudioCue::Tick(display)),
            _ => None,
        }
    }
}
