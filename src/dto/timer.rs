use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::state::timer::{DisplayDigits, TimerMode, TimerState};

/// Longest countdown an operator may configure (one week).
pub const MAX_DURATION_SECONDS: u64 = 7 * 24 * 3600;

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
/// Payload for `POST /operator/timer/configure`.
pub struct ConfigureTimerRequest {
    pub mode: TimerMode,
    /// Countdown length; ignored for count-up.
    #[serde(default)]
    #[validate(range(max = MAX_DURATION_SECONDS))]
    pub duration_seconds: u64,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
/// Payload for `POST /operator/timer/status`.
pub struct SetStatusRequest {
    #[validate(length(min = 1, max = 64))]
    pub status: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// What every display renders: the computed value plus the banner.
pub struct TimerView {
    pub display_seconds: u64,
    pub digits: DisplayDigits,
    pub status: String,
    pub mode: TimerMode,
    pub is_running: bool,
}

impl TimerView {
    /// Compute the view of `state` at `now_ms`.
    pub fn at(state: &TimerState, now_ms: i64) -> Self {
        let display_seconds = state.display_seconds(now_ms);
        Self {
            display_seconds,
            digits: DisplayDigits::from_seconds(display_seconds),
            status: state.status.clone(),
            mode: state.mode,
            is_running: state.is_running,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Result of an operator timer action: the record as written.
pub struct TimerActionResponse {
    pub state: TimerState,
    pub view: TimerView,
}
