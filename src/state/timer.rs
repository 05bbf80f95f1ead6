use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Status shown after configure and reset.
pub const STATUS_READY: &str = "READY TO START";
/// Status shown while the clock runs.
pub const STATUS_RUNNING: &str = "HACKING IN PROGRESS";
/// Status shown while the clock is paused.
pub const STATUS_PAUSED: &str = "HACKING PAUSED";
/// Terminal status written by auto completion.
pub const STATUS_TIME_UP: &str = "TIME IS UP";
/// Status-only preset used during the lunch break.
pub const STATUS_LUNCH: &str = "LUNCH BREAK";

/// Direction the shared clock runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    /// Counts down from the configured duration to zero.
    #[default]
    Countdown,
    /// Counts up from zero without a fixed end.
    Countup,
}

/// The single shared timer record stored under the `timer` path.
///
/// While running, the display is derived from the anchor timestamps alone
/// (`endTime` for countdowns, `startTime` for count-ups); while stopped it is
/// exactly `remaining`. Every transition below keeps that invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub mode: TimerMode,
    pub is_running: bool,
    /// Count-up anchor in milliseconds since the epoch, `0` when cleared.
    #[serde(default)]
    pub start_time: i64,
    /// Countdown anchor in milliseconds since the epoch, `0` when cleared.
    #[serde(default)]
    pub end_time: i64,
    /// Seconds shown while stopped.
    #[serde(default)]
    pub remaining: u64,
    /// Seconds restored by a reset.
    #[serde(default)]
    pub initial_duration: u64,
    #[serde(default)]
    pub status: String,
}

impl Default for TimerState {
    fn default() -> Self {
        Self::configured(TimerMode::Countdown, 0)
    }
}

impl TimerState {
    /// Fresh, stopped state for the given mode and duration.
    pub fn configured(mode: TimerMode, duration_seconds: u64) -> Self {
        let duration = match mode {
            TimerMode::Countdown => duration_seconds,
            TimerMode::Countup => 0,
        };
        Self {
            mode,
            is_running: false,
            start_time: 0,
            end_time: 0,
            remaining: duration,
            initial_duration: duration,
            status: STATUS_READY.to_string(),
        }
    }

    /// Replace the whole state with a freshly configured one.
    pub fn configure(&mut self, mode: TimerMode, duration_seconds: u64) {
        *self = Self::configured(mode, duration_seconds);
    }

    /// Start (or resume) the clock at `now_ms`. No-op when already running.
    pub fn start(&mut self, now_ms: i64) {
        if self.is_running {
            return;
        }

        match self.mode {
            TimerMode::Countdown => {
                let seconds = if self.remaining > 0 {
                    self.remaining
                } else {
                    self.initial_duration
                };
                // A zero anchor keeps an unconfigured countdown from looping on completion.
                self.end_time = if seconds > 0 {
                    now_ms + secs_to_ms(seconds)
                } else {
                    0
                };
                self.start_time = 0;
            }
            TimerMode::Countup => {
                self.start_time = now_ms - secs_to_ms(self.remaining);
                self.end_time = 0;
            }
        }

        self.is_running = true;
        self.status = STATUS_RUNNING.to_string();
    }

    /// Freeze the displayed value into `remaining`. No-op when already stopped.
    pub fn pause(&mut self, now_ms: i64) {
        if !self.is_running {
            return;
        }
        self.remaining = self.display_seconds(now_ms);
        self.is_running = false;
        self.status = STATUS_PAUSED.to_string();
    }

    /// Pause a running clock, start a stopped one.
    pub fn toggle(&mut self, now_ms: i64) {
        if self.is_running {
            self.pause(now_ms);
        } else {
            self.start(now_ms);
        }
    }

    /// Stop and restore the configured duration.
    pub fn reset(&mut self) {
        self.is_running = false;
        self.remaining = match self.mode {
            TimerMode::Countdown => self.initial_duration,
            TimerMode::Countup => 0,
        };
        self.start_time = 0;
        self.end_time = 0;
        self.status = STATUS_READY.to_string();
    }

    /// Overwrite the banner text only.
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Whole seconds to display at `now_ms`.
    pub fn display_seconds(&self, now_ms: i64) -> u64 {
        if !self.is_running {
            return self.remaining;
        }

        match self.mode {
            TimerMode::Countdown => {
                let left_ms = self.end_time - now_ms;
                if left_ms <= 0 {
                    0
                } else {
                    (left_ms as u64).div_ceil(1000)
                }
            }
            TimerMode::Countup => (now_ms - self.start_time).max(0) as u64 / 1000,
        }
    }

    /// Whether a viewer that computed `display` should declare the countdown over.
    pub fn needs_completion(&self, display: u64) -> bool {
        self.mode == TimerMode::Countdown
            && self.is_running
            && display == 0
            && self.initial_duration > 0
            && self.status != STATUS_TIME_UP
    }

    /// Terminal transition written once the countdown reaches zero.
    pub fn complete(&mut self) {
        self.is_running = false;
        self.remaining = 0;
        self.status = STATUS_TIME_UP.to_string();
    }
}

fn secs_to_ms(seconds: u64) -> i64 {
    i64::try_from(seconds.saturating_mul(1000)).unwrap_or(i64::MAX)
}

/// Flip-clock digits for a displayed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DisplayDigits {
    pub hours: u64,
    pub minutes: u8,
    pub seconds: u8,
}

impl DisplayDigits {
    /// Split a number of seconds into hours, minutes and seconds.
    pub fn from_seconds(total: u64) -> Self {
        Self {
            hours: total / 3600,
            minutes: ((total % 3600) / 60) as u8,
            seconds: (total % 60) as u8,
        }
    }
}

impl std::fmt::Display for DisplayDigits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;

    fn running_countdown(seconds: u64) -> TimerState {
        let mut state = TimerState::configured(TimerMode::Countdown, seconds);
        state.start(T0);
        state
    }

    #[test]
    fn configure_resets_everything() {
        let mut state = running_countdown(90);
        state.configure(TimerMode::Countup, 90);

        assert_eq!(state, TimerState::configured(TimerMode::Countup, 0));
        assert_eq!(state.remaining, 0);
        assert_eq!(state.status, STATUS_READY);
    }

    #[test]
    fn start_derives_countdown_anchor_from_remaining() {
        let state = running_countdown(600);
        assert!(state.is_running);
        assert_eq!(state.end_time, T0 + 600_000);
        assert_eq!(state.status, STATUS_RUNNING);
        assert_eq!(state.display_seconds(T0), 600);
    }

    #[test]
    fn start_is_noop_while_running() {
        let mut state = running_countdown(600);
        let before = state.clone();
        state.start(T0 + 30_000);
        assert_eq!(state, before);
    }

    #[test]
    fn countdown_rounds_partial_seconds_up() {
        let state = running_countdown(10);
        assert_eq!(state.display_seconds(T0 + 1), 10);
        assert_eq!(state.display_seconds(T0 + 999), 10);
        assert_eq!(state.display_seconds(T0 + 1_000), 9);
        assert_eq!(state.display_seconds(T0 + 9_001), 1);
        assert_eq!(state.display_seconds(T0 + 10_000), 0);
        assert_eq!(state.display_seconds(T0 + 60_000), 0);
    }

    #[test]
    fn countup_floors_elapsed_time() {
        let mut state = TimerState::configured(TimerMode::Countup, 0);
        state.start(T0);
        assert_eq!(state.display_seconds(T0 + 999), 0);
        assert_eq!(state.display_seconds(T0 + 61_500), 61);
    }

    #[test]
    fn pause_then_start_is_continuous() {
        for remaining in [1u64, 7, 59, 600, 3_600 * 24] {
            let mut state = running_countdown(remaining);
            let at = T0 + 400;
            let before = state.display_seconds(at);

            state.pause(at);
            assert!(!state.is_running);
            assert_eq!(state.status, STATUS_PAUSED);
            assert_eq!(state.display_seconds(at + 50_000), before);

            state.start(at + 50_000);
            let after = state.display_seconds(at + 50_000);
            assert!(before.abs_diff(after) <= 1, "{before} vs {after}");
        }
    }

    #[test]
    fn countup_resume_keeps_elapsed_time() {
        let mut state = TimerState::configured(TimerMode::Countup, 0);
        state.start(T0);
        state.pause(T0 + 42_300);
        assert_eq!(state.remaining, 42);

        state.start(T0 + 100_000);
        assert_eq!(state.start_time, T0 + 100_000 - 42_000);
        assert_eq!(state.display_seconds(T0 + 101_000), 43);
    }

    #[test]
    fn running_countdown_decreases_with_elapsed_time() {
        let state = running_countdown(300);
        let mut previous = state.display_seconds(T0);
        for step in 1..=300 {
            let now = T0 + step * 1_000;
            let shown = state.display_seconds(now);
            assert!(shown <= previous);
            assert_eq!(shown, 300 - step as u64);
            previous = shown;
        }
    }

    #[test]
    fn reset_restores_initial_duration() {
        let mut state = running_countdown(120);
        state.pause(T0 + 30_000);
        state.reset();

        assert!(!state.is_running);
        assert_eq!(state.remaining, 120);
        assert_eq!((state.start_time, state.end_time), (0, 0));
        assert_eq!(state.status, STATUS_READY);
    }

    #[test]
    fn set_status_leaves_run_state_alone() {
        let mut state = running_countdown(120);
        state.set_status(STATUS_LUNCH);
        assert!(state.is_running);
        assert_eq!(state.end_time, T0 + 120_000);
        assert_eq!(state.status, STATUS_LUNCH);
    }

    #[test]
    fn exhausted_countdown_restarts_from_initial_duration() {
        let mut state = running_countdown(5);
        state.complete();
        state.start(T0 + 10_000);
        assert_eq!(state.display_seconds(T0 + 10_000), 5);
    }

    #[test]
    fn zero_duration_countdown_never_needs_completion() {
        let mut state = TimerState::configured(TimerMode::Countdown, 0);
        state.start(T0);
        assert_eq!(state.end_time, 0);
        assert_eq!(state.display_seconds(T0), 0);
        assert!(!state.needs_completion(0));
    }

    #[test]
    fn completion_is_requested_only_once() {
        let mut state = running_countdown(5);
        let display = state.display_seconds(T0 + 5_200);
        assert_eq!(display, 0);
        assert!(state.needs_completion(display));

        state.complete();
        assert!(!state.is_running);
        assert_eq!(state.status, STATUS_TIME_UP);
        assert!(!state.needs_completion(state.display_seconds(T0 + 6_000)));
    }

    #[test]
    fn toggle_alternates_between_start_and_pause() {
        let mut state = TimerState::configured(TimerMode::Countdown, 60);
        state.toggle(T0);
        assert!(state.is_running);
        state.toggle(T0 + 10_000);
        assert!(!state.is_running);
        assert_eq!(state.remaining, 50);
    }

    #[test]
    fn state_uses_camel_case_on_the_wire() {
        let value = serde_json::to_value(running_countdown(5)).unwrap();
        assert_eq!(value["mode"], "countdown");
        assert_eq!(value["isRunning"], true);
        assert_eq!(value["endTime"], T0 + 5_000);
        assert_eq!(value["initialDuration"], 5);
    }

    #[test]
    fn digits_split_hours_minutes_seconds() {
        let digits = DisplayDigits::from_seconds(26 * 3600 + 5 * 60 + 9);
        assert_eq!(
            digits,
            DisplayDigits {
                hours: 26,
                minutes: 5,
                seconds: 9
            }
        );
        assert_eq!(digits.to_string(), "26:05:09");
    }
}
