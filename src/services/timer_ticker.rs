//! Server-side timer viewer.
//!
//! Mirrors the shared `timer` record, recomputes the display on a fixed
//! interval, fans ticks and audio cues out over the public SSE stream, and acts
//! as the authorized viewer that declares a finished countdown over.

use serde_json::Value;
use tokio::{
    sync::watch,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};

use crate::{
    dao::{
        realtime_store::{RealtimeStore, TIMER_PATH, decode, encode},
        storage::StorageResult,
    },
    dto::timer::TimerView,
    services::sse_events,
    state::{SharedState, cues::CueTracker, timer::TimerState},
};

/// Run the viewer loop forever.
pub async fn run(state: SharedState) {
    let realtime = state.realtime();
    let mut updates = realtime.subscribe(TIMER_PATH);
    let mut viewer = TimerViewer::new(true);
    viewer.observe_push(&state, updates.borrow_and_update().clone());

    let mut ticker = interval(state.config().tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(interval_ms = state.config().tick_interval().as_millis() as u64, "timer viewer started");

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    warn!("timer subscription closed; resubscribing");
                    updates = resubscribe(realtime.as_ref());
                    continue;
                }
                let raw = updates.borrow_and_update().clone();
                viewer.observe_push(&state, raw);
            }
            _ = ticker.tick() => {
                viewer.tick(&state, realtime.as_ref()).await;
            }
        }
    }
}

fn resubscribe(realtime: &dyn RealtimeStore) -> watch::Receiver<Option<Value>> {
    realtime.subscribe(TIMER_PATH)
}

/// One viewer's local view of the shared timer.
pub struct TimerViewer {
    authorized: bool,
    raw: Option<Value>,
    timer: Option<TimerState>,
    cues: CueTracker,
    last_view: Option<(u64, String, bool)>,
}

impl TimerViewer {
    /// `authorized` viewers may write the terminal state.
    pub fn new(authorized: bool) -> Self {
        Self {
            authorized,
            raw: None,
            timer: None,
            cues: CueTracker::new(),
            last_view: None,
        }
    }

    /// Absorb a value pushed by the store. Undecodable values are ignored and the
    /// previous state kept.
    pub fn observe_push(&mut self, state: &SharedState, raw: Option<Value>) {
        let timer = match raw.clone().map(|value| decode::<TimerState>(TIMER_PATH, value)) {
            Some(Ok(timer)) => Some(timer),
            Some(Err(err)) => {
                warn!(error = %err, "ignoring malformed timer record");
                return;
            }
            None => None,
        };

        self.raw = raw;
        self.timer = timer.clone();
        state.publish_timer(timer);
    }

    /// Recompute the display, emit ticks and cues, and complete the countdown if due.
    pub async fn tick(&mut self, state: &SharedState, realtime: &dyn RealtimeStore) {
        let Some(timer) = self.timer.clone() else {
            return;
        };
        let now = state.now_ms();
        let view = TimerView::at(&timer, now);

        let key = (view.display_seconds, view.status.clone(), view.is_running);
        if self.last_view.as_ref() != Some(&key) {
            self.last_view = Some(key);
            sse_events::broadcast_timer_tick(state, view.clone());
        }

        if let Some(cue) = self.cues.observe(&timer, view.display_seconds) {
            sse_events::broadcast_timer_cue(state, cue, view.display_seconds);
        }

        if self.authorized && timer.needs_completion(view.display_seconds) {
            if let Some(observed) = self.raw.clone() {
                match complete_if_due(realtime, observed, now).await {
                    Ok(true) => info!("countdown finished; timer marked as up"),
                    Ok(false) => debug!("timer changed before completion; skipping"),
                    Err(err) => warn!(error = %err, "failed to mark timer as up"),
                }
            }
        }
    }
}

/// Write the terminal state if the record still equals `observed` and is due.
///
/// Returns whether this caller performed the write; concurrent callers holding
/// the same observation race on the store's compare-and-swap and exactly one wins.
pub async fn complete_if_due(
    realtime: &dyn RealtimeStore,
    observed: Value,
    now_ms: i64,
) -> StorageResult<bool> {
    let mut timer = decode::<TimerState>(TIMER_PATH, observed.clone())?;
    if !timer.needs_completion(timer.display_seconds(now_ms)) {
        return Ok(false);
    }

    timer.complete();
    let next = encode(TIMER_PATH, &timer)?;
    realtime
        .compare_and_swap(TIMER_PATH, Some(observed), Some(next))
        .await
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            realtime_store::{MemoryRealtimeStore, read_typed, write_typed},
            registration_store::MemoryRegistrationStore,
        },
        state::{
            AppState, Stores,
            clock::{Clock, ManualClock},
            timer::{STATUS_TIME_UP, TimerMode},
        },
    };

    const T0: i64 = 1_700_000_000_000;

    fn setup() -> (SharedState, MemoryRealtimeStore, ManualClock) {
        let realtime = MemoryRealtimeStore::new();
        let clock = ManualClock::new(T0);
        let state = AppState::with_clock(
            AppConfig::default(),
            Stores {
                registrations: Arc::new(MemoryRegistrationStore::new()),
                realtime: Arc::new(realtime.clone()),
            },
            Arc::new(clock.clone()),
        );
        (state, realtime, clock)
    }

    async fn seed_running(realtime: &MemoryRealtimeStore, seconds: u64) -> Value {
        let mut timer = TimerState::configured(TimerMode::Countdown, seconds);
        timer.start(T0);
        write_typed(realtime, TIMER_PATH, &timer).await.unwrap();
        realtime.read(TIMER_PATH).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn five_second_countdown_ends_as_time_is_up() {
        let (state, realtime, clock) = setup();
        let raw = seed_running(&realtime, 5).await;

        let mut viewer = TimerViewer::new(true);
        viewer.observe_push(&state, Some(raw));

        for _ in 0..52 {
            clock.advance(100);
            viewer.tick(&state, &realtime).await;
        }

        let timer: TimerState = read_typed(&realtime, TIMER_PATH).await.unwrap().unwrap();
        assert_eq!(timer.display_seconds(clock.now_ms()), 0);
        assert_eq!(timer.status, STATUS_TIME_UP);
        assert!(!timer.is_running);
    }

    #[tokio::test]
    async fn concurrent_viewers_complete_exactly_once() {
        let (_state, realtime, _clock) = setup();
        let observed = seed_running(&realtime, 5).await;
        let writes_before = realtime.write_count();

        let attempts = (0..16).map(|_| {
            let realtime = realtime.clone();
            let observed = observed.clone();
            tokio::spawn(async move { complete_if_due(&realtime, observed, T0 + 5_000).await })
        });
        let results = futures::future::join_all(attempts).await;

        let winners = results
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(realtime.write_count(), writes_before + 1);

        let timer: TimerState = read_typed(&realtime, TIMER_PATH).await.unwrap().unwrap();
        assert_eq!(timer.status, STATUS_TIME_UP);
        assert!(!timer.is_running);
    }

    #[tokio::test]
    async fn unauthorized_viewer_never_writes() {
        let (state, realtime, clock) = setup();
        let raw = seed_running(&realtime, 1).await;
        let writes_before = realtime.write_count();

        let mut viewer = TimerViewer::new(false);
        viewer.observe_push(&state, Some(raw));
        clock.advance(2_000);
        viewer.tick(&state, &realtime).await;

        assert_eq!(realtime.write_count(), writes_before);
    }

    #[tokio::test]
    async fn completion_is_skipped_when_the_record_moved_on() {
        let (_state, realtime, _clock) = setup();
        let observed = seed_running(&realtime, 5).await;

        let mut paused = TimerState::configured(TimerMode::Countdown, 5);
        paused.start(T0);
        paused.pause(T0 + 4_500);
        write_typed(&realtime, TIMER_PATH, &paused).await.unwrap();

        assert!(!complete_if_due(&realtime, observed, T0 + 5_000).await.unwrap());
        let timer: TimerState = read_typed(&realtime, TIMER_PATH).await.unwrap().unwrap();
        assert_eq!(timer, paused);
    }

    #[tokio::test]
    async fn ticks_and_cues_reach_public_subscribers() {
        let (state, realtime, clock) = setup();
        let raw = seed_running(&realtime, 3).await;
        let mut events = state.public_sse().subscribe();

        let mut viewer = TimerViewer::new(false);
        viewer.observe_push(&state, Some(raw));
        viewer.tick(&state, &realtime).await;
        clock.advance(1_000);
        viewer.tick(&state, &realtime).await;

        let mut names = Vec::new();
        while let Ok(event) = events.try_recv() {
            names.push(event.event.unwrap_or_default());
        }
        assert_eq!(
            names,
            ["timer.tick", "timer.cue", "timer.tick", "timer.cue"]
        );
    }

    #[tokio::test]
    async fn malformed_push_keeps_the_previous_state() {
        let (state, realtime, _clock) = setup();
        let raw = seed_running(&realtime, 30).await;
        let mut viewer = TimerViewer::new(true);
        viewer.observe_push(&state, Some(raw));

        viewer.observe_push(&state, Some(serde_json::json!({ "mode": 42 })));
        assert_eq!(state.timer_snapshot().map(|timer| timer.remaining), Some(30));
    }

    #[tokio::test(start_paused = true)]
    async fn viewer_loop_follows_store_pushes() {
        let (state, realtime, _clock) = setup();
        tokio::spawn(run(state.clone()));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(state.timer_snapshot(), None);

        seed_running(&realtime, 120).await;
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(
            state.timer_snapshot().map(|timer| timer.initial_duration),
            Some(120)
        );
    }
}
