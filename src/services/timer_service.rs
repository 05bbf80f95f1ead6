use tracing::info;

use crate::{
    dao::realtime_store::{TIMER_PATH, read_typed, write_typed},
    dto::timer::{MAX_DURATION_SECONDS, TimerActionResponse, TimerView},
    error::ServiceError,
    services::auth_service::Operator,
    state::{
        SharedState,
        timer::{STATUS_LUNCH, STATUS_PAUSED, TimerMode, TimerState},
    },
};

/// Timer as every display currently renders it.
///
/// Served from the local mirror kept by the viewer loop; falls back to a direct
/// read before the first push arrives.
pub async fn current(state: &SharedState) -> Result<TimerView, ServiceError> {
    let timer = match state.timer_snapshot() {
        Some(timer) => timer,
        None => {
            let realtime = state.realtime();
            state
                .bounded(read_typed::<TimerState>(realtime.as_ref(), TIMER_PATH))
                .await?
                .unwrap_or_default()
        }
    };
    Ok(TimerView::at(&timer, state.now_ms()))
}

/// Reset the shared record to a stopped clock of the given mode and length.
pub async fn configure(
    state: &SharedState,
    operator: &Operator,
    mode: TimerMode,
    duration_seconds: u64,
) -> Result<TimerActionResponse, ServiceError> {
    if duration_seconds > MAX_DURATION_SECONDS {
        return Err(ServiceError::InvalidInput(format!(
            "duration must not exceed {MAX_DURATION_SECONDS} seconds"
        )));
    }
    mutate(state, operator, "configure", |timer, _| {
        timer.configure(mode, duration_seconds)
    })
    .await
}

/// Start or resume the clock.
pub async fn start(
    state: &SharedState,
    operator: &Operator,
) -> Result<TimerActionResponse, ServiceError> {
    mutate(state, operator, "start", |timer, now| timer.start(now)).await
}

/// Pause the clock, freezing the displayed value.
pub async fn pause(
    state: &SharedState,
    operator: &Operator,
) -> Result<TimerActionResponse, ServiceError> {
    mutate(state, operator, "pause", |timer, now| timer.pause(now)).await
}

/// Single play/pause control.
pub async fn toggle(
    state: &SharedState,
    operator: &Operator,
) -> Result<TimerActionResponse, ServiceError> {
    mutate(state, operator, "toggle", |timer, now| timer.toggle(now)).await
}

/// Stop and restore the configured duration.
pub async fn reset(
    state: &SharedState,
    operator: &Operator,
) -> Result<TimerActionResponse, ServiceError> {
    mutate(state, operator, "reset", |timer, _| timer.reset()).await
}

/// Overwrite the banner text.
pub async fn set_status(
    state: &SharedState,
    operator: &Operator,
    status: String,
) -> Result<TimerActionResponse, ServiceError> {
    let status = status.trim().to_string();
    if status.is_empty() {
        return Err(ServiceError::InvalidInput("status must not be empty".into()));
    }
    mutate(state, operator, "status", move |timer, _| timer.set_status(status)).await
}

/// `LUNCH BREAK` preset: banner only, the clock keeps running.
pub async fn lunch(
    state: &SharedState,
    operator: &Operator,
) -> Result<TimerActionResponse, ServiceError> {
    mutate(state, operator, "lunch", |timer, _| timer.set_status(STATUS_LUNCH)).await
}

/// `HACKING PAUSED` preset: pauses the clock and shows the banner.
pub async fn hold(
    state: &SharedState,
    operator: &Operator,
) -> Result<TimerActionResponse, ServiceError> {
    mutate(state, operator, "hold", |timer, now| {
        timer.pause(now);
        timer.set_status(STATUS_PAUSED);
    })
    .await
}

/// Read the shared record, apply `apply`, and write it back under the persistence timeout.
///
/// The local mirror is left alone: it follows the store's push.
async fn mutate<F>(
    state: &SharedState,
    operator: &Operator,
    action: &'static str,
    apply: F,
) -> Result<TimerActionResponse, ServiceError>
where
    F: FnOnce(&mut TimerState, i64),
{
    let realtime = state.realtime();
    let mut timer = state
        .bounded(read_typed::<TimerState>(realtime.as_ref(), TIMER_PATH))
        .await?
        .unwrap_or_default();

    let now = state.now_ms();
    apply(&mut timer, now);

    state
        .bounded(write_typed(realtime.as_ref(), TIMER_PATH, &timer))
        .await?;

    info!(
        operator = %operator.email(),
        action,
        status = %timer.status,
        running = timer.is_running,
        "timer updated"
    );

    Ok(TimerActionResponse {
        view: TimerView::at(&timer, now),
        state: timer,
    })
}
