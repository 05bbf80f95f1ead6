use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        desk::TeamSummary,
        sse::{
            DomainRevealedEvent, RegistrationChangedEvent, ServerEvent, SyncFailedEvent,
            SystemStatus, TeamUpdatedEvent, TimerCueEvent, TimerTickEvent, WheelSpinEvent,
        },
        timer::TimerView,
    },
    state::{
        SharedState,
        cues::AudioCue,
        spinner::{SpinOutcome, SpinStarted},
    },
};

const EVENT_TIMER_TICK: &str = "timer.tick";
const EVENT_TIMER_CUE: &str = "timer.cue";
const EVENT_TEAM_UPDATED: &str = "team.updated";
const EVENT_WHEEL_SPIN: &str = "wheel.spin";
const EVENT_DOMAIN_REVEALED: &str = "domain.revealed";
const EVENT_SYNC_FAILED: &str = "sync.failed";
const EVENT_REGISTRATION_CHANGED: &str = "registration.changed";
const EVENT_SYSTEM_STATUS: &str = "system_status";

/// Broadcast the timer view after its displayed value or banner changed.
pub fn broadcast_timer_tick(state: &SharedState, view: TimerView) {
    send_public_event(state, EVENT_TIMER_TICK, &TimerTickEvent(view));
}

/// Broadcast an audio cue to every display.
pub fn broadcast_timer_cue(state: &SharedState, cue: AudioCue, display: u64) {
    send_public_event(state, EVENT_TIMER_CUE, &TimerCueEvent { cue, display });
}

/// Broadcast the new desk view of a team to displays and operators.
pub fn broadcast_team_updated(state: &SharedState, team: TeamSummary) {
    let payload = TeamUpdatedEvent { team };
    send_public_event(state, EVENT_TEAM_UPDATED, &payload);
    send_operator_event(state, EVENT_TEAM_UPDATED, &payload);
}

/// Broadcast that a spin started. The landing angle is only sent with `domain.revealed`.
pub fn broadcast_wheel_spin(state: &SharedState, team_id: &str, started: &SpinStarted) {
    let payload = WheelSpinEvent {
        team_id: team_id.to_string(),
        start_deg: started.start_deg,
        duration_ms: started.duration.as_millis() as u64,
    };
    send_public_event(state, EVENT_WHEEL_SPIN, &payload);
    send_operator_event(state, EVENT_WHEEL_SPIN, &payload);
}

/// Broadcast the label the wheel landed on.
pub fn broadcast_domain_revealed(state: &SharedState, team_id: &str, outcome: &SpinOutcome) {
    let payload = DomainRevealedEvent {
        team_id: team_id.to_string(),
        label: outcome.label.clone(),
        index: outcome.index,
        final_rotation_deg: outcome.final_rotation_deg,
    };
    send_public_event(state, EVENT_DOMAIN_REVEALED, &payload);
    send_operator_event(state, EVENT_DOMAIN_REVEALED, &payload);
}

/// Tell operators that a detached store write failed.
pub fn broadcast_sync_failed(state: &SharedState, payload: &SyncFailedEvent) {
    send_operator_event(state, EVENT_SYNC_FAILED, payload);
}

/// Tell operators that a registration row was created or changed.
pub fn broadcast_registration_changed(
    state: &SharedState,
    registration_id: &str,
    status: Option<&str>,
) {
    let payload = RegistrationChangedEvent {
        registration_id: registration_id.to_string(),
        status: status.map(str::to_string),
    };
    send_operator_event(state, EVENT_REGISTRATION_CHANGED, &payload);
}

/// Broadcast entering or leaving degraded mode on both streams.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    let payload = SystemStatus { degraded };
    send_public_event(state, EVENT_SYSTEM_STATUS, &payload);
    send_operator_event(state, EVENT_SYSTEM_STATUS, &payload);
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

fn send_operator_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.operator_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize operator SSE payload"),
    }
}
