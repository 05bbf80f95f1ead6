use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::{desk::TeamSummary, timer::TimerView},
    state::cues::AudioCue,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Build an event from raw text.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream (`public` or `operator`).
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether store health checks are currently failing.
    pub degraded: bool,
    /// Timer as last pushed by the realtime store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerView>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the displayed timer value or banner changes.
#[serde(transparent)]
pub struct TimerTickEvent(pub TimerView);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when viewers should play an audio cue.
pub struct TimerCueEvent {
    pub cue: AudioCue,
    pub display: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Broadcast when the wheel starts turning. Carries no hint of where it lands.
pub struct WheelSpinEvent {
    pub team_id: String,
    pub start_deg: f64,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Broadcast once the wheel has landed and the label is revealed.
pub struct DomainRevealedEvent {
    pub team_id: String,
    pub label: String,
    pub index: usize,
    pub final_rotation_deg: f64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever the desk view of a team changes.
pub struct TeamUpdatedEvent {
    pub team: TeamSummary,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Operator-only notice that a detached store write failed.
pub struct SyncFailedEvent {
    pub team_id: String,
    /// `registrations` or `realtime`.
    pub target: String,
    /// Store action that failed, e.g. `eventCheckIn`.
    pub action: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Operator-only notice that a registration row changed.
pub struct RegistrationChangedEvent {
    pub registration_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
