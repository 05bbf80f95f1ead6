use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::state::{DeskEntry, assignment::AssignmentPhase, spinner::SpinOutcome};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
/// Query string of `GET /operator/desk/teams`.
pub struct TeamQuery {
    /// Case-insensitive search over team name, leader name and registration id.
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
/// One row of the check-in desk.
pub struct TeamSummary {
    pub registration_id: String,
    pub team_name: String,
    pub leader_name: String,
    pub leader_email: String,
    pub leader_phone: String,
    /// Sheet status, shown as `Checked In` as soon as the desk checks the team in.
    pub status: String,
    pub checked_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_domain: Option<String>,
    /// Revealed by the wheel but not yet confirmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_domain: Option<String>,
    pub spinning: bool,
}

impl From<&DeskEntry> for TeamSummary {
    fn from(entry: &DeskEntry) -> Self {
        let record = &entry.record;
        Self {
            registration_id: record.registration_id.clone(),
            team_name: record.team_name.clone(),
            leader_name: record.leader_name.clone(),
            leader_email: record.leader_email.clone(),
            leader_phone: record.leader_phone.clone(),
            status: record.status.clone(),
            checked_in: entry.machine.is_checked_in(),
            check_in_time: entry.check_in_time,
            assigned_domain: entry.machine.assigned().map(str::to_string),
            pending_domain: entry.machine.pending().map(str::to_string),
            spinning: *entry.machine.phase() == AssignmentPhase::Spinning,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
/// Payload for `POST /operator/desk/teams/{id}/confirm`.
pub struct ConfirmDomainRequest {
    /// Label the operator saw revealed; must match the pending outcome.
    #[validate(length(min = 1, max = 128))]
    pub domain: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
/// Payload for `POST /operator/desk/teams/{id}/reset`.
pub struct ResetDomainRequest {
    /// Must be `true`; resets are never implicit.
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// Outcome of one store write issued by a desk action.
pub struct SyncReport {
    /// `registrations` or `realtime`.
    pub target: String,
    pub action: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Response of check-in: the optimistic view; store writes continue in the background.
pub struct CheckInResponse {
    pub team: TeamSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Response of a finished spin.
pub struct SpinResponse {
    pub team: TeamSummary,
    pub outcome: SpinOutcome,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Response of confirm and reset: the locked view plus the awaited overlay write.
pub struct AssignmentResponse {
    pub team: TeamSummary,
    /// Result of the realtime overlay write; the sheet write continues in the background.
    pub realtime: SyncReport,
}
