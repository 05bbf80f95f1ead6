//! Check-in desk coordinator.
//!
//! Every action updates the desk's local view first and then persists to the
//! system of record and the realtime overlay independently. Store failures are
//! logged and pushed to operators as `sync.failed`; the local view is never
//! rolled back.

use std::collections::HashMap;

use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, join_all};
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::{sync::oneshot, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    dao::{
        models::{STATUS_CHECKED_IN, TeamOverlayEntity},
        realtime_store::{REGISTRATIONS_PATH, decode, encode, team_path},
        storage::StorageResult,
    },
    dto::{desk::SyncReport, desk::TeamSummary, sse::SyncFailedEvent},
    error::ServiceError,
    services::{auth_service::Operator, sse_events},
    state::{
        DeskEntry, SharedState,
        assignment::{AssignmentEvent, AssignmentMachine, AssignmentPhase},
        spinner::{SpinError, SpinOutcome},
    },
};

/// Sync target naming the system of record.
pub const TARGET_REGISTRATIONS: &str = "registrations";
/// Sync target naming the realtime overlay.
pub const TARGET_REALTIME: &str = "realtime";

/// Handle on the store writes an optimistic action left running.
///
/// Dropping it does not cancel anything.
#[derive(Debug, Default)]
pub struct PersistTicket {
    writes: Vec<JoinHandle<SyncReport>>,
}

impl PersistTicket {
    /// Number of writes still attached to the ticket.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Wait for every write and collect their reports.
    pub async fn settle(self) -> Vec<SyncReport> {
        join_all(self.writes)
            .await
            .into_iter()
            .map(|joined| {
                joined.unwrap_or_else(|err| SyncReport {
                    target: "unknown".into(),
                    action: "unknown".into(),
                    ok: false,
                    error: Some(format!("write task failed: {err}")),
                })
            })
            .collect()
    }
}

/// Outcome of confirm and reset: the overlay write is awaited, the sheet write is not.
#[derive(Debug)]
pub struct AssignmentReceipt {
    pub team: TeamSummary,
    pub realtime: SyncReport,
    pub ticket: PersistTicket,
}

/// Registrations merged with the overlay, optionally filtered by `query`.
pub async fn list_teams(
    state: &SharedState,
    operator: &Operator,
    query: Option<&str>,
) -> Result<Vec<TeamSummary>, ServiceError> {
    let order = match refresh(state).await {
        Ok(order) => order,
        Err(err) if !state.desk().is_empty() => {
            warn!(
                operator = %operator.email(),
                error = %err,
                "registration list unavailable; serving the desk's last view"
            );
            let mut ids: Vec<String> = state
                .desk()
                .iter()
                .map(|entry| entry.key().clone())
                .collect();
            ids.sort();
            ids
        }
        Err(err) => return Err(err),
    };

    let needle = query
        .map(str::trim)
        .filter(|query| !query.is_empty())
        .map(str::to_lowercase);

    Ok(order
        .iter()
        .filter_map(|id| state.desk().get(id).map(|entry| TeamSummary::from(&*entry)))
        .filter(|team| match &needle {
            Some(needle) => matches_query(team, needle),
            None => true,
        })
        .collect())
}

fn matches_query(team: &TeamSummary, needle: &str) -> bool {
    [&team.team_name, &team.leader_name, &team.registration_id]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Check a team in. Returns at once with the optimistic view; both store writes
/// keep running behind the returned ticket.
pub async fn check_in(
    state: &SharedState,
    operator: &Operator,
    team_id: &str,
) -> Result<(TeamSummary, PersistTicket), ServiceError> {
    ensure_entry(state, team_id).await?;

    let now = state.now_ms();
    let overlay = TeamOverlayEntity {
        checked_in: true,
        check_in_time: Some(now),
        assigned_domain: None,
    };
    let path = team_path(team_id);
    let overlay_value = encode(&path, &overlay)?;

    let summary = {
        let mut entry = desk_entry(state, team_id)?;
        entry
            .machine
            .apply(AssignmentEvent::CheckIn)
            .map_err(|_| {
                ServiceError::InvalidState(format!("team {team_id} is already checked in"))
            })?;
        entry.check_in_time = Some(now);
        entry.record.status = STATUS_CHECKED_IN.to_string();
        TeamSummary::from(&*entry)
    };

    info!(operator = %operator.email(), team = team_id, "team checked in");
    sse_events::broadcast_team_updated(state, summary.clone());

    let registrations = state.registrations();
    let realtime = state.realtime();
    let ticket = PersistTicket {
        writes: vec![
            spawn_write(
                state,
                team_id,
                TARGET_REGISTRATIONS,
                "eventCheckIn",
                registrations.event_check_in(team_id.to_string(), format_timestamp(now)),
            ),
            spawn_write(
                state,
                team_id,
                TARGET_REALTIME,
                "checkIn",
                realtime.write(&path, Some(overlay_value)),
            ),
        ],
    };

    Ok((summary, ticket))
}

/// Spin the wheel for a checked-in team and keep the result as pending.
///
/// No store is touched. The spin completes on its own task, so a caller that
/// goes away does not leave the team stuck mid-spin.
pub async fn request_spin(
    state: &SharedState,
    operator: &Operator,
    team_id: &str,
) -> Result<(TeamSummary, SpinOutcome), ServiceError> {
    ensure_entry(state, team_id).await?;

    // Claim the wheel before moving the team; a refused spin changes nothing.
    let (summary, started, outcome) = {
        let mut entry = desk_entry(state, team_id)?;
        if let Err(err) = entry.machine.can_apply(AssignmentEvent::SpinStarted) {
            return Err(spin_refusal(team_id, &err.from));
        }
        let (started, outcome) = state.wheel().start(state.config().segments().to_vec())?;
        entry.machine.apply(AssignmentEvent::SpinStarted)?;
        (TeamSummary::from(&*entry), started, outcome)
    };

    info!(operator = %operator.email(), team = team_id, "wheel spinning");
    sse_events::broadcast_team_updated(state, summary);
    sse_events::broadcast_wheel_spin(state, team_id, &started);

    let finish = tokio::spawn(finish_spin(state.clone(), team_id.to_string(), outcome));
    finish
        .await
        .map_err(|err| ServiceError::InvalidState(format!("spin task failed: {err}")))?
}

async fn finish_spin(
    state: SharedState,
    team_id: String,
    outcome: oneshot::Receiver<SpinOutcome>,
) -> Result<(TeamSummary, SpinOutcome), ServiceError> {
    let Ok(outcome) = outcome.await else {
        let _ = transition(&state, &team_id, AssignmentEvent::SpinAborted);
        return Err(SpinError::Interrupted.into());
    };

    let summary = transition(
        &state,
        &team_id,
        AssignmentEvent::SpinLanded {
            label: outcome.label.clone(),
        },
    )?;
    info!(team = %team_id, label = %outcome.label, "wheel landed");
    sse_events::broadcast_domain_revealed(&state, &team_id, &outcome);
    sse_events::broadcast_team_updated(&state, summary.clone());
    Ok((summary, outcome))
}

/// Lock the pending result in. `label` must be the label the wheel revealed.
///
/// The overlay write is awaited under the persistence timeout; its failure is
/// reported in the receipt while the local lock stays in place.
pub async fn confirm_assignment(
    state: &SharedState,
    operator: &Operator,
    team_id: &str,
    label: &str,
) -> Result<AssignmentReceipt, ServiceError> {
    let label = label.trim();
    ensure_entry(state, team_id).await?;

    let (summary, overlay) = {
        let mut entry = desk_entry(state, team_id)?;
        let pending = entry.machine.pending().map(str::to_string);
        entry
            .machine
            .apply(AssignmentEvent::Confirm {
                label: label.to_string(),
            })
            .map_err(|_| match &pending {
                Some(pending) => ServiceError::InvalidState(format!(
                    "pending domain for team {team_id} is `{pending}`, not `{label}`"
                )),
                None => ServiceError::InvalidState(format!(
                    "team {team_id} has no revealed domain to confirm"
                )),
            })?;
        let overlay = TeamOverlayEntity {
            checked_in: true,
            check_in_time: entry.check_in_time,
            assigned_domain: Some(label.to_string()),
        };
        (TeamSummary::from(&*entry), overlay)
    };

    info!(operator = %operator.email(), team = team_id, domain = label, "domain confirmed");
    sse_events::broadcast_team_updated(state, summary.clone());

    let path = team_path(team_id);
    let overlay_value = encode(&path, &overlay)?;
    let registrations = state.registrations();
    let realtime = state.realtime();

    let sheet = spawn_write(
        state,
        team_id,
        TARGET_REGISTRATIONS,
        "updateDomain",
        registrations.update_domain(team_id.to_string(), label.to_string()),
    );
    let overlay_write = spawn_write(
        state,
        team_id,
        TARGET_REALTIME,
        "assignDomain",
        realtime.write(&path, Some(overlay_value)),
    );

    Ok(AssignmentReceipt {
        team: summary,
        realtime: awaited(overlay_write, "assignDomain").await,
        ticket: PersistTicket {
            writes: vec![sheet],
        },
    })
}

/// Clear a confirmed domain so the team can spin again. Requires `confirmed`.
pub async fn reset_assignment(
    state: &SharedState,
    operator: &Operator,
    team_id: &str,
    confirmed: bool,
) -> Result<AssignmentReceipt, ServiceError> {
    if !confirmed {
        return Err(ServiceError::InvalidInput(
            "domain reset must be explicitly confirmed".into(),
        ));
    }
    ensure_entry(state, team_id).await?;

    let (summary, previous) = {
        let mut entry = desk_entry(state, team_id)?;
        let previous = entry.machine.assigned().map(str::to_string);
        entry
            .machine
            .apply(AssignmentEvent::Reset)
            .map_err(|_| {
                ServiceError::InvalidState(format!("team {team_id} has no confirmed domain"))
            })?;
        (TeamSummary::from(&*entry), previous)
    };

    info!(
        operator = %operator.email(),
        team = team_id,
        previous = previous.as_deref().unwrap_or_default(),
        "domain reset"
    );
    sse_events::broadcast_team_updated(state, summary.clone());

    let registrations = state.registrations();
    let realtime = state.realtime();
    let sheet = spawn_write(
        state,
        team_id,
        TARGET_REGISTRATIONS,
        "updateDomain",
        registrations.update_domain(team_id.to_string(), String::new()),
    );
    let overlay_write = spawn_write(
        state,
        team_id,
        TARGET_REALTIME,
        "resetDomain",
        realtime.write(&format!("{}/assignedDomain", team_path(team_id)), None),
    );

    Ok(AssignmentReceipt {
        team: summary,
        realtime: awaited(overlay_write, "resetDomain").await,
        ticket: PersistTicket {
            writes: vec![sheet],
        },
    })
}

/// Throw away an unconfirmed result. Local only.
pub async fn discard_pending(
    state: &SharedState,
    operator: &Operator,
    team_id: &str,
) -> Result<TeamSummary, ServiceError> {
    ensure_entry(state, team_id).await?;
    let summary = transition(state, team_id, AssignmentEvent::Discard).map_err(|_| {
        ServiceError::InvalidState(format!("team {team_id} has no pending domain"))
    })?;

    info!(operator = %operator.email(), team = team_id, "pending domain discarded");
    sse_events::broadcast_team_updated(state, summary.clone());
    Ok(summary)
}

fn spin_refusal(team_id: &str, phase: &AssignmentPhase) -> ServiceError {
    let message = match phase {
        AssignmentPhase::Registered => format!("team {team_id} must check in before spinning"),
        AssignmentPhase::Spinning => format!("a spin for team {team_id} is already in progress"),
        AssignmentPhase::Assigned { label } => {
            format!("team {team_id} is already assigned to `{label}`; reset it first")
        }
        other => format!("team {team_id} cannot spin while {other:?}"),
    };
    ServiceError::InvalidState(message)
}

fn desk_entry<'a>(
    state: &'a SharedState,
    team_id: &str,
) -> Result<dashmap::mapref::one::RefMut<'a, String, DeskEntry>, ServiceError> {
    state
        .desk()
        .get_mut(team_id)
        .ok_or_else(|| ServiceError::NotFound(format!("team {team_id}")))
}

fn transition(
    state: &SharedState,
    team_id: &str,
    event: AssignmentEvent,
) -> Result<TeamSummary, ServiceError> {
    let mut entry = desk_entry(state, team_id)?;
    entry.machine.apply(event)?;
    Ok(TeamSummary::from(&*entry))
}

/// Make sure the desk knows `team_id`, loading the registration list when it does not.
async fn ensure_entry(state: &SharedState, team_id: &str) -> Result<(), ServiceError> {
    if state.desk().contains_key(team_id) {
        return Ok(());
    }
    refresh(state).await?;
    if state.desk().contains_key(team_id) {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!("team {team_id}")))
    }
}

/// Merge the system of record and the overlay into the desk view.
///
/// Returns registration ids in sheet order. Local entries keep their lifecycle;
/// only teams the desk still sees as registered catch up with the stores.
async fn refresh(state: &SharedState) -> Result<Vec<String>, ServiceError> {
    let registrations = state.registrations();
    let records = state.bounded(registrations.list_registrations()).await?;
    let overlays = load_overlays(state).await;

    let mut order = Vec::with_capacity(records.len());
    for record in records {
        let id = record.registration_id.clone();
        let overlay = overlays.get(&id).cloned().unwrap_or_default();
        let checked_in = record.sheet_checked_in() || overlay.checked_in;

        match state.desk().entry(id.clone()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.machine.absorb(checked_in, overlay.domain());
                entry.check_in_time = entry.check_in_time.or(overlay.check_in_time);
                entry.record = record;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(DeskEntry {
                    machine: AssignmentMachine::restore(checked_in, overlay.domain()),
                    check_in_time: overlay.check_in_time,
                    record,
                });
            }
        }
        order.push(id);
    }

    Ok(order)
}

/// Read every team overlay, skipping (and logging) records that do not decode.
async fn load_overlays(state: &SharedState) -> HashMap<String, TeamOverlayEntity> {
    let realtime = state.realtime();
    let raw = match state.bounded(realtime.read(REGISTRATIONS_PATH)).await {
        Ok(raw) => raw,
        Err(err) => {
            warn!(error = %err, "overlay unavailable; using the system of record only");
            return HashMap::new();
        }
    };

    let Some(Value::Object(entries)) = raw else {
        return HashMap::new();
    };

    entries
        .into_iter()
        .filter_map(|(id, value)| {
            match decode::<TeamOverlayEntity>(&team_path(&id), value) {
                Ok(overlay) => Some((id, overlay)),
                Err(err) => {
                    warn!(team = %id, error = %err, "skipping malformed overlay record");
                    None
                }
            }
        })
        .collect()
}

/// Run one store write on its own task under the persistence timeout.
fn spawn_write(
    state: &SharedState,
    team_id: &str,
    target: &'static str,
    action: &'static str,
    write: BoxFuture<'static, StorageResult<()>>,
) -> JoinHandle<SyncReport> {
    let state = state.clone();
    let team_id = team_id.to_string();
    tokio::spawn(async move {
        let result = state.bounded(write).await;
        report(&state, &team_id, target, action, result)
    })
}

async fn awaited(write: JoinHandle<SyncReport>, action: &str) -> SyncReport {
    write.await.unwrap_or_else(|err| SyncReport {
        target: TARGET_REALTIME.into(),
        action: action.into(),
        ok: false,
        error: Some(format!("write task failed: {err}")),
    })
}

fn report(
    state: &SharedState,
    team_id: &str,
    target: &str,
    action: &str,
    result: Result<(), ServiceError>,
) -> SyncReport {
    match result {
        Ok(()) => SyncReport {
            target: target.to_string(),
            action: action.to_string(),
            ok: true,
            error: None,
        },
        Err(err) => {
            let message = err.to_string();
            warn!(
                team = team_id,
                sync_target = target,
                action,
                error = %message,
                "store write failed"
            );
            sse_events::broadcast_sync_failed(
                state,
                &SyncFailedEvent {
                    team_id: team_id.to_string(),
                    target: target.to_string(),
                    action: action.to_string(),
                    message: message.clone(),
                },
            );
            SyncReport {
                target: target.to_string(),
                action: action.to_string(),
                ok: false,
                error: Some(message),
            }
        }
    }
}

fn format_timestamp(now_ms: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(now_ms) * 1_000_000)
        .ok()
        .and_then(|at| at.format(&Rfc3339).ok())
        .unwrap_or_else(|| now_ms.to_string())
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use serde_json::json;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::RegistrationRecord,
            realtime_store::{MemoryRealtimeStore, RealtimeStore, read_typed},
            registration_store::MemoryRegistrationStore,
        },
        services::auth_service::test_operator,
        state::{AppState, Stores, clock::ManualClock, wheel::SPIN_DURATION},
    };

    const T0: i64 = 1_700_000_000_000;

    struct Desk {
        state: SharedState,
        sheet: MemoryRegistrationStore,
        realtime: MemoryRealtimeStore,
        operator: Operator,
    }

    fn row(id: &str, team: &str, leader: &str, status: &str) -> RegistrationRecord {
        serde_json::from_value(json!({
            "Registration ID": id,
            "Team Name": team,
            "Leader Name": leader,
            "Status": status
        }))
        .unwrap()
    }

    fn desk() -> Desk {
        let sheet = MemoryRegistrationStore::with_records([
            row("HTF-100001", "Null Pointers", "Asha", "Verified"),
            row("HTF-100002", "Segfault Society", "Ravi", "Verified"),
            row("HTF-100003", "Byte Me", "Meera", "Checked In"),
        ]);
        let realtime = MemoryRealtimeStore::new();
        let state = AppState::with_clock(
            AppConfig::default(),
            Stores {
                registrations: Arc::new(sheet.clone()),
                realtime: Arc::new(realtime.clone()),
            },
            Arc::new(ManualClock::new(T0)),
        );
        Desk {
            state,
            sheet,
            realtime,
            operator: test_operator("organizer@college.edu"),
        }
    }

    async fn overlay(realtime: &MemoryRealtimeStore, id: &str) -> Option<TeamOverlayEntity> {
        read_typed(realtime, &team_path(id)).await.unwrap()
    }

    async fn spin_and_confirm(desk: &Desk, id: &str) -> String {
        let (_, outcome) = request_spin(&desk.state, &desk.operator, id).await.unwrap();
        let receipt = confirm_assignment(&desk.state, &desk.operator, id, &outcome.label)
            .await
            .unwrap();
        receipt.ticket.settle().await;
        outcome.label
    }

    #[tokio::test]
    async fn check_in_is_optimistic_then_persists_to_both_stores() {
        let desk = desk();
        let (team, ticket) = check_in(&desk.state, &desk.operator, "HTF-100001")
            .await
            .unwrap();
        assert!(team.checked_in);
        assert_eq!(team.status, STATUS_CHECKED_IN);
        assert_eq!(team.check_in_time, Some(T0));
        assert_eq!(ticket.len(), 2);

        let reports = ticket.settle().await;
        assert!(reports.iter().all(|report| report.ok), "{reports:?}");
        assert!(desk.sheet.record("HTF-100001").await.unwrap().sheet_checked_in());
        let overlay = overlay(&desk.realtime, "HTF-100001").await.unwrap();
        assert!(overlay.checked_in);
        assert_eq!(overlay.check_in_time, Some(T0));
    }

    #[tokio::test]
    async fn second_check_in_is_refused_without_writes() {
        let desk = desk();
        let (_, ticket) = check_in(&desk.state, &desk.operator, "HTF-100001")
            .await
            .unwrap();
        ticket.settle().await;
        let writes = desk.realtime.write_count();

        let err = check_in(&desk.state, &desk.operator, "HTF-100001")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(desk.realtime.write_count(), writes);
    }

    #[tokio::test]
    async fn sheet_status_alone_counts_as_checked_in() {
        let desk = desk();
        let err = check_in(&desk.state, &desk.operator, "HTF-100003")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn spin_before_check_in_is_refused_without_io() {
        let desk = desk();
        let err = request_spin(&desk.state, &desk.operator, "HTF-100002")
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::InvalidState(message) if message.contains("check in")));
        assert!(!desk.state.wheel().is_spinning());
        assert_eq!(desk.realtime.write_count(), 0);
    }

    #[tokio::test]
    async fn unknown_team_is_not_found() {
        let desk = desk();
        let err = check_in(&desk.state, &desk.operator, "HTF-999999")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn spin_keeps_result_pending_and_local() {
        let desk = desk();
        let writes = desk.realtime.write_count();

        let (team, outcome) = request_spin(&desk.state, &desk.operator, "HTF-100003")
            .await
            .unwrap();
        assert_eq!(team.pending_domain.as_deref(), Some(outcome.label.as_str()));
        assert_eq!(team.assigned_domain, None);
        assert_eq!(desk.realtime.write_count(), writes);
        assert!(
            desk.state.config().segments()[outcome.index].label == outcome.label
        );
    }

    #[tokio::test(start_paused = true)]
    async fn confirm_locks_domain_in_both_stores() {
        let desk = desk();
        let label = spin_and_confirm(&desk, "HTF-100003").await;

        let overlay = overlay(&desk.realtime, "HTF-100003").await.unwrap();
        assert_eq!(overlay.domain(), Some(label.as_str()));
        let record = desk.sheet.record("HTF-100003").await.unwrap();
        assert_eq!(record.assigned_domain.as_deref(), Some(label.as_str()));

        let err = request_spin(&desk.state, &desk.operator, "HTF-100003")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(message) if message.contains("reset")));
    }

    #[tokio::test(start_paused = true)]
    async fn confirm_requires_the_revealed_label() {
        let desk = desk();
        let (_, outcome) = request_spin(&desk.state, &desk.operator, "HTF-100003")
            .await
            .unwrap();
        let other = desk
            .state
            .config()
            .segments()
            .iter()
            .find(|segment| segment.label != outcome.label)
            .unwrap()
            .label
            .clone();

        let err = confirm_assignment(&desk.state, &desk.operator, "HTF-100003", &other)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(overlay(&desk.realtime, "HTF-100003").await, None);
    }

    #[tokio::test]
    async fn confirm_without_spin_is_refused() {
        let desk = desk();
        let err = confirm_assignment(&desk.state, &desk.operator, "HTF-100003", "AI in Finance")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn overlay_failure_is_reported_but_lock_stays() {
        let desk = desk();
        let mut operator_events = desk.state.operator_sse().subscribe();
        let (_, outcome) = request_spin(&desk.state, &desk.operator, "HTF-100003")
            .await
            .unwrap();

        desk.realtime.set_offline(true);
        let receipt = confirm_assignment(&desk.state, &desk.operator, "HTF-100003", &outcome.label)
            .await
            .unwrap();
        receipt.ticket.settle().await;

        assert!(!receipt.realtime.ok);
        assert_eq!(receipt.team.assigned_domain.as_deref(), Some(outcome.label.as_str()));
        let local = desk.state.desk().get("HTF-100003").unwrap().machine.clone();
        assert_eq!(local.assigned(), Some(outcome.label.as_str()));

        let mut failures = Vec::new();
        while let Ok(event) = operator_events.try_recv() {
            if event.event.as_deref() == Some("sync.failed") {
                failures.push(event.data);
            }
        }
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("assignDomain"));
    }

    #[tokio::test]
    async fn sheet_outage_keeps_optimistic_check_in() {
        let desk = desk();
        list_teams(&desk.state, &desk.operator, None).await.unwrap();
        desk.sheet.set_offline(true);

        let (team, ticket) = check_in(&desk.state, &desk.operator, "HTF-100002")
            .await
            .unwrap();
        let reports = ticket.settle().await;

        assert!(team.checked_in);
        let failed: Vec<_> = reports.iter().filter(|report| !report.ok).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].target, TARGET_REGISTRATIONS);
        assert!(overlay(&desk.realtime, "HTF-100002").await.unwrap().checked_in);

        let teams = list_teams(&desk.state, &desk.operator, Some("segfault"))
            .await
            .unwrap();
        assert_eq!(teams.len(), 1);
        assert!(teams[0].checked_in);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_overlay_times_out_but_check_in_holds() {
        let desk = desk();
        let mut operator_events = desk.state.operator_sse().subscribe();
        desk.realtime.set_stalled(true);

        let (team, ticket) = check_in(&desk.state, &desk.operator, "HTF-100001")
            .await
            .unwrap();
        assert!(team.checked_in);

        let reports = ticket.settle().await;
        let realtime = reports
            .iter()
            .find(|report| report.target == TARGET_REALTIME)
            .unwrap();
        assert!(!realtime.ok);
        assert_eq!(
            realtime.error.as_deref(),
            Some(ServiceError::Timeout.to_string().as_str())
        );
        assert!(
            reports
                .iter()
                .any(|report| report.target == TARGET_REGISTRATIONS && report.ok)
        );

        let local = desk.state.desk().get("HTF-100001").unwrap().machine.clone();
        assert_eq!(local.phase(), &AssignmentPhase::CheckedIn);

        let mut failures = Vec::new();
        while let Ok(event) = operator_events.try_recv() {
            if event.event.as_deref() == Some("sync.failed") {
                failures.push(event.data);
            }
        }
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("checkIn"));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_needs_confirmation_then_allows_respin() {
        let desk = desk();
        spin_and_confirm(&desk, "HTF-100003").await;

        let err = reset_assignment(&desk.state, &desk.operator, "HTF-100003", false)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let receipt = reset_assignment(&desk.state, &desk.operator, "HTF-100003", true)
            .await
            .unwrap();
        assert!(receipt.realtime.ok);
        receipt.ticket.settle().await;
        assert_eq!(receipt.team.assigned_domain, None);
        let overlay = overlay(&desk.realtime, "HTF-100003").await.unwrap();
        assert!(overlay.checked_in);
        assert_eq!(overlay.domain(), None);
        assert_eq!(desk.sheet.record("HTF-100003").await.unwrap().assigned_domain, None);

        assert!(request_spin(&desk.state, &desk.operator, "HTF-100003").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn discard_returns_team_to_checked_in() {
        let desk = desk();
        request_spin(&desk.state, &desk.operator, "HTF-100003")
            .await
            .unwrap();
        let team = discard_pending(&desk.state, &desk.operator, "HTF-100003")
            .await
            .unwrap();
        assert!(team.checked_in);
        assert_eq!(team.pending_domain, None);

        assert!(discard_pending(&desk.state, &desk.operator, "HTF-100003").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn busy_wheel_refuses_a_second_team() {
        let desk = desk();
        check_in(&desk.state, &desk.operator, "HTF-100001")
            .await
            .unwrap()
            .1
            .settle()
            .await;

        let first = {
            let state = desk.state.clone();
            let operator = desk.operator.clone();
            tokio::spawn(async move { request_spin(&state, &operator, "HTF-100003").await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        let err = request_spin(&desk.state, &desk.operator, "HTF-100001")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        let team = desk.state.desk().get("HTF-100001").unwrap().machine.clone();
        assert_eq!(team.phase(), &AssignmentPhase::CheckedIn);

        assert!(first.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn refused_respin_keeps_the_pending_label() {
        let desk = desk();
        let (_, outcome) = request_spin(&desk.state, &desk.operator, "HTF-100003")
            .await
            .unwrap();
        check_in(&desk.state, &desk.operator, "HTF-100001")
            .await
            .unwrap()
            .1
            .settle()
            .await;

        let other = {
            let state = desk.state.clone();
            let operator = desk.operator.clone();
            tokio::spawn(async move { request_spin(&state, &operator, "HTF-100001").await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        let err = request_spin(&desk.state, &desk.operator, "HTF-100003")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        let team = desk.state.desk().get("HTF-100003").unwrap().machine.clone();
        assert_eq!(team.pending(), Some(outcome.label.as_str()));

        assert!(other.await.unwrap().is_ok());
        let receipt = confirm_assignment(&desk.state, &desk.operator, "HTF-100003", &outcome.label)
            .await
            .unwrap();
        assert!(receipt.realtime.ok);
    }

    #[tokio::test(start_paused = true)]
    async fn spin_start_events_hide_the_landing() {
        let desk = desk();
        let mut public = desk.state.public_sse().subscribe();
        let mut operator = desk.state.operator_sse().subscribe();
        let labels: Vec<String> = desk
            .state
            .config()
            .segments()
            .iter()
            .map(|segment| segment.label.clone())
            .collect();

        let spin = {
            let state = desk.state.clone();
            let operator = desk.operator.clone();
            tokio::spawn(async move { request_spin(&state, &operator, "HTF-100003").await })
        };
        tokio::time::sleep(SPIN_DURATION - Duration::from_millis(50)).await;

        let mut early = Vec::new();
        while let Ok(event) = public.try_recv() {
            early.push(event);
        }
        while let Ok(event) = operator.try_recv() {
            early.push(event);
        }

        let spin_events: Vec<_> = early
            .iter()
            .filter(|event| event.event.as_deref() == Some("wheel.spin"))
            .collect();
        assert_eq!(spin_events.len(), 2);
        for event in &spin_events {
            let payload: Value = serde_json::from_str(&event.data).unwrap();
            let mut keys: Vec<&str> = payload
                .as_object()
                .unwrap()
                .keys()
                .map(String::as_str)
                .collect();
            keys.sort_unstable();
            assert_eq!(keys, ["durationMs", "startDeg", "teamId"]);
        }
        for event in &early {
            assert_ne!(event.event.as_deref(), Some("domain.revealed"));
            assert!(
                labels.iter().all(|label| !event.data.contains(label.as_str())),
                "{event:?}"
            );
        }

        let (_, outcome) = spin.await.unwrap().unwrap();
        let revealed = std::iter::from_fn(|| public.try_recv().ok())
            .find(|event| event.event.as_deref() == Some("domain.revealed"))
            .unwrap();
        assert!(revealed.data.contains(&outcome.label));
    }

    #[tokio::test]
    async fn list_merges_overlay_and_filters() {
        let desk = desk();
        desk.realtime
            .write(
                &team_path("HTF-100002"),
                Some(json!({
                    "checkedIn": true,
                    "checkInTime": T0,
                    "assignedDomain": "AI in Finance"
                })),
            )
            .await
            .unwrap();
        desk.realtime
            .write(&team_path("HTF-100001"), Some(json!({ "checkedIn": "yes" })))
            .await
            .unwrap();

        let teams = list_teams(&desk.state, &desk.operator, None).await.unwrap();
        assert_eq!(teams.len(), 3);
        assert_eq!(teams[0].registration_id, "HTF-100001");
        assert!(!teams[0].checked_in);
        assert!(teams[1].checked_in);
        assert_eq!(teams[1].assigned_domain.as_deref(), Some("AI in Finance"));
        assert!(teams[2].checked_in);

        let by_leader = list_teams(&desk.state, &desk.operator, Some("MEERA"))
            .await
            .unwrap();
        assert_eq!(by_leader.len(), 1);
        assert_eq!(by_leader[0].team_name, "Byte Me");

        let by_id = list_teams(&desk.state, &desk.operator, Some("100001"))
            .await
            .unwrap();
        assert_eq!(by_id.len(), 1);
    }

    #[test]
    fn check_in_timestamp_is_rfc3339() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00Z");
    }
}
