use tracing::info;

use crate::{
    dao::models::NewRegistrationEntity,
    dto::registration::RegistrationSummary,
    error::ServiceError,
    services::{auth_service::Operator, sse_events},
    state::SharedState,
};

/// Forward a public registration to the system of record and return the generated id.
pub async fn register(
    state: &SharedState,
    registration: NewRegistrationEntity,
) -> Result<String, ServiceError> {
    if state.is_degraded() {
        return Err(ServiceError::Degraded);
    }

    let team_name = registration.team_name.clone();
    let registrations = state.registrations();
    let id = state.bounded(registrations.register(registration)).await?;

    info!(registration = %id, team = %team_name, "team registered");
    sse_events::broadcast_registration_changed(state, &id, None);
    Ok(id)
}

/// Every registration row, in sheet order.
pub async fn list_registrations(
    state: &SharedState,
    operator: &Operator,
) -> Result<Vec<RegistrationSummary>, ServiceError> {
    let registrations = state.registrations();
    let records = state.bounded(registrations.list_registrations()).await?;
    info!(operator = %operator.email(), count = records.len(), "registrations listed");
    Ok(records.into_iter().map(RegistrationSummary::from).collect())
}

/// Change the verification status of a registration.
///
/// The desk's local copy of the row follows once the store accepted the change.
pub async fn update_status(
    state: &SharedState,
    operator: &Operator,
    registration_id: &str,
    status: &str,
) -> Result<(), ServiceError> {
    let status = status.trim();
    if status.is_empty() {
        return Err(ServiceError::InvalidInput("status must not be empty".into()));
    }

    let registrations = state.registrations();
    state
        .bounded(registrations.update_status(registration_id.to_string(), status.to_string()))
        .await?;

    if let Some(mut entry) = state.desk().get_mut(registration_id) {
        entry.record.status = status.to_string();
    }

    info!(
        operator = %operator.email(),
        registration = registration_id,
        status,
        "registration status updated"
    );
    sse_events::broadcast_registration_changed(state, registration_id, Some(status));
    Ok(())
}

/// Ask the system of record to mail the participation certificate.
pub async fn send_certificate(
    state: &SharedState,
    operator: &Operator,
    registration_id: &str,
) -> Result<(), ServiceError> {
    let registrations = state.registrations();
    state
        .bounded(registrations.send_certificate(registration_id.to_string()))
        .await?;

    info!(
        operator = %operator.email(),
        registration = registration_id,
        "certificate requested"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{STATUS_PENDING, STATUS_VERIFIED},
            realtime_store::MemoryRealtimeStore,
            registration_store::MemoryRegistrationStore,
            storage::StorageError,
        },
        services::auth_service::test_operator,
        state::{AppState, Stores},
    };

    fn entity(team: &str) -> NewRegistrationEntity {
        NewRegistrationEntity {
            team_name: team.into(),
            leader_name: "Asha".into(),
            leader_phone: "9876543210".into(),
            leader_email: "asha@example.com".into(),
            leader_semester: "5".into(),
            leader_branch: "CSE".into(),
            leader_usn: "1XX21CS001".into(),
            member2_name: "Ravi".into(),
            member2_phone: "9876501234".into(),
            member2_email: "ravi@example.com".into(),
            member2_semester: "5".into(),
            member2_branch: "ISE".into(),
            member2_usn: "1XX21IS002".into(),
            image_base64: None,
            image_mime_type: None,
            status: None,
        }
    }

    fn setup() -> (SharedState, MemoryRegistrationStore) {
        let sheet = MemoryRegistrationStore::new();
        let state = AppState::new(
            AppConfig::default(),
            Stores {
                registrations: Arc::new(sheet.clone()),
                realtime: Arc::new(MemoryRealtimeStore::new()),
            },
        );
        (state, sheet)
    }

    #[tokio::test]
    async fn registration_gets_generated_identifier() {
        let (state, sheet) = setup();
        let mut events = state.operator_sse().subscribe();

        let id = register(&state, entity("Null Pointers")).await.unwrap();

        assert!(id.starts_with("HTF-"));
        assert_eq!(id.len(), 10);
        let record = sheet.record(&id).await.unwrap();
        assert_eq!(record.status, STATUS_PENDING);
        assert_eq!(record.payment_screenshot_url, "No File Uploaded");

        let event = events.try_recv().unwrap();
        assert_eq!(event.event.as_deref(), Some("registration.changed"));
        assert!(event.data.contains(&id));
    }

    #[tokio::test]
    async fn degraded_mode_refuses_new_registrations() {
        let (state, _sheet) = setup();
        state.update_degraded(true);
        assert!(matches!(
            register(&state, entity("Late")).await,
            Err(ServiceError::Degraded)
        ));
    }

    #[tokio::test]
    async fn status_update_reaches_store_and_listing() {
        let (state, _sheet) = setup();
        let operator = test_operator("organizer@college.edu");
        let id = register(&state, entity("Byte Me")).await.unwrap();

        update_status(&state, &operator, &id, STATUS_VERIFIED)
            .await
            .unwrap();

        let rows = list_registrations(&state, &operator).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, STATUS_VERIFIED);
    }

    #[tokio::test]
    async fn unknown_identifier_is_a_store_rejection() {
        let (state, _sheet) = setup();
        let operator = test_operator("organizer@college.edu");

        let err = send_certificate(&state, &operator, "HTF-000000")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Unavailable(StorageError::Rejected { .. })
        ));

        let err = update_status(&state, &operator, "HTF-000000", "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn outage_surfaces_as_unavailable() {
        let (state, sheet) = setup();
        sheet.set_offline(true);
        let operator = test_operator("organizer@college.edu");

        assert!(matches!(
            list_registrations(&state, &operator).await,
            Err(ServiceError::Unavailable(StorageError::Unavailable { .. }))
        ));
    }
}
