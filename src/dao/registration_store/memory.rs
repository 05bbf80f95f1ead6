use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use rand::Rng;
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::sync::RwLock;

use crate::dao::{
    models::{NewRegistrationEntity, RegistrationRecord, STATUS_CHECKED_IN, STATUS_PENDING},
    registration_store::RegistrationStore,
    storage::{StorageError, StorageResult},
};

#[derive(Debug, Error)]
#[error("in-memory registration store is offline")]
struct Offline;

/// Process-local system of record used in development and tests.
///
/// Mirrors the behaviour of the sheet web app closely enough for the desk flow:
/// generated `HTF-` identifiers, appended check-in and domain columns, and
/// "ID not found" rejections.
#[derive(Clone, Default)]
pub struct MemoryRegistrationStore {
    rows: Arc<RwLock<IndexMap<String, RegistrationRecord>>>,
    offline: Arc<AtomicBool>,
}

impl MemoryRegistrationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given rows.
    pub fn with_records(records: impl IntoIterator<Item = RegistrationRecord>) -> Self {
        let rows = records
            .into_iter()
            .map(|record| (record.registration_id.clone(), record))
            .collect();
        Self {
            rows: Arc::new(RwLock::new(rows)),
            offline: Arc::default(),
        }
    }

    /// Simulate a network outage: every call fails until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Inspect a single row.
    pub async fn record(&self, id: &str) -> Option<RegistrationRecord> {
        self.rows.read().await.get(id).cloned()
    }

    fn ensure_online(&self) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StorageError::unavailable(
                "memory registration store".into(),
                Offline,
            ))
        } else {
            Ok(())
        }
    }

    async fn update_row(
        &self,
        id: &str,
        apply: impl FnOnce(&mut RegistrationRecord),
    ) -> StorageResult<()> {
        self.ensure_online()?;
        let mut rows = self.rows.write().await;
        let row = rows
            .get_mut(id)
            .ok_or_else(|| StorageError::rejected(format!("ID not found: {id}")))?;
        apply(row);
        Ok(())
    }
}

impl RegistrationStore for MemoryRegistrationStore {
    fn register(
        &self,
        registration: NewRegistrationEntity,
    ) -> BoxFuture<'static, StorageResult<String>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            let mut rows = store.rows.write().await;
            let id = loop {
                let candidate = format!("HTF-{}", rand::rng().random_range(100_000..=999_999));
                if !rows.contains_key(&candidate) {
                    break candidate;
                }
            };

            let payment_screenshot_url = if registration.image_base64.is_some() {
                format!("memory://payments/{id}")
            } else {
                "No File Uploaded".to_string()
            };

            let record = RegistrationRecord {
                registration_id: id.clone(),
                timestamp: OffsetDateTime::now_utc()
                    .format(&Rfc3339)
                    .unwrap_or_default(),
                team_name: registration.team_name,
                leader_name: registration.leader_name,
                leader_email: registration.leader_email,
                leader_phone: registration.leader_phone,
                leader_branch: registration.leader_branch,
                leader_usn: registration.leader_usn,
                leader_semester: registration.leader_semester,
                member2_name: registration.member2_name,
                member2_email: registration.member2_email,
                member2_phone: registration.member2_phone,
                member2_branch: registration.member2_branch,
                member2_usn: registration.member2_usn,
                member2_semester: registration.member2_semester,
                payment_screenshot_url,
                status: registration
                    .status
                    .unwrap_or_else(|| STATUS_PENDING.to_string()),
                assigned_domain: None,
                event_check_in: None,
            };
            rows.insert(id.clone(), record);
            Ok(id)
        })
    }

    fn update_status(&self, id: String, status: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.update_row(&id, |row| row.status = status).await })
    }

    fn update_domain(&self, id: String, domain: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_row(&id, |row| {
                    row.assigned_domain = Some(domain).filter(|value| !value.is_empty());
                })
                .await
        })
    }

    fn event_check_in(
        &self,
        id: String,
        _timestamp: String,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_row(&id, |row| {
                    row.event_check_in = Some(STATUS_CHECKED_IN.to_string());
                    row.status = STATUS_CHECKED_IN.to_string();
                })
                .await
        })
    }

    fn send_certificate(&self, id: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.update_row(&id, |_| {}).await })
    }

    fn list_registrations(&self) -> BoxFuture<'static, StorageResult<Vec<RegistrationRecord>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            Ok(store.rows.read().await.values().cloned().collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_online() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_registration() -> NewRegistrationEntity {
        NewRegistrationEntity {
            team_name: "Segfault Society".into(),
            leader_name: "Asha".into(),
            leader_phone: "9000000001".into(),
            leader_email: "asha@example.com".into(),
            leader_semester: "5".into(),
            leader_branch: "CSE".into(),
            leader_usn: "2JH22CS001".into(),
            member2_name: "Ravi".into(),
            member2_phone: "9000000002".into(),
            member2_email: "ravi@example.com".into(),
            member2_semester: "5".into(),
            member2_branch: "CSE".into(),
            member2_usn: "2JH22CS002".into(),
            image_base64: Some("data:image/png;base64,AAAA".into()),
            image_mime_type: Some("image/png".into()),
            status: None,
        }
    }

    #[tokio::test]
    async fn register_generates_sheet_style_identifier() {
        let store = MemoryRegistrationStore::new();
        let id = store.register(sample_registration()).await.unwrap();

        assert!(id.starts_with("HTF-"));
        assert_eq!(id.len(), 10);
        let row = store.record(&id).await.unwrap();
        assert_eq!(row.status, STATUS_PENDING);
        assert_eq!(row.payment_screenshot_url, format!("memory://payments/{id}"));
    }

    #[tokio::test]
    async fn check_in_updates_status_and_column() {
        let store = MemoryRegistrationStore::new();
        let id = store.register(sample_registration()).await.unwrap();
        store
            .event_check_in(id.clone(), "now".into())
            .await
            .unwrap();

        let row = store.record(&id).await.unwrap();
        assert!(row.sheet_checked_in());
        assert_eq!(row.status, STATUS_CHECKED_IN);
    }

    #[tokio::test]
    async fn unknown_ids_are_rejected() {
        let store = MemoryRegistrationStore::new();
        let err = store
            .update_domain("HTF-000000".into(), "AI in Finance".into())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Rejected { .. }));
    }

    #[tokio::test]
    async fn offline_store_reports_unavailable() {
        let store = MemoryRegistrationStore::new();
        store.set_offline(true);
        let err = store.list_registrations().await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }));
    }
}
