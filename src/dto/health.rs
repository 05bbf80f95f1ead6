use serde::Serialize;
use utoipa::ToSchema;

/// Reachability of one external store.
#[derive(Debug, Serialize, ToSchema)]
pub struct StoreHealth {
    /// `registrations` or `realtime`.
    pub store: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    pub stores: Vec<StoreHealth>,
}

impl HealthResponse {
    /// Build the response from individual store probes.
    pub fn from_probes(stores: Vec<StoreHealth>) -> Self {
        let status = if stores.iter().all(|store| store.ok) {
            "ok"
        } else {
            "degraded"
        };
        Self {
            status: status.to_string(),
            stores,
        }
    }
}
