use crate::{
    dto::health::{HealthResponse, StoreHealth},
    error::ServiceError,
    services::storage_supervisor,
    state::SharedState,
};

/// Probe both stores and summarise the result.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    HealthResponse::from_probes(storage_supervisor::probe(state).await)
}

pub(crate) fn store_health(store: &str, result: Result<(), ServiceError>) -> StoreHealth {
    StoreHealth {
        store: store.to_string(),
        ok: result.is_ok(),
        error: result.err().map(|err| err.to_string()),
    }
}
