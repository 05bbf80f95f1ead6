use std::time::Duration;

use futures::future::join;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dto::health::StoreHealth,
    services::{health_service, sse_events},
    state::SharedState,
};

const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(1_000);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Probe both stores forever and keep the shared degraded flag in sync.
///
/// While any store is failing the probe is retried with exponential backoff;
/// once everything answers again the regular poll interval resumes.
pub async fn run(state: SharedState) {
    let mut retry_delay = INITIAL_RETRY_DELAY;

    loop {
        let probes = probe(&state).await;
        let failing: Vec<&StoreHealth> = probes.iter().filter(|probe| !probe.ok).collect();

        if failing.is_empty() {
            if state.update_degraded(false) {
                info!("stores healthy again; leaving degraded mode");
                sse_events::broadcast_system_status(&state, false);
            }
            retry_delay = INITIAL_RETRY_DELAY;
            sleep(HEALTH_POLL_INTERVAL).await;
            continue;
        }

        for probe in &failing {
            warn!(
                store = %probe.store,
                error = probe.error.as_deref().unwrap_or_default(),
                "store health check failed"
            );
        }
        if state.update_degraded(true) {
            warn!("entering degraded mode");
            sse_events::broadcast_system_status(&state, true);
        }

        sleep(retry_delay).await;
        retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
    }
}

/// Probe both stores concurrently under the persistence timeout.
pub async fn probe(state: &SharedState) -> Vec<StoreHealth> {
    let registrations = state.registrations();
    let realtime = state.realtime();
    let (sheet, overlay) = join(
        state.bounded(registrations.health_check()),
        state.bounded(realtime.health_check()),
    )
    .await;

    vec![
        health_service::store_health("registrations", sheet),
        health_service::store_health("realtime", overlay),
    ]
}
