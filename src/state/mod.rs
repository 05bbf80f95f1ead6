pub mod assignment;
pub mod clock;
pub mod cues;
pub mod spinner;
mod sse;
pub mod timer;
pub mod wheel;

use std::{future::Future, sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::{sync::watch, time::timeout};

use crate::{
    config::AppConfig,
    dao::{
        models::RegistrationRecord,
        realtime_store::{MemoryRealtimeStore, RealtimeStore},
        registration_store::{MemoryRegistrationStore, RegistrationStore},
        storage::StorageResult,
    },
    error::ServiceError,
    state::{
        assignment::AssignmentMachine,
        clock::{Clock, SystemClock},
        spinner::Wheel,
        timer::TimerState,
    },
};

pub use self::sse::SseHub;
use self::sse::SseState;

pub type SharedState = Arc<AppState>;

/// Handles on the two external stores.
#[derive(Clone)]
pub struct Stores {
    /// Durable system of record (registration sheet).
    pub registrations: Arc<dyn RegistrationStore>,
    /// Realtime overlay holding the timer and per-team desk records.
    pub realtime: Arc<dyn RealtimeStore>,
}

impl Stores {
    /// Process-local stores, used when no remote endpoint is configured.
    pub fn in_memory() -> Self {
        Self {
            registrations: Arc::new(MemoryRegistrationStore::new()),
            realtime: Arc::new(MemoryRealtimeStore::new()),
        }
    }
}

/// What this desk currently believes about one team.
///
/// Updated optimistically before the stores confirm anything.
#[derive(Debug, Clone)]
pub struct DeskEntry {
    /// Last known system-of-record row.
    pub record: RegistrationRecord,
    /// Check-in and assignment lifecycle.
    pub machine: AssignmentMachine,
    /// Check-in time in milliseconds since the epoch.
    pub check_in_time: Option<i64>,
}

/// Central application state shared by every handler and background task.
pub struct AppState {
    config: AppConfig,
    stores: Stores,
    clock: Arc<dyn Clock>,
    sse: SseState,
    wheel: Wheel,
    desk: DashMap<String, DeskEntry>,
    timer: watch::Sender<Option<TimerState>>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, stores: Stores) -> SharedState {
        Self::with_clock(config, stores, Arc::new(SystemClock))
    }

    /// Same as [`AppState::new`] with an explicit time source.
    pub fn with_clock(config: AppConfig, stores: Stores, clock: Arc<dyn Clock>) -> SharedState {
        let (timer, _rx) = watch::channel(None);
        let (degraded, _rx) = watch::channel(false);
        Arc::new(Self {
            config,
            stores,
            clock,
            sse: SseState::new(64, 64),
            wheel: Wheel::new(),
            desk: DashMap::new(),
            timer,
            degraded,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registrations(&self) -> Arc<dyn RegistrationStore> {
        self.stores.registrations.clone()
    }

    pub fn realtime(&self) -> Arc<dyn RealtimeStore> {
        self.stores.realtime.clone()
    }

    /// Milliseconds since the epoch according to the configured clock.
    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        self.sse.public()
    }

    /// Broadcast hub used for the operator SSE stream.
    pub fn operator_sse(&self) -> &SseHub {
        self.sse.operator()
    }

    /// The single physical wheel of the desk.
    pub fn wheel(&self) -> &Wheel {
        &self.wheel
    }

    /// Desk-local team view keyed by registration id.
    pub fn desk(&self) -> &DashMap<String, DeskEntry> {
        &self.desk
    }

    /// Last timer state pushed by the realtime store.
    pub fn timer_snapshot(&self) -> Option<TimerState> {
        self.timer.borrow().clone()
    }

    /// Subscribe to timer mirror updates.
    pub fn timer_watcher(&self) -> watch::Receiver<Option<TimerState>> {
        self.timer.subscribe()
    }

    /// Replace the local timer mirror. Only the viewer loop calls this.
    pub fn publish_timer(&self, timer: Option<TimerState>) {
        self.timer.send_replace(timer);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, returning whether it changed.
    pub fn update_degraded(&self, value: bool) -> bool {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }

    /// Run a store call under the configured persistence timeout.
    pub async fn bounded<T, F>(&self, operation: F) -> Result<T, ServiceError>
    where
        F: Future<Output = StorageResult<T>>,
    {
        bounded(self.config.persist_timeout(), operation).await
    }
}

/// Run a store call under `limit`, mapping expiry to [`ServiceError::Timeout`].
pub async fn bounded<T, F>(limit: Duration, operation: F) -> Result<T, ServiceError>
where
    F: Future<Output = StorageResult<T>>,
{
    match timeout(limit, operation).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(ServiceError::Timeout),
    }
}
