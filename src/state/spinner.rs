use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::{
    sync::{oneshot, watch},
    time::{Instant, MissedTickBehavior, interval},
};
use tracing::debug;
use utoipa::ToSchema;

use crate::state::wheel::{SpinPlan, WheelSegment, draw_index};

/// Interval between two published rotation frames.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Result of a finished spin.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpinOutcome {
    pub index: usize,
    pub label: String,
    pub final_rotation_deg: f64,
}

/// Reasons a spin request is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpinError {
    #[error("the wheel has no segments")]
    NoSegments,
    #[error("a spin is already in progress")]
    AlreadySpinning,
    #[error("the spin animation stopped before revealing a result")]
    Interrupted,
}

/// What a display may know when a spin starts. The landing angle stays hidden
/// until the outcome resolves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinStarted {
    pub start_deg: f64,
    pub duration: Duration,
}

/// The physical wheel: one absolute rotation and at most one spin at a time.
///
/// Clones share the same wheel.
#[derive(Clone)]
pub struct Wheel {
    inner: Arc<WheelInner>,
}

struct WheelInner {
    rotation: watch::Sender<f64>,
    spinning: AtomicBool,
}

impl Default for Wheel {
    fn default() -> Self {
        Self::new()
    }
}

impl Wheel {
    /// Wheel at rest at rotation zero.
    pub fn new() -> Self {
        let (rotation, _rx) = watch::channel(0.0);
        Self {
            inner: Arc::new(WheelInner {
                rotation,
                spinning: AtomicBool::new(false),
            }),
        }
    }

    /// Current absolute rotation in degrees.
    pub fn rotation(&self) -> f64 {
        *self.inner.rotation.borrow()
    }

    /// Subscribe to rotation frames.
    pub fn rotation_watcher(&self) -> watch::Receiver<f64> {
        self.inner.rotation.subscribe()
    }

    pub fn is_spinning(&self) -> bool {
        self.inner.spinning.load(Ordering::SeqCst)
    }

    /// Spin to a uniformly drawn segment and resolve once the animation is over.
    ///
    /// The animation runs on its own task: dropping the returned future does not
    /// stop it, and the wheel stays busy until it lands.
    pub async fn spin(&self, segments: Vec<WheelSegment>) -> Result<SpinOutcome, SpinError> {
        let (_started, outcome) = self.start(segments)?;
        outcome.await.map_err(|_| SpinError::Interrupted)
    }

    /// Start a spin and hand back its announcement together with the pending outcome.
    pub fn start(
        &self,
        segments: Vec<WheelSegment>,
    ) -> Result<(SpinStarted, oneshot::Receiver<SpinOutcome>), SpinError> {
        if segments.is_empty() {
            return Err(SpinError::NoSegments);
        }
        if self
            .inner
            .spinning
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SpinError::AlreadySpinning);
        }

        let index = draw_index(segments.len(), &mut rand::rng());
        let plan = SpinPlan::new(self.rotation(), index, segments.len());
        let label = segments[index].label.clone();
        let (tx, rx) = oneshot::channel();

        debug!(segments = segments.len(), start_deg = plan.start_deg, "wheel spin started");
        tokio::spawn(animate(self.inner.clone(), plan, label, tx));

        let started = SpinStarted {
            start_deg: plan.start_deg,
            duration: plan.duration,
        };
        Ok((started, rx))
    }
}

async fn animate(
    inner: Arc<WheelInner>,
    plan: SpinPlan,
    label: String,
    done: oneshot::Sender<SpinOutcome>,
) {
    let started_at = Instant::now();
    let mut frames = interval(FRAME_INTERVAL);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        frames.tick().await;
        let elapsed = started_at.elapsed();
        inner.rotation.send_replace(plan.rotation_at(elapsed));
        if plan.is_finished(elapsed) {
            break;
        }
    }

    inner.spinning.store(false, Ordering::SeqCst);
    let _ = done.send(SpinOutcome {
        index: plan.index,
        label,
        final_rotation_deg: plan.target_deg,
    });
}
