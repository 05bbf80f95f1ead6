use axum::Router;

use crate::state::SharedState;

pub mod desk;
pub mod docs;
pub mod health;
pub mod operator;
pub mod registrations;
pub mod sse;
pub mod timer;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(timer::router(state.clone()))
        .merge(desk::router(state.clone()))
        .merge(registrations::router(state.clone()))
        .merge(sse::router(state.clone()));

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
