use std::convert::Infallible;

use axum::{
    Extension, Router,
    extract::State,
    middleware,
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{
    routes::operator::require_operator,
    services::{
        auth_service::Operator,
        sse_service::{self, StreamKind},
    },
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/public",
    tag = "sse",
    responses((status = 200, description = "Public SSE stream", content_type = "text/event-stream", body = String))
)]
/// Timer ticks, cues, wheel spins and confirmed assignments for every display.
pub async fn public_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = sse_service::subscribe_public(&state);
    info!("new public SSE connection");
    let kind = StreamKind::Public;
    let first = sse_service::handshake(&state, &kind);
    sse_service::to_sse_stream(first, receiver, kind)
}

#[utoipa::path(
    get,
    path = "/sse/operator",
    tag = "sse",
    params(("X-Operator-Email" = String, Header, description = "Allow-listed operator email")),
    responses(
        (status = 200, description = "Operator SSE stream", content_type = "text/event-stream", body = String),
        (status = 401, description = "Not an operator")
    )
)]
/// Everything on the public stream plus `sync.failed` and registration changes.
pub async fn operator_stream(
    State(state): State<SharedState>,
    Extension(operator): Extension<Operator>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = sse_service::subscribe_operator(&state, &operator);
    let kind = StreamKind::Operator(operator.email().to_string());
    let first = sse_service::handshake(&state, &kind);
    sse_service::to_sse_stream(first, receiver, kind)
}

/// Configure the SSE endpoints.
pub fn router(state: SharedState) -> Router<SharedState> {
    let operator = Router::new()
        .route("/sse/operator", get(operator_stream))
        .route_layer(middleware::from_fn_with_state(state, require_operator));

    Router::<SharedState>::new()
        .route("/sse/public", get(public_stream))
        .merge(operator)
}
