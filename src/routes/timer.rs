use axum::{
    Extension, Json, Router,
    extract::State,
    middleware,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::timer::{ConfigureTimerRequest, SetStatusRequest, TimerActionResponse, TimerView},
    error::AppError,
    routes::operator::require_operator,
    services::{auth_service::Operator, timer_service},
    state::SharedState,
};

/// Public timer snapshot plus the operator controls.
pub fn router(state: SharedState) -> Router<SharedState> {
    let controls = Router::new()
        .route("/operator/timer/configure", post(configure))
        .route("/operator/timer/start", post(start))
        .route("/operator/timer/pause", post(pause))
        .route("/operator/timer/toggle", post(toggle))
        .route("/operator/timer/reset", post(reset))
        .route("/operator/timer/status", post(set_status))
        .route("/operator/timer/lunch", post(lunch))
        .route("/operator/timer/hold", post(hold))
        .route_layer(middleware::from_fn_with_state(state, require_operator));

    Router::new().route("/timer", get(current)).merge(controls)
}

/// Current display value, digits and banner.
#[utoipa::path(
    get,
    path = "/timer",
    tag = "timer",
    responses(
        (status = 200, description = "Timer as displays render it", body = TimerView),
        (status = 503, description = "Realtime store unreachable and nothing mirrored yet")
    )
)]
pub async fn current(State(state): State<SharedState>) -> Result<Json<TimerView>, AppError> {
    Ok(Json(timer_service::current(&state).await?))
}

/// Set mode and duration; the timer is left stopped.
#[utoipa::path(
    post,
    path = "/operator/timer/configure",
    tag = "timer",
    params(("X-Operator-Email" = String, Header, description = "Allow-listed operator email")),
    request_body = ConfigureTimerRequest,
    responses(
        (status = 200, description = "Timer configured", body = TimerActionResponse),
        (status = 400, description = "Duration out of range"),
        (status = 401, description = "Not an operator")
    )
)]
pub async fn configure(
    State(state): State<SharedState>,
    Extension(operator): Extension<Operator>,
    Valid(Json(payload)): Valid<Json<ConfigureTimerRequest>>,
) -> Result<Json<TimerActionResponse>, AppError> {
    Ok(Json(
        timer_service::configure(&state, &operator, payload.mode, payload.duration_seconds)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/operator/timer/start",
    tag = "timer",
    params(("X-Operator-Email" = String, Header, description = "Allow-listed operator email")),
    responses((status = 200, description = "Timer running", body = TimerActionResponse))
)]
pub async fn start(
    State(state): State<SharedState>,
    Extension(operator): Extension<Operator>,
) -> Result<Json<TimerActionResponse>, AppError> {
    Ok(Json(timer_service::start(&state, &operator).await?))
}

#[utoipa::path(
    post,
    path = "/operator/timer/pause",
    tag = "timer",
    params(("X-Operator-Email" = String, Header, description = "Allow-listed operator email")),
    responses((status = 200, description = "Timer paused", body = TimerActionResponse))
)]
pub async fn pause(
    State(state): State<SharedState>,
    Extension(operator): Extension<Operator>,
) -> Result<Json<TimerActionResponse>, AppError> {
    Ok(Json(timer_service::pause(&state, &operator).await?))
}

/// Start when paused, pause when running.
#[utoipa::path(
    post,
    path = "/operator/timer/toggle",
    tag = "timer",
    params(("X-Operator-Email" = String, Header, description = "Allow-listed operator email")),
    responses((status = 200, description = "Timer toggled", body = TimerActionResponse))
)]
pub async fn toggle(
    State(state): State<SharedState>,
    Extension(operator): Extension<Operator>,
) -> Result<Json<TimerActionResponse>, AppError> {
    Ok(Json(timer_service::toggle(&state, &operator).await?))
}

#[utoipa::path(
    post,
    path = "/operator/timer/reset",
    tag = "timer",
    params(("X-Operator-Email" = String, Header, description = "Allow-listed operator email")),
    responses((status = 200, description = "Timer back to its configured duration", body = TimerActionResponse))
)]
pub async fn reset(
    State(state): State<SharedState>,
    Extension(operator): Extension<Operator>,
) -> Result<Json<TimerActionResponse>, AppError> {
    Ok(Json(timer_service::reset(&state, &operator).await?))
}

/// Replace the banner without touching the clock.
#[utoipa::path(
    post,
    path = "/operator/timer/status",
    tag = "timer",
    params(("X-Operator-Email" = String, Header, description = "Allow-listed operator email")),
    request_body = SetStatusRequest,
    responses((status = 200, description = "Banner updated", body = TimerActionResponse))
)]
pub async fn set_status(
    State(state): State<SharedState>,
    Extension(operator): Extension<Operator>,
    Valid(Json(payload)): Valid<Json<SetStatusRequest>>,
) -> Result<Json<TimerActionResponse>, AppError> {
    Ok(Json(
        timer_service::set_status(&state, &operator, payload.status).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/operator/timer/lunch",
    tag = "timer",
    params(("X-Operator-Email" = String, Header, description = "Allow-listed operator email")),
    responses((status = 200, description = "Lunch banner shown", body = TimerActionResponse))
)]
pub async fn lunch(
    State(state): State<SharedState>,
    Extension(operator): Extension<Operator>,
) -> Result<Json<TimerActionResponse>, AppError> {
    Ok(Json(timer_service::lunch(&state, &operator).await?))
}

/// Pause and show the paused banner in one write.
#[utoipa::path(
    post,
    path = "/operator/timer/hold",
    tag = "timer",
    params(("X-Operator-Email" = String, Header, description = "Allow-listed operator email")),
    responses((status = 200, description = "Timer held", body = TimerActionResponse))
)]
pub async fn hold(
    State(state): State<SharedState>,
    Extension(operator): Extension<Operator>,
) -> Result<Json<TimerActionResponse>, AppError> {
    Ok(Json(timer_service::hold(&state, &operator).await?))
}
