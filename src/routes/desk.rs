use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::desk::{
        AssignmentResponse, CheckInResponse, ConfirmDomainRequest, ResetDomainRequest,
        SpinResponse, TeamQuery, TeamSummary,
    },
    error::AppError,
    routes::operator::require_operator,
    services::{auth_service::Operator, desk_service},
    state::SharedState,
};

/// Check-in desk endpoints. Operator only.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/operator/desk/teams", get(list_teams))
        .route("/operator/desk/teams/{id}/check-in", post(check_in))
        .route("/operator/desk/teams/{id}/spin", post(spin))
        .route("/operator/desk/teams/{id}/confirm", post(confirm))
        .route("/operator/desk/teams/{id}/discard", post(discard))
        .route("/operator/desk/teams/{id}/reset", post(reset))
        .route_layer(middleware::from_fn_with_state(state, require_operator))
}

/// Registrations merged with the overlay, optionally searched.
#[utoipa::path(
    get,
    path = "/operator/desk/teams",
    tag = "desk",
    params(
        ("X-Operator-Email" = String, Header, description = "Allow-listed operator email"),
        TeamQuery
    ),
    responses(
        (status = 200, description = "Desk view of every team", body = [TeamSummary]),
        (status = 503, description = "Registration list unavailable")
    )
)]
pub async fn list_teams(
    State(state): State<SharedState>,
    Extension(operator): Extension<Operator>,
    Query(query): Query<TeamQuery>,
) -> Result<Json<Vec<TeamSummary>>, AppError> {
    Ok(Json(
        desk_service::list_teams(&state, &operator, query.q.as_deref()).await?,
    ))
}

/// Check a team in. Answers before the stores confirm; failures arrive as `sync.failed`.
#[utoipa::path(
    post,
    path = "/operator/desk/teams/{id}/check-in",
    tag = "desk",
    params(
        ("X-Operator-Email" = String, Header, description = "Allow-listed operator email"),
        ("id" = String, Path, description = "Registration id")
    ),
    responses(
        (status = 202, description = "Checked in locally; persisting", body = CheckInResponse),
        (status = 404, description = "Unknown registration"),
        (status = 409, description = "Already checked in")
    )
)]
pub async fn check_in(
    State(state): State<SharedState>,
    Extension(operator): Extension<Operator>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<CheckInResponse>), AppError> {
    let (team, _ticket) = desk_service::check_in(&state, &operator, &id).await?;
    Ok((StatusCode::ACCEPTED, Json(CheckInResponse { team })))
}

/// Spin the wheel and answer once it lands. The result stays pending.
#[utoipa::path(
    post,
    path = "/operator/desk/teams/{id}/spin",
    tag = "desk",
    params(
        ("X-Operator-Email" = String, Header, description = "Allow-listed operator email"),
        ("id" = String, Path, description = "Registration id")
    ),
    responses(
        (status = 200, description = "Wheel landed", body = SpinResponse),
        (status = 409, description = "Not checked in, already assigned, or wheel busy")
    )
)]
pub async fn spin(
    State(state): State<SharedState>,
    Extension(operator): Extension<Operator>,
    Path(id): Path<String>,
) -> Result<Json<SpinResponse>, AppError> {
    let (team, outcome) = desk_service::request_spin(&state, &operator, &id).await?;
    Ok(Json(SpinResponse { team, outcome }))
}

/// Lock the revealed domain in.
#[utoipa::path(
    post,
    path = "/operator/desk/teams/{id}/confirm",
    tag = "desk",
    params(
        ("X-Operator-Email" = String, Header, description = "Allow-listed operator email"),
        ("id" = String, Path, description = "Registration id")
    ),
    request_body = ConfirmDomainRequest,
    responses(
        (status = 200, description = "Domain locked; realtime write result attached", body = AssignmentResponse),
        (status = 409, description = "Nothing pending or label mismatch")
    )
)]
pub async fn confirm(
    State(state): State<SharedState>,
    Extension(operator): Extension<Operator>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<ConfirmDomainRequest>>,
) -> Result<Json<AssignmentResponse>, AppError> {
    let receipt =
        desk_service::confirm_assignment(&state, &operator, &id, &payload.domain).await?;
    Ok(Json(AssignmentResponse {
        team: receipt.team,
        realtime: receipt.realtime,
    }))
}

#[utoipa::path(
    post,
    path = "/operator/desk/teams/{id}/discard",
    tag = "desk",
    params(
        ("X-Operator-Email" = String, Header, description = "Allow-listed operator email"),
        ("id" = String, Path, description = "Registration id")
    ),
    responses(
        (status = 200, description = "Pending result dropped", body = TeamSummary),
        (status = 409, description = "Nothing pending")
    )
)]
pub async fn discard(
    State(state): State<SharedState>,
    Extension(operator): Extension<Operator>,
    Path(id): Path<String>,
) -> Result<Json<TeamSummary>, AppError> {
    Ok(Json(
        desk_service::discard_pending(&state, &operator, &id).await?,
    ))
}

/// Clear a confirmed domain. The body must carry `"confirm": true`.
#[utoipa::path(
    post,
    path = "/operator/desk/teams/{id}/reset",
    tag = "desk",
    params(
        ("X-Operator-Email" = String, Header, description = "Allow-listed operator email"),
        ("id" = String, Path, description = "Registration id")
    ),
    request_body = ResetDomainRequest,
    responses(
        (status = 200, description = "Domain cleared", body = AssignmentResponse),
        (status = 400, description = "Reset not confirmed"),
        (status = 409, description = "No confirmed domain")
    )
)]
pub async fn reset(
    State(state): State<SharedState>,
    Extension(operator): Extension<Operator>,
    Path(id): Path<String>,
    Json(payload): Json<ResetDomainRequest>,
) -> Result<Json<AssignmentResponse>, AppError> {
    let receipt =
        desk_service::reset_assignment(&state, &operator, &id, payload.confirm).await?;
    Ok(Json(AssignmentResponse {
        team: receipt.team,
        realtime: receipt.realtime,
    }))
}
