use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::registration::{
        ActionResponse, RegistrationCreated, RegistrationRequest, RegistrationSummary,
        UpdateStatusRequest,
    },
    error::AppError,
    routes::operator::require_operator,
    services::{auth_service::Operator, registration_service},
    state::SharedState,
};

/// Public registration form endpoint plus the operator verification dashboard.
pub fn router(state: SharedState) -> Router<SharedState> {
    let operator = Router::new()
        .route("/operator/registrations", get(list_registrations))
        .route("/operator/registrations/{id}/status", post(update_status))
        .route(
            "/operator/registrations/{id}/certificate",
            post(send_certificate),
        )
        .route_layer(middleware::from_fn_with_state(state, require_operator));

    Router::new()
        .route("/registrations", post(register))
        .merge(operator)
}

/// Submit a team registration.
#[utoipa::path(
    post,
    path = "/registrations",
    tag = "registrations",
    request_body = RegistrationRequest,
    responses(
        (status = 201, description = "Registration stored", body = RegistrationCreated),
        (status = 400, description = "Invalid form data"),
        (status = 502, description = "Registration sheet refused the row"),
        (status = 503, description = "Registration sheet unreachable")
    )
)]
pub async fn register(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<RegistrationRequest>>,
) -> Result<(StatusCode, Json<RegistrationCreated>), AppError> {
    let registration_id = registration_service::register(&state, payload.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegistrationCreated { registration_id }),
    ))
}

#[utoipa::path(
    get,
    path = "/operator/registrations",
    tag = "registrations",
    params(("X-Operator-Email" = String, Header, description = "Allow-listed operator email")),
    responses((status = 200, description = "Every registration row", body = [RegistrationSummary]))
)]
pub async fn list_registrations(
    State(state): State<SharedState>,
    Extension(operator): Extension<Operator>,
) -> Result<Json<Vec<RegistrationSummary>>, AppError> {
    Ok(Json(
        registration_service::list_registrations(&state, &operator).await?,
    ))
}

/// Change a registration's verification status.
#[utoipa::path(
    post,
    path = "/operator/registrations/{id}/status",
    tag = "registrations",
    params(
        ("X-Operator-Email" = String, Header, description = "Allow-listed operator email"),
        ("id" = String, Path, description = "Registration id")
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ActionResponse),
        (status = 502, description = "Unknown id or sheet error")
    )
)]
pub async fn update_status(
    State(state): State<SharedState>,
    Extension(operator): Extension<Operator>,
    Path(id): Path<String>,
    Valid(Json(payload)): Valid<Json<UpdateStatusRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    registration_service::update_status(&state, &operator, &id, &payload.status).await?;
    Ok(Json(ActionResponse {
        message: format!("status of {id} set to {}", payload.status.trim()),
    }))
}

#[utoipa::path(
    post,
    path = "/operator/registrations/{id}/certificate",
    tag = "registrations",
    params(
        ("X-Operator-Email" = String, Header, description = "Allow-listed operator email"),
        ("id" = String, Path, description = "Registration id")
    ),
    responses((status = 200, description = "Certificate mail requested", body = ActionResponse))
)]
pub async fn send_certificate(
    State(state): State<SharedState>,
    Extension(operator): Extension<Operator>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    registration_service::send_certificate(&state, &operator, &id).await?;
    Ok(Json(ActionResponse {
        message: format!("certificate sent for {id}"),
    }))
}
