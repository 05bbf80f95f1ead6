use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{
    error::AppError,
    services::auth_service::{self, OPERATOR_EMAIL_HEADER},
    state::SharedState,
};

/// Reject requests whose forwarded principal is not on the operator allow-list.
///
/// On success the [`auth_service::Operator`] is stored as a request extension.
pub async fn require_operator(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let email = req
        .headers()
        .get(OPERATOR_EMAIL_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let operator = auth_service::authorize(&state, email.as_deref())?;
    req.extensions_mut().insert(operator);
    Ok(next.run(req).await)
}
