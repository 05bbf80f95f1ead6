use tracing::warn;

use crate::{error::ServiceError, state::SharedState};

/// Header set by the authenticating proxy with the signed-in user's email.
pub const OPERATOR_EMAIL_HEADER: &str = "x-operator-email";

/// An authenticated desk or timer operator.
///
/// Only [`authorize`] builds one, so every service taking an `&Operator` runs
/// behind the allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    email: String,
}

impl Operator {
    pub fn email(&self) -> &str {
        &self.email
    }
}

/// Check the principal email forwarded by the identity layer against the allow-list.
pub fn authorize(state: &SharedState, email: Option<&str>) -> Result<Operator, ServiceError> {
    let email = email
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .ok_or_else(|| {
            ServiceError::Unauthorized(format!("missing operator header `{OPERATOR_EMAIL_HEADER}`"))
        })?;

    if state.config().is_operator(email) {
        Ok(Operator {
            email: email.to_ascii_lowercase(),
        })
    } else {
        warn!(email, "rejected operator outside the allow-list");
        Err(ServiceError::Unauthorized(format!(
            "{email} is not an authorized operator"
        )))
    }
}

#[cfg(test)]
pub(crate) fn test_operator(email: &str) -> Operator {
    Operator {
        email: email.to_string(),
    }
}
