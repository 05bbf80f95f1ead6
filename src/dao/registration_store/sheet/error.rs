//! Error types shared by the sheet storage implementation.

use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`SheetDaoError`] failures.
pub type SheetResult<T> = Result<T, SheetDaoError>;

/// Failures that can occur while talking to the registration web app.
#[derive(Debug, Error)]
pub enum SheetDaoError {
    /// Required environment variable is missing.
    #[error("missing sheet environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build sheet HTTP client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A request to the script could not be sent.
    #[error("failed to send `{action}` request to the sheet script")]
    RequestSend {
        action: String,
        #[source]
        source: reqwest::Error,
    },
    /// The script answered with a non-success HTTP status.
    #[error("unexpected sheet response status {status} for `{action}`")]
    RequestStatus { action: String, status: StatusCode },
    /// Response payload could not be parsed into JSON.
    #[error("failed to decode sheet response for `{action}`")]
    DecodeResponse {
        action: String,
        #[source]
        source: reqwest::Error,
    },
    /// The JSON payload does not have the expected shape.
    #[error("unexpected sheet payload for `{action}`: {detail}")]
    UnexpectedPayload { action: String, detail: String },
    /// The script reported an application-level error (`result: error`).
    #[error("sheet script rejected `{action}`: {message}")]
    ScriptError { action: String, message: String },
}

impl From<SheetDaoError> for StorageError {
    fn from(err: SheetDaoError) -> Self {
        match err {
            SheetDaoError::UnexpectedPayload { .. } => StorageError::malformed(err.to_string()),
            SheetDaoError::ScriptError { .. } => StorageError::rejected(err.to_string()),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
