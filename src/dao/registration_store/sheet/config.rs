use std::time::Duration;

use super::error::{SheetDaoError, SheetResult};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Runtime configuration describing how to reach the registration web app.
#[derive(Debug, Clone)]
pub struct SheetConfig {
    /// Deployed script URL; handles both the bulk read (GET) and actions (POST).
    pub script_url: String,
    /// Upper bound for a single HTTP exchange with the script.
    pub request_timeout: Duration,
}

impl SheetConfig {
    /// Construct a configuration from an explicit script URL.
    pub fn new(script_url: impl Into<String>) -> Self {
        Self {
            script_url: script_url.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build a configuration by reading `SHEET_SCRIPT_URL`.
    pub fn from_env() -> SheetResult<Self> {
        let script_url = std::env::var("SHEET_SCRIPT_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or(SheetDaoError::MissingEnvVar {
                var: "SHEET_SCRIPT_URL",
            })?;
        Ok(Self::new(script_url))
    }
}
