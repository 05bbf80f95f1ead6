use std::time::Duration;

use super::error::{FirebaseDaoError, FirebaseResult};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Runtime configuration describing how to reach the realtime database REST API.
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    /// Database root, e.g. `https://project-default-rtdb.firebaseio.com`.
    pub base_url: String,
    /// Optional database secret or ID token appended as `auth=`.
    pub auth_token: Option<String>,
    /// How often subscribed paths are re-read.
    pub poll_interval: Duration,
}

impl FirebaseConfig {
    /// Construct a configuration from an explicit database root.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Attach an auth token to every request.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Build a configuration from `REALTIME_BASE_URL` and `REALTIME_AUTH_TOKEN`.
    pub fn from_env() -> FirebaseResult<Self> {
        let base_url = std::env::var("REALTIME_BASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or(FirebaseDaoError::MissingEnvVar {
                var: "REALTIME_BASE_URL",
            })?;

        let mut config = Self::new(base_url);
        if let Some(token) = std::env::var("REALTIME_AUTH_TOKEN")
            .ok()
            .filter(|value| !value.is_empty())
        {
            config = config.with_auth_token(token);
        }
        Ok(config)
    }
}
