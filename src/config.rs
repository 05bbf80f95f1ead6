//! Application-level configuration loading: operator allow-list, wheel segments and timings.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::wheel::{WheelSegment, default_segments};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/desk.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CODERUSH_DESK_CONFIG_PATH";
/// Upper bound on a single store write issued by an operator action.
const DEFAULT_PERSIST_TIMEOUT: Duration = Duration::from_secs(5);
/// Period of the server-side timer viewer loop.
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    operators: Vec<String>,
    segments: Vec<WheelSegment>,
    persist_timeout: Duration,
    tick_interval: Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        operators = app_config.operators.len(),
                        segments = app_config.segments.len(),
                        "loaded desk configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Replace the operator allow-list.
    pub fn with_operators<I, S>(mut self, operators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.operators = operators
            .into_iter()
            .filter_map(|email| normalize_email(email.as_ref()))
            .collect();
        self
    }

    /// Replace the wheel segments; an empty list keeps the current ones.
    pub fn with_segments(mut self, segments: Vec<WheelSegment>) -> Self {
        if !segments.is_empty() {
            self.segments = segments;
        }
        self
    }

    /// Replace the bound on operator-issued store writes.
    pub fn with_persist_timeout(mut self, timeout: Duration) -> Self {
        self.persist_timeout = timeout;
        self
    }

    /// Whether `email` is on the operator allow-list (case-insensitive).
    pub fn is_operator(&self, email: &str) -> bool {
        normalize_email(email).is_some_and(|email| self.operators.contains(&email))
    }

    /// Ordered, non-empty list of wheel segments.
    pub fn segments(&self) -> &[WheelSegment] {
        &self.segments
    }

    pub fn persist_timeout(&self) -> Duration {
        self.persist_timeout
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            operators: Vec::new(),
            segments: default_segments(),
            persist_timeout: DEFAULT_PERSIST_TIMEOUT,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    operators: Vec<String>,
    segments: Vec<WheelSegment>,
    persist_timeout_ms: Option<u64>,
    tick_interval_ms: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        if value.segments.is_empty() {
            warn!("config lists no wheel segments; using the built-in domains");
        }

        let tick_interval = value
            .tick_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TICK_INTERVAL);
        let persist_timeout = value
            .persist_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_PERSIST_TIMEOUT);

        Self {
            tick_interval,
            persist_timeout,
            ..Self::default()
        }
        .with_operators(value.operators)
        .with_segments(value.segments)
    }
}

fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim();
    (!email.is_empty()).then(|| email.to_ascii_lowercase())
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
