//! Runtime configuration for the accounts client. Values are read from the
//! environment with local-development defaults so the client works against a
//! dev backend with no setup. Configuration values are public; do not store
//! secrets here.

use std::env;
use std::time::Duration;

/// Base URL used when `KWETU_API_BASE_URL` is unset or blank.
pub const DEFAULT_BASE_URL: &str = "http://localhost:4000";

/// Wait applied after an OAuth provider return before the identity check, so
/// the session cookie set during the redirect is visible to the next request.
pub const DEFAULT_OAUTH_SETTLE_DELAY: Duration = Duration::from_millis(500);

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Client configuration, usually loaded once at startup.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    pub oauth_settle_delay: Duration,
}

impl ClientConfig {
    /// Configuration pointing at `base_url` with default timing.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_agent: APP_USER_AGENT.to_string(),
            oauth_settle_delay: DEFAULT_OAUTH_SETTLE_DELAY,
        }
    }

    /// Loads configuration from `KWETU_API_BASE_URL`, falling back to the
    /// local-development default when unset or blank.
    pub fn from_env() -> Self {
        let base_url = env::var("KWETU_API_BASE_URL")
            .ok()
            .as_deref()
            .and_then(normalize_env_value)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self::new(base_url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn normalize_env_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
