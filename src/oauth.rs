//! OAuth redirect round-trip support.
//!
//! Signing in through Google leaves the app entirely: the browser navigates
//! to the provider and comes back with `login=success` or `error=<code>` in
//! the query string. Everything that must survive that round-trip goes
//! through a [`RedirectStore`]; everything the backend tells us on the way
//! back is folded into an [`OauthOutcome`].

use crate::api::types::UserProfile;
use std::sync::{Mutex, PoisonError};
use url::form_urlencoded;

/// External identity providers the backend can broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OauthProvider {
    Google,
}

impl OauthProvider {
    /// Endpoint that returns the provider authorization URL.
    pub(crate) fn authorize_path(self) -> &'static str {
        match self {
            OauthProvider::Google => "/api/auth/google",
        }
    }
}

/// Landing path when no usable pre-auth path was recorded.
pub(crate) const DEFAULT_LANDING_PATH: &str = "/";

/// Returning users to the login page after they just signed in would be
/// confusing, so a recorded login path is discarded.
pub(crate) const LOGIN_PATH: &str = "/login";

pub(crate) const COMPLETE_FAILED_MESSAGE: &str = "Failed to complete login. Please try again.";

/// Persistence for the pending-redirect marker across the provider redirect.
/// Browser shells back this with session storage so the marker survives the
/// page reload; the in-memory default covers native callers and tests.
pub trait RedirectStore: Send + Sync {
    /// Records the in-app path to return to after the round-trip.
    fn save(&self, path: &str);
    /// Takes the marker, clearing it so it is consumed at most once.
    fn take(&self) -> Option<String>;
}

/// Process-local [`RedirectStore`]. Does not survive a real page navigation.
#[derive(Debug, Default)]
pub struct MemoryRedirectStore {
    slot: Mutex<Option<String>>,
}

impl RedirectStore for MemoryRedirectStore {
    fn save(&self, path: &str) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(path.to_string());
    }

    fn take(&self) -> Option<String> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.take()
    }
}

/// Result of inspecting the page-load query for an OAuth return.
#[derive(Clone, Debug, PartialEq)]
pub enum OauthOutcome {
    /// No OAuth parameters present; nothing was consumed.
    NotOauth,
    /// The provider or backend reported an error. The shell should show the
    /// message and strip the query string.
    Failed { message: String },
    /// Signed in. The shell should navigate to `redirect_to` and strip the
    /// query string; `source` mirrors the backend's attribution parameter.
    SignedIn {
        user: UserProfile,
        redirect_to: String,
        source: Option<String>,
    },
}

/// Query parameters the backend appends when redirecting back to the app.
pub(crate) struct ReturnParams {
    pub error: Option<String>,
    pub login_success: bool,
    pub source: Option<String>,
}

pub(crate) fn parse_return_params(query: &str) -> ReturnParams {
    let mut params = ReturnParams {
        error: None,
        login_success: false,
        source: None,
    };
    let trimmed = query.trim_start_matches('?');
    for (key, value) in form_urlencoded::parse(trimmed.as_bytes()) {
        match key.as_ref() {
            "error" => params.error = Some(value.into_owned()),
            "login" => params.login_success = value == "success",
            "source" => params.source = Some(value.into_owned()),
            _ => {}
        }
    }
    params
}

/// Maps the backend's error codes to user-facing messages. Codes are a closed
/// set today; anything new falls back to a generic message.
pub(crate) fn error_message(code: &str) -> &'static str {
    match code {
        "oauth_failed" => "Google login failed. Please try again.",
        "no_code" => "Authentication incomplete. Please try again.",
        "user_cancelled" => "Login cancelled.",
        "invalid_state" => "Security validation failed. Please try again.",
        "token_expired" => "Authentication session expired. Please try again.",
        "user_exists" => "Account already exists with different login method.",
        _ => "Authentication failed",
    }
}

/// Picks the post-login landing path from the recorded marker.
pub(crate) fn resolve_redirect(marker: Option<String>) -> String {
    match marker {
        Some(path) if path != LOGIN_PATH && !path.trim().is_empty() => path,
        _ => DEFAULT_LANDING_PATH.to_string(),
    }
}
