//! Error taxonomy for the accounts client.
//!
//! Every failure is flattened into [`AuthError`] so callers branch on five
//! cases instead of transport internals. `Display` output is for logs;
//! [`AuthError::message`] is the user-facing string shells can show directly.

use std::fmt;

/// Substring the backend puts in 403 bodies when the CSRF token is stale.
/// Matching on the body is the documented contract with the backend; there is
/// no structured error code on this surface.
pub(crate) const CSRF_MARKER: &str = "CSRF";

/// User-facing message for requests that never reached the backend.
pub(crate) const NETWORK_MESSAGE: &str = "Network error. Please check your connection.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthError {
    /// No response was received: DNS, connect, or timeout failure.
    Network(String),
    /// Input rejected locally, before any request was sent.
    Validation(String),
    /// The backend refused the request (4xx), or a 2xx body reported
    /// `success: false`.
    Auth { status: u16, message: String },
    /// 403 whose body carries the CSRF marker. Recovered automatically once
    /// per request; surfaced only when the retry fails as well.
    CsrfExpired { message: String },
    /// The backend fell over (5xx).
    Server { status: u16, message: String },
}

impl AuthError {
    /// Classifies a non-success HTTP status into the taxonomy, substituting a
    /// canned message when the body carried none.
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        let message = if message.trim().is_empty() {
            fallback_message(status).to_string()
        } else {
            message
        };

        if status == 403 && message.contains(CSRF_MARKER) {
            AuthError::CsrfExpired { message }
        } else if (500..600).contains(&status) {
            AuthError::Server { status, message }
        } else {
            AuthError::Auth { status, message }
        }
    }

    /// The string a shell can show the user without further mapping.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            AuthError::Network(_) => NETWORK_MESSAGE,
            AuthError::Validation(message) => message,
            AuthError::Auth { message, .. }
            | AuthError::CsrfExpired { message }
            | AuthError::Server { message, .. } => message,
        }
    }

    /// HTTP status behind this error, when one was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::Network(_) | AuthError::Validation(_) => None,
            AuthError::Auth { status, .. } | AuthError::Server { status, .. } => Some(*status),
            AuthError::CsrfExpired { .. } => Some(403),
        }
    }

    /// True when the backend message points at an account created through
    /// Google, so shells can offer "Continue with Google" instead.
    #[must_use]
    pub fn suggests_google_login(&self) -> bool {
        match self {
            AuthError::Auth { message, .. } => {
                message.contains("Google authentication") || message.contains("uses Google login")
            }
            _ => false,
        }
    }
}

/// Canned messages for statuses whose bodies carried none.
pub(crate) fn fallback_message(status: u16) -> &'static str {
    match status {
        400 => "Invalid request",
        401 => "Authentication failed",
        403 => "Access denied",
        429 => "Too many attempts. Please try again later.",
        500..=599 => "Server error. Please try again later.",
        _ => "An unexpected error occurred",
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Network(message) => write!(formatter, "Network error: {message}"),
            AuthError::Validation(message) => write!(formatter, "Validation error: {message}"),
            AuthError::Auth { status, message } => {
                write!(formatter, "Request failed ({status}): {message}")
            }
            AuthError::CsrfExpired { message } => {
                write!(formatter, "CSRF token expired: {message}")
            }
            AuthError::Server { status, message } => {
                write!(formatter, "Server error ({status}): {message}")
            }
        }
    }
}

impl std::error::Error for AuthError {}
