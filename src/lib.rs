//! # Kwetu Auth (Accounts API Client)
//!
//! `kwetu-auth` is the headless authentication client for the Kwetu accounts
//! backend. It owns everything between "user typed credentials" and "backend
//! confirmed a session": the CSRF token lifecycle, cookie-backed session
//! calls, Google OAuth round-trips, local input validation, and the six-digit
//! one-time-code entry machine. Rendering, routing, and storage stay in the
//! embedding shell.
//!
//! ## Session Protocol
//!
//! The backend pairs its session cookie with a rotating CSRF token sent in
//! the `X-CSRF-Token` header. [`AuthClient`] fetches the token at startup,
//! attaches it to every credentialed call, and on a 403 that names a stale
//! token it refreshes and retries the request exactly once. Authentication
//! state is derived: `is_authenticated` is true iff a profile is cached from
//! the last successful identity check, so the two can never disagree.
//!
//! ## One-Time-Code Entry
//!
//! [`OtpEntry`] models a row of six single-digit inputs: focus advance and
//! retreat, paste distribution, and an auto-submit guard implemented as a
//! phase transition, so a filled buffer submits exactly once no matter how
//! events race. [`AutoSubmitTimer`] and [`ResendCooldown`] carry the timing
//! rules around it.
//!
//! ## Failure Model
//!
//! Every operation returns [`AuthError`], a closed taxonomy with
//! ready-to-show messages. Logout fails open: local state clears before the
//! request is sent, so a dead backend can never strand a user in a
//! half-authenticated UI.

mod api;
mod config;
mod error;
mod oauth;
mod otp;
mod session;
mod validate;

pub use api::types::{ApiMessage, AuthMethod, UserProfile};
pub use config::{APP_USER_AGENT, ClientConfig, DEFAULT_BASE_URL, DEFAULT_OAUTH_SETTLE_DELAY};
pub use error::AuthError;
pub use oauth::{MemoryRedirectStore, OauthOutcome, OauthProvider, RedirectStore};
pub use otp::{
    AUTO_SUBMIT_DELAY, AutoSubmitTimer, OTP_LENGTH, OtpEntry, OtpPhase, OtpSignal, RESEND_COOLDOWN,
    ResendCooldown,
};
pub use session::AuthClient;
pub use validate::{
    PASSWORD_MIN_LENGTH, PasswordCheck, check_password, normalize_email, sanitize_input,
    valid_email, valid_otp,
};
