//! Session protocol manager for the accounts API.
//!
//! [`AuthClient`] owns the CSRF token lifecycle, the retry-once recovery for
//! expired tokens, and the cached identity every surface consults. It holds
//! no UI concerns: callers feed it credentials and navigation queries and
//! render whatever it returns.
//!
//! Security boundary: passwords arrive as [`SecretString`] and are exposed
//! only while serializing the request body. Tokens, codes, and passwords are
//! never logged.

use crate::api::types::{
    ApiMessage, AuthUrlResponse, CsrfTokenResponse, IsAuthResponse, UserProfile,
};
use crate::api::{ApiTransport, Envelope};
use crate::config::ClientConfig;
use crate::error::AuthError;
use crate::oauth::{
    self, MemoryRedirectStore, OauthOutcome, OauthProvider, RedirectStore,
};
use crate::validate;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Session data guarded by the client lock. `current_user` is the single
/// source of truth for authentication state.
#[derive(Debug, Default)]
struct SessionState {
    csrf_token: Option<String>,
    current_user: Option<UserProfile>,
}

/// Client for the accounts API. Construct once per application and share;
/// all methods take `&self` and the internal state is lock-protected.
pub struct AuthClient {
    transport: ApiTransport,
    state: RwLock<SessionState>,
    redirect_store: Arc<dyn RedirectStore>,
    oauth_settle_delay: Duration,
}

impl AuthClient {
    /// Builds a client with an in-memory redirect store.
    pub fn new(config: ClientConfig) -> Result<Self, AuthError> {
        Self::with_redirect_store(config, Arc::new(MemoryRedirectStore::default()))
    }

    /// Builds a client with a caller-provided [`RedirectStore`]; browser
    /// shells pass one backed by session storage.
    pub fn with_redirect_store(
        config: ClientConfig,
        redirect_store: Arc<dyn RedirectStore>,
    ) -> Result<Self, AuthError> {
        let transport = ApiTransport::new(&config.base_url, &config.user_agent)?;
        Ok(Self {
            transport,
            state: RwLock::new(SessionState::default()),
            redirect_store,
            oauth_settle_delay: config.oauth_settle_delay,
        })
    }

    /// App-startup sequence: obtain a CSRF token, then run the identity
    /// check. Neither failure is fatal; the app starts logged out and the
    /// token is re-fetched on demand by the retry policy.
    pub async fn initialize(&self) {
        if let Err(err) = self.refresh_csrf_token().await {
            warn!("CSRF token initialization failed: {err}");
        }
        if let Err(err) = self.fetch_current_user().await {
            debug!("no session at startup: {err}");
        }
    }

    /// Fetches a fresh CSRF token and caches it for subsequent requests.
    pub async fn refresh_csrf_token(&self) -> Result<String, AuthError> {
        let response = self
            .transport
            .request_json(Method::GET, "/api/auth/csrf-token", None, None)
            .await?;
        let payload: CsrfTokenResponse = response.into_envelope()?.decode()?;

        let mut state = self.state.write().await;
        state.csrf_token = Some(payload.csrf_token.clone());
        Ok(payload.csrf_token)
    }

    /// The authoritative identity check. Success caches the profile; any
    /// failure clears it, so the cache never outlives the backend session.
    pub async fn fetch_current_user(&self) -> Result<UserProfile, AuthError> {
        match self.identity_request().await {
            Ok(user) => {
                self.state.write().await.current_user = Some(user.clone());
                Ok(user)
            }
            Err(err) => {
                self.state.write().await.current_user = None;
                Err(err)
            }
        }
    }

    async fn identity_request(&self) -> Result<UserProfile, AuthError> {
        let token = self.csrf_token().await;
        let response = self
            .transport
            .request_json(Method::GET, "/api/auth/is-auth", token.as_deref(), None)
            .await?;
        let envelope = response.into_envelope()?;
        let status = envelope.status;
        let payload: IsAuthResponse = envelope.decode()?;

        if payload.success {
            if let Some(user) = payload.user {
                return Ok(user);
            }
        }
        Err(AuthError::Auth {
            status,
            message: payload
                .message
                .unwrap_or_else(|| "Authentication check failed".to_string()),
        })
    }

    /// Derived from the cached profile, so it cannot disagree with it.
    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.current_user.is_some()
    }

    /// The cached profile from the last successful identity check.
    pub async fn current_user(&self) -> Option<UserProfile> {
        self.state.read().await.current_user.clone()
    }

    /// The cached CSRF token, if one has been obtained.
    pub async fn csrf_token(&self) -> Option<String> {
        self.state.read().await.csrf_token.clone()
    }

    /// Sends a request with the CSRF token attached. When the backend
    /// rejects the token as stale, the token is refreshed and the identical
    /// request retried exactly once; a second rejection surfaces as-is.
    async fn send_credentialed(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Envelope, AuthError> {
        let token = self.csrf_token().await;
        let first = self
            .transport
            .request_json(method.clone(), path, token.as_deref(), body)
            .await?
            .into_envelope();

        match first {
            Err(AuthError::CsrfExpired { .. }) => {
                debug!("stale CSRF token on {path}, refreshing and retrying once");
                let fresh = self.refresh_csrf_token().await?;
                self.transport
                    .request_json(method, path, Some(&fresh), body)
                    .await?
                    .into_envelope()
            }
            other => other,
        }
    }

    /// Creates an account. The backend signs the new account in, so a
    /// successful call ends with the identity check and a cached profile.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<UserProfile, AuthError> {
        let name = validate::sanitize_input(name);
        if name.is_empty() {
            return Err(AuthError::Validation("Please enter your name".to_string()));
        }
        let email = validate::normalize_email(email);
        validate::require_valid_email(&email)?;
        validate::require_valid_password(password.expose_secret())?;

        let body = json!({
            "name": name,
            "email": email,
            "password": password.expose_secret(),
        });
        self.send_credentialed(Method::POST, "/api/auth/register", Some(&body))
            .await?
            .require_success()?;

        self.fetch_current_user().await
    }

    /// Password login. The POST only sets the session cookie; the identity
    /// check that follows is what produces the authenticated state.
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<UserProfile, AuthError> {
        let email = validate::normalize_email(email);
        if email.is_empty() || password.expose_secret().is_empty() {
            return Err(AuthError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }
        validate::require_valid_email(&email)?;

        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });
        self.send_credentialed(Method::POST, "/api/auth/login", Some(&body))
            .await?
            .require_success()?;

        self.fetch_current_user().await
    }

    /// Ends the session. Local state is cleared before the request goes out:
    /// showing an authenticated UI after a failed logout is the worse
    /// failure mode, so the client fails open to logged-out. The returned
    /// error is informational; the user is signed out locally either way.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.state.write().await.current_user = None;

        let result = self
            .send_credentialed(Method::POST, "/api/auth/logout", Some(&json!({})))
            .await
            .and_then(Envelope::require_success);
        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                warn!("logout request failed after local sign-out: {err}");
                Err(err)
            }
        }
    }

    /// Requests an email-verification code for the signed-in account.
    pub async fn send_verify_otp(&self) -> Result<ApiMessage, AuthError> {
        self.send_credentialed(Method::POST, "/api/auth/send-verify-otp", Some(&json!({})))
            .await?
            .require_success()?
            .decode()
    }

    /// Confirms the signed-in account's email with the entered code. Callers
    /// re-run [`AuthClient::fetch_current_user`] afterwards to pick up the
    /// verified flag.
    pub async fn verify_email(&self, otp: &str) -> Result<ApiMessage, AuthError> {
        validate::require_valid_otp(otp)?;
        let body = json!({ "otp": otp });
        self.send_credentialed(Method::POST, "/api/auth/verify-email", Some(&body))
            .await?
            .require_success()?
            .decode()
    }

    /// Sends a password-reset code to `email`. Works logged out.
    pub async fn send_reset_otp(&self, email: &str) -> Result<ApiMessage, AuthError> {
        let email = validate::normalize_email(email);
        if email.is_empty() {
            return Err(AuthError::Validation(
                "Please enter your email address".to_string(),
            ));
        }
        validate::require_valid_email(&email)?;

        let body = json!({ "email": email });
        self.send_credentialed(Method::POST, "/api/auth/send-reset-otp", Some(&body))
            .await?
            .require_success()?
            .decode()
    }

    /// Checks a reset code before the user is asked for a new password.
    pub async fn verify_reset_otp(&self, email: &str, otp: &str) -> Result<ApiMessage, AuthError> {
        let email = validate::normalize_email(email);
        validate::require_valid_email(&email)?;
        validate::require_valid_otp(otp)?;

        let body = json!({ "email": email, "otp": otp });
        self.send_credentialed(Method::POST, "/api/auth/verify-reset-otp", Some(&body))
            .await?
            .require_success()?
            .decode()
    }

    /// Sets a new password using a previously verified reset code. The full
    /// password policy applies here the same as at registration.
    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &SecretString,
    ) -> Result<ApiMessage, AuthError> {
        let email = validate::normalize_email(email);
        validate::require_valid_email(&email)?;
        validate::require_valid_otp(otp)?;
        validate::require_valid_password(new_password.expose_secret())?;

        let body = json!({
            "email": email,
            "otp": otp,
            "newPassword": new_password.expose_secret(),
        });
        self.send_credentialed(Method::POST, "/api/auth/reset-password", Some(&body))
            .await?
            .require_success()?
            .decode()
    }

    /// Starts the provider round-trip: records the pending-redirect marker,
    /// then returns the authorization URL the shell must navigate to.
    pub async fn begin_oauth_redirect(
        &self,
        provider: OauthProvider,
        current_path: &str,
    ) -> Result<String, AuthError> {
        self.redirect_store.save(current_path);

        let envelope = self
            .send_credentialed(Method::GET, provider.authorize_path(), None)
            .await?
            .require_success()?;
        let status = envelope.status;
        let payload: AuthUrlResponse = envelope.decode()?;
        payload.auth_url.ok_or_else(|| AuthError::Auth {
            status,
            message: "Failed to connect to Google. Please try again.".to_string(),
        })
    }

    /// Inspects page-load query parameters for an OAuth return and finishes
    /// the round-trip. Call once per page load; any outcome other than
    /// [`OauthOutcome::NotOauth`] means the shell strips the query string.
    ///
    /// The pending-redirect marker is consumed only on success, so a failed
    /// attempt still lands the user where they left off on the next try.
    pub async fn complete_oauth_redirect(&self, query: &str) -> OauthOutcome {
        let params = oauth::parse_return_params(query);

        if let Some(code) = params.error {
            debug!("OAuth return carried error code {code:?}");
            return OauthOutcome::Failed {
                message: oauth::error_message(&code).to_string(),
            };
        }
        if !params.login_success {
            return OauthOutcome::NotOauth;
        }

        // The session cookie is set during the redirect; give it a moment to
        // settle before asking the backend who we are.
        tokio::time::sleep(self.oauth_settle_delay).await;

        match self.fetch_current_user().await {
            Ok(user) => {
                let redirect_to = oauth::resolve_redirect(self.redirect_store.take());
                OauthOutcome::SignedIn {
                    user,
                    redirect_to,
                    source: params.source,
                }
            }
            Err(err) => {
                warn!("identity check after OAuth return failed: {err}");
                OauthOutcome::Failed {
                    message: oauth::COMPLETE_FAILED_MESSAGE.to_string(),
                }
            }
        }
    }
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AuthClient")
            .field("transport", &self.transport)
            .field("oauth_settle_delay", &self.oauth_settle_delay)
            .finish_non_exhaustive()
    }
}
