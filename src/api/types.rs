//! Request and response types for the accounts API. The backend is a Node
//! service that speaks camelCase JSON; aliases cover the field spellings older
//! deployments still emit. These payloads never carry passwords back, but the
//! profile is personal data and must not be logged wholesale.

use serde::{Deserialize, Serialize};

/// How the account authenticates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    #[default]
    Traditional,
    Google,
}

/// Account profile as returned by the identity check.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "isAccountVerified")]
    pub is_verified: bool,
    #[serde(default)]
    pub auth_method: AuthMethod,
    #[serde(default, alias = "avatar")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl UserProfile {
    /// True for accounts created through Google; these have no local password.
    #[must_use]
    pub fn is_oauth_user(&self) -> bool {
        self.auth_method == AuthMethod::Google
    }

    /// Name to greet the user with: the profile name, else the mailbox part
    /// of the email, else a generic fallback.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = self.name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
        self.email
            .split('@')
            .next()
            .filter(|part| !part.is_empty())
            .map_or_else(|| "User".to_string(), str::to_string)
    }

    /// Up to two uppercase initials for avatar placeholders.
    #[must_use]
    pub fn initials(&self) -> String {
        let initials: String = self
            .name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .collect();
        if initials.is_empty() {
            "U".to_string()
        } else {
            initials.to_uppercase()
        }
    }
}

/// Acknowledgement body most mutating endpoints return.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CsrfTokenResponse {
    pub csrf_token: String,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct IsAuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthUrlResponse {
    #[serde(default)]
    pub auth_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_profile_deserializes_backend_spellings() {
        let json = r#"{
            "_id": "665f1c2ab9",
            "name": "Jane Doe",
            "email": "jane@example.com",
            "isAccountVerified": true,
            "authMethod": "google",
            "avatar": "https://lh3.googleusercontent.com/a/photo"
        }"#;

        let profile: UserProfile = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(profile.id, "665f1c2ab9");
        assert_eq!(profile.name, "Jane Doe");
        assert!(profile.is_verified);
        assert_eq!(profile.auth_method, AuthMethod::Google);
        assert!(profile.is_oauth_user());
        assert_eq!(
            profile.avatar_url.as_deref(),
            Some("https://lh3.googleusercontent.com/a/photo")
        );
    }

    #[test]
    fn user_profile_tolerates_missing_fields() {
        let profile: UserProfile = serde_json::from_str(r#"{"email":"a@b.co"}"#)
            .expect("Failed to deserialize");
        assert!(!profile.is_verified);
        assert_eq!(profile.auth_method, AuthMethod::Traditional);
        assert!(!profile.is_oauth_user());
        assert_eq!(profile.avatar_url, None);
    }

    #[test]
    fn display_name_prefers_name_then_email_then_fallback() {
        let named = UserProfile {
            name: "  Jane Doe ".to_string(),
            ..UserProfile::default()
        };
        assert_eq!(named.display_name(), "Jane Doe");

        let email_only = UserProfile {
            email: "jane.doe@example.com".to_string(),
            ..UserProfile::default()
        };
        assert_eq!(email_only.display_name(), "jane.doe");

        assert_eq!(UserProfile::default().display_name(), "User");
    }

    #[test]
    fn initials_take_at_most_two_words() {
        let profile = UserProfile {
            name: "jane mary doe".to_string(),
            ..UserProfile::default()
        };
        assert_eq!(profile.initials(), "JM");

        let single = UserProfile {
            name: "jane".to_string(),
            ..UserProfile::default()
        };
        assert_eq!(single.initials(), "J");

        assert_eq!(UserProfile::default().initials(), "U");
    }

    #[test]
    fn csrf_token_response_reads_camel_case() {
        let response: CsrfTokenResponse = serde_json::from_str(r#"{"csrfToken":"tok-1"}"#)
            .expect("Failed to deserialize");
        assert_eq!(response.csrf_token, "tok-1");
    }

    #[test]
    fn auth_url_response_reads_camel_case() {
        let response: AuthUrlResponse =
            serde_json::from_str(r#"{"success":true,"authUrl":"https://accounts.google.com/x"}"#)
                .expect("Failed to deserialize");
        assert_eq!(
            response.auth_url.as_deref(),
            Some("https://accounts.google.com/x")
        );
    }
}
