//! Local input validation and sanitization, run before any request leaves the
//! client. The backend revalidates everything; these checks exist to reject
//! obviously bad input without a round-trip.

use crate::error::AuthError;
use regex::Regex;

/// Minimum password length accepted by the policy.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Maximum length kept by [`sanitize_input`].
const MAX_INPUT_CHARS: usize = 255;

/// Normalize an email for lookup/uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").is_ok_and(|regex| regex.is_match(email))
}

/// One-time codes are exactly six ASCII digits.
#[must_use]
pub fn valid_otp(otp: &str) -> bool {
    Regex::new(r"^[0-9]{6}$").is_ok_and(|regex| regex.is_match(otp))
}

/// Per-requirement breakdown of a password check, for UIs that render a
/// live checklist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PasswordCheck {
    pub min_length: bool,
    pub has_lowercase: bool,
    pub has_uppercase: bool,
    pub has_digit: bool,
    pub has_special: bool,
}

impl PasswordCheck {
    /// True when every requirement is met.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min_length
            && self.has_lowercase
            && self.has_uppercase
            && self.has_digit
            && self.has_special
    }
}

/// Evaluates the password policy requirement by requirement.
#[must_use]
pub fn check_password(password: &str) -> PasswordCheck {
    PasswordCheck {
        min_length: password.chars().count() >= PASSWORD_MIN_LENGTH,
        has_lowercase: password.chars().any(|ch| ch.is_ascii_lowercase()),
        has_uppercase: password.chars().any(|ch| ch.is_ascii_uppercase()),
        has_digit: password.chars().any(|ch| ch.is_ascii_digit()),
        has_special: password.chars().any(|ch| !ch.is_ascii_alphanumeric()),
    }
}

/// Strips angle brackets, trims whitespace, and caps the length of free-text
/// input such as display names.
#[must_use]
pub fn sanitize_input(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|ch| *ch != '<' && *ch != '>')
        .take(MAX_INPUT_CHARS)
        .collect()
}

pub(crate) fn require_valid_email(email: &str) -> Result<(), AuthError> {
    if valid_email(email) {
        Ok(())
    } else {
        Err(AuthError::Validation(
            "Please enter a valid email address".to_string(),
        ))
    }
}

pub(crate) fn require_valid_otp(otp: &str) -> Result<(), AuthError> {
    if valid_otp(otp) {
        Ok(())
    } else {
        Err(AuthError::Validation(
            "OTP must be exactly 6 digits".to_string(),
        ))
    }
}

pub(crate) fn require_valid_password(password: &str) -> Result<(), AuthError> {
    if check_password(password).is_valid() {
        Ok(())
    } else {
        Err(AuthError::Validation(
            "Password does not meet requirements".to_string(),
        ))
    }
}
