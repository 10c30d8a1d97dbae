//! Caller-facing credential types.
//!
//! This module defines:
//! - [`Secret`] - A wrapper for token strings that prevents accidental logging
//! - [`Credential`] - The in-memory OAuth2 token state owned by the caller

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A relative expiry that does not fit in a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expiry {seconds} seconds from now is out of range")]
pub struct ExpiryOutOfRange {
    pub seconds: i64,
}

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value,
/// and the backing buffer is wiped when the secret is dropped.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Consume the secret and return the inner value.
    pub fn into_inner(mut self) -> String {
        std::mem::take(&mut self.0)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

/// OAuth2 token state for a single user.
///
/// A `Credential` is owned by the caller. A
/// [`CredentialStore`](crate::store::CredentialStore) reads it on `store` and
/// overwrites every field on a successful `load`; it never keeps a reference
/// past the end of a call.
///
/// # Example
///
/// ```
/// use credkeep_core::Credential;
///
/// let credential = Credential::new()
///     .with_access_token("ya29.access")
///     .with_refresh_token("1//refresh")
///     .with_expires_in_seconds(3600)
///     .unwrap();
///
/// assert!(!credential.is_expired());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// The current access token.
    pub access_token: Option<Secret>,

    /// The refresh token, if the grant issued one.
    pub refresh_token: Option<Secret>,

    /// When the access token expires (None if unknown or non-expiring).
    pub expires_at: Option<DateTime<Utc>>,

    /// OAuth scopes granted with the access token.
    pub scopes: Vec<String>,
}

impl Credential {
    /// Create an empty credential.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the access token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(Secret::new(token));
        self
    }

    /// Set the refresh token.
    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(Secret::new(token));
        self
    }

    /// Set the absolute expiration instant.
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set the expiration relative to now, as returned in a token response.
    ///
    /// Fails if `seconds` lands outside the representable time range.
    pub fn with_expires_in_seconds(mut self, seconds: i64) -> Result<Self, ExpiryOutOfRange> {
        let expires_at = Duration::try_seconds(seconds)
            .and_then(|delta| Utc::now().checked_add_signed(delta))
            .ok_or(ExpiryOutOfRange { seconds })?;
        self.expires_at = Some(expires_at);
        Ok(self)
    }

    /// Set the granted scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Seconds until the access token expires.
    ///
    /// Negative once the token has expired; `None` if no expiration is set.
    pub fn expires_in_seconds(&self) -> Option<i64> {
        self.expires_at.map(|exp| (exp - Utc::now()).num_seconds())
    }

    /// Check if the access token has expired.
    ///
    /// Returns `false` if no expiration is set.
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|exp| exp <= Utc::now()).unwrap_or(false)
    }

    /// Check if the access token will expire within the given duration.
    ///
    /// A duration reaching past the end of representable time counts as
    /// covering every expiry; one reaching before its start covers none.
    pub fn expires_within(&self, duration: Duration) -> bool {
        let Some(exp) = self.expires_at else {
            return false;
        };
        match Utc::now().checked_add_signed(duration) {
            Some(deadline) => exp < deadline,
            None => duration > Duration::zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug_redacted() {
        let secret = Secret::new("super-secret");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_secret_display_redacted() {
        let secret = Secret::new("super-secret");
        let display = format!("{}", secret);
        assert!(!display.contains("super-secret"));
        assert!(display.contains("REDACTED"));
    }

    #[test]
    fn test_secret_serializes_as_plain_string() {
        let json = serde_json::to_string(&Secret::new("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }

    #[test]
    fn test_credential_debug_hides_tokens() {
        let credential = Credential::new()
            .with_access_token("access-value")
            .with_refresh_token("refresh-value");
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("access-value"));
        assert!(!debug.contains("refresh-value"));
    }

    #[test]
    fn test_credential_is_expired() {
        let expired = Credential::new().with_expires_at(Utc::now() - Duration::hours(1));
        assert!(expired.is_expired());

        let valid = Credential::new().with_expires_at(Utc::now() + Duration::hours(1));
        assert!(!valid.is_expired());

        assert!(!Credential::new().is_expired());
    }

    #[test]
    fn test_credential_expires_in_seconds() {
        let credential = Credential::new().with_expires_in_seconds(600).unwrap();
        let remaining = credential.expires_in_seconds().unwrap();
        assert!(remaining > 590 && remaining <= 600);

        let expired = Credential::new().with_expires_at(Utc::now() - Duration::minutes(1));
        assert!(expired.expires_in_seconds().unwrap() < 0);

        assert_eq!(Credential::new().expires_in_seconds(), None);
    }

    #[test]
    fn test_credential_expires_within() {
        let credential = Credential::new().with_expires_at(Utc::now() + Duration::minutes(5));

        assert!(credential.expires_within(Duration::minutes(10)));
        assert!(!credential.expires_within(Duration::minutes(2)));
    }

    #[test]
    fn test_expires_in_seconds_out_of_range() {
        for seconds in [i64::MAX, i64::MIN, i64::MAX / 1000, i64::MIN / 1000 + 1] {
            let result = Credential::new().with_expires_in_seconds(seconds);
            assert_eq!(result, Err(ExpiryOutOfRange { seconds }));
        }

        let past = Credential::new().with_expires_in_seconds(-60).unwrap();
        assert!(past.is_expired());
    }

    #[test]
    fn test_expires_within_extreme_durations() {
        let credential = Credential::new().with_expires_at(Utc::now() + Duration::minutes(5));

        assert!(credential.expires_within(Duration::MAX));
        assert!(!credential.expires_within(Duration::MIN));
        assert!(!Credential::new().expires_within(Duration::MAX));
    }
}
