//! Core data types shared by the handshake, the providers and the pages

use crate::claims::{decode_claims, ClaimsError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Identity provider the user federates with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Cognito,
    Adb2c,
}

impl Provider {
    /// Every provider offered on the provider choice page, in display order
    pub const ALL: [Provider; 2] = [Provider::Cognito, Provider::Adb2c];

    /// Tag used in backend paths (`/api/{tag}/login`)
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Cognito => "cognito",
            Provider::Adb2c => "adb2c",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Cognito => "Amazon Cognito",
            Provider::Adb2c => "Azure AD B2C",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown provider tag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown identity provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cognito" => Ok(Provider::Cognito),
            "adb2c" => Ok(Provider::Adb2c),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// Bearer identity token together with its decoded (unverified) claims
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityToken {
    pub jwt: String,
    pub claims: Map<String, Value>,
}

impl IdentityToken {
    /// Decode the claims of `jwt` and keep both
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a three-part JWT with a JSON object payload.
    pub fn from_jwt(jwt: impl Into<String>) -> Result<Self, ClaimsError> {
        let jwt = jwt.into();
        let claims = decode_claims(&jwt)?;
        Ok(Self { jwt, claims })
    }

    /// The `sub` claim, if present
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.claims.get("sub").and_then(Value::as_str)
    }

    /// The `exp` claim as a timestamp, if present and valid
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.claims
            .get("exp")
            .and_then(Value::as_i64)
            .and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Tokens without an `exp` claim never expire here; the backend decides.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

/// Anti-CSRF header pair issued by the backend for one login attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrfToken {
    #[serde(rename = "csrfTokenHeaderName")]
    pub header_name: String,
    #[serde(rename = "csrfTokenValue")]
    pub header_value: String,
}

/// Body of `POST /api/{provider}/login`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub id_token: &'a str,
}

/// Whether the backend session has been established from this page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendSessionState {
    #[default]
    SignedOut,
    SignedIn,
}

impl BackendSessionState {
    #[must_use]
    pub fn is_signed_in(self) -> bool {
        matches!(self, BackendSessionState::SignedIn)
    }
}

/// Provider-side authentication state
///
/// A failed silent token acquisition is tracked as `RefreshFailed` instead of
/// being reported as a plain sign-out.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AuthState {
    #[default]
    SignedOut,
    SignedIn(IdentityToken),
    RefreshFailed { reason: String },
}

impl AuthState {
    #[must_use]
    pub fn token(&self) -> Option<&IdentityToken> {
        match self {
            AuthState::SignedIn(token) => Some(token),
            AuthState::SignedOut | AuthState::RefreshFailed { .. } => None,
        }
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        matches!(self, AuthState::SignedIn(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::TestFixtures;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_provider_tags_round_trip_through_from_str() {
        for provider in Provider::ALL {
            assert_eq!(provider.as_str().parse::<Provider>(), Ok(provider));
        }
        assert_eq!(
            "google".parse::<Provider>(),
            Err(UnknownProvider("google".to_string()))
        );
    }

    #[test]
    fn test_csrf_token_uses_backend_field_names() {
        let token: CsrfToken = serde_json::from_value(json!({
            "csrfTokenHeaderName": "X-CSRF-Token",
            "csrfTokenValue": "abc123"
        }))
        .unwrap();

        assert_eq!(token.header_name, "X-CSRF-Token");
        assert_eq!(token.header_value, "abc123");
    }

    #[test]
    fn test_login_request_body_shape() {
        let body = serde_json::to_value(LoginRequest { id_token: "a.b.c" }).unwrap();
        assert_eq!(body, json!({ "idToken": "a.b.c" }));
    }

    #[test]
    fn test_identity_token_expiry() {
        let now = Utc::now();
        let fresh = IdentityToken::from_jwt(TestFixtures::id_token_expiring_at(
            now + Duration::hours(1),
        ))
        .unwrap();
        let stale = IdentityToken::from_jwt(TestFixtures::id_token_expiring_at(
            now - Duration::minutes(1),
        ))
        .unwrap();

        assert!(!fresh.is_expired(now));
        assert!(stale.is_expired(now));
        assert_eq!(fresh.subject(), Some(crate::testing::constants::TEST_SUBJECT));
    }

    #[test]
    fn test_token_without_exp_is_not_expired() {
        let token =
            IdentityToken::from_jwt(TestFixtures::id_token_with_claims(&json!({"sub": "x"})))
                .unwrap();
        assert!(token.expires_at().is_none());
        assert!(!token.is_expired(Utc::now()));
    }

    #[test]
    fn test_auth_state_token_only_when_signed_in() {
        let token = TestFixtures::identity_token();
        assert!(AuthState::SignedIn(token.clone()).token().is_some());
        assert!(AuthState::SignedOut.token().is_none());
        assert!(AuthState::RefreshFailed {
            reason: "interaction_required".to_string()
        }
        .token()
        .is_none());
    }
}
