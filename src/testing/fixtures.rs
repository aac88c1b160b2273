//! Test fixtures providing pre-built test objects

use crate::models::IdentityToken;
use crate::provider::{Adb2cConfig, CognitoConfig};
use crate::settings::{BackendSettings, IdlinkSettings};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use super::constants::{TEST_EMAIL, TEST_SUBJECT};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Build an unsigned JWT carrying `claims` as its payload
    #[must_use]
    pub fn id_token_with_claims(claims: &Value) -> String {
        let header = json!({ "alg": "RS256", "typ": "JWT", "kid": "test-key" });
        let header_b64 = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header_b64}.{payload_b64}.dGVzdC1zaWduYXR1cmU")
    }

    /// Unsigned JWT for the test user expiring at `exp`
    #[must_use]
    pub fn id_token_expiring_at(exp: DateTime<Utc>) -> String {
        let issued_at = exp - Duration::hours(1);
        Self::id_token_with_claims(&json!({
            "sub": TEST_SUBJECT,
            "email": TEST_EMAIL,
            "email_verified": true,
            "aud": "cognito-client-id",
            "token_use": "id",
            "iat": issued_at.timestamp(),
            "exp": exp.timestamp()
        }))
    }

    /// Identity token for the test user, valid for the next hour
    ///
    /// # Panics
    ///
    /// Never in practice: the fixture token is always well-formed.
    #[must_use]
    pub fn identity_token() -> IdentityToken {
        IdentityToken::from_jwt(Self::id_token_expiring_at(Utc::now() + Duration::hours(1)))
            .expect("fixture token is well-formed")
    }

    #[must_use]
    pub fn cognito_config() -> CognitoConfig {
        CognitoConfig {
            region: "ap-northeast-1".to_string(),
            user_pool_id: "ap-northeast-1_TestPool".to_string(),
            client_id: "cognito-client-id".to_string(),
            domain: "idlink-test.auth.ap-northeast-1.amazoncognito.com".to_string(),
            redirect_url: "http://localhost:5173/cognito".to_string(),
            scopes: vec!["openid".to_string()],
        }
    }

    #[must_use]
    pub fn adb2c_config() -> Adb2cConfig {
        Adb2cConfig {
            tenant: "idlinktest".to_string(),
            application_id: "adb2c-application-id".to_string(),
            signin_policy: "B2C_1_signin".to_string(),
            redirect_url: "http://localhost:5173/adb2c".to_string(),
            scopes: vec!["openid".to_string()],
        }
    }

    /// Fully configured settings pointing at `backend_base_url`
    #[must_use]
    pub fn settings(backend_base_url: &str) -> IdlinkSettings {
        IdlinkSettings {
            backend: BackendSettings {
                base_url: backend_base_url.to_string(),
                request_timeout_secs: Some(5),
            },
            cognito: Self::cognito_config(),
            adb2c: Self::adb2c_config(),
            ..Default::default()
        }
    }
}
