//! Identity provider capability interface
//!
//! Amazon Cognito and Azure AD B2C expose very different client SDK shapes.
//! Both are reduced here to the same capability: build the hosted-login
//! redirect, accept the identity token the redirect flow produced, hand out
//! the current token, and sign out. The code exchange itself happens outside
//! this crate.

pub mod adb2c;
pub mod cognito;

pub use adb2c::{Adb2cConfig, Adb2cProvider};
pub use cognito::{CognitoConfig, CognitoProvider};

use crate::claims::ClaimsError;
use crate::models::{AuthState, IdentityToken, Provider};
use crate::settings::IdlinkSettings;
use crate::utils::logging::LoggingHelper;
use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use rand::RngCore;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Identity token rejected: {0}")]
    Claims(#[from] ClaimsError),
    #[error("Invalid provider URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Where to send the browser to start a hosted login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInRedirect {
    pub url: Url,
    /// Opaque value echoed back on the redirect URI
    pub state: String,
}

/// Where to send the browser to end the provider session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOutRedirect {
    pub url: Url,
}

pub trait IdentityProvider: Send + Sync {
    fn provider(&self) -> Provider;

    fn auth_state(&self) -> &AuthState;

    /// Build the hosted-login redirect
    ///
    /// # Errors
    ///
    /// Returns an error if the configured endpoints do not form a valid URL.
    fn sign_in(&mut self) -> Result<SignInRedirect, ProviderError>;

    /// Accept the identity token produced by the redirect flow
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be decoded. The previous state is kept.
    fn complete_sign_in(&mut self, jwt: &str) -> Result<IdentityToken, ProviderError>;

    /// Record that silent token acquisition failed
    fn refresh_failed(&mut self, reason: &str);

    /// Forget the current token and build the logout redirect
    ///
    /// # Errors
    ///
    /// Returns an error if the configured endpoints do not form a valid URL.
    fn sign_out(&mut self) -> Result<SignOutRedirect, ProviderError>;

    /// The current identity token, unless signed out, failed, or expired
    fn current_identity_token(&self) -> Option<&IdentityToken> {
        self.auth_state()
            .token()
            .filter(|token| !token.is_expired(Utc::now()))
    }
}

/// Initialize the provider chosen on the provider choice page
///
/// # Errors
///
/// Returns an error if the provider's configuration is incomplete.
pub fn init_provider(
    provider: Provider,
    settings: &IdlinkSettings,
) -> Result<Box<dyn IdentityProvider>, ProviderError> {
    Ok(match provider {
        Provider::Cognito => Box::new(CognitoProvider::init(settings.cognito.clone())?),
        Provider::Adb2c => Box::new(Adb2cProvider::init(settings.adb2c.clone())?),
    })
}

/// Replace `state` with a freshly decoded token; on decode failure `state` is untouched
fn accept_identity_token(
    provider: Provider,
    state: &mut AuthState,
    jwt: &str,
) -> Result<IdentityToken, ProviderError> {
    let token = IdentityToken::from_jwt(jwt)?;
    LoggingHelper::log_identity_token_accepted(provider, &token);
    *state = AuthState::SignedIn(token.clone());
    Ok(token)
}

fn mark_refresh_failed(provider: Provider, state: &mut AuthState, reason: &str) {
    LoggingHelper::log_refresh_failed(provider, reason);
    *state = AuthState::RefreshFailed {
        reason: reason.to_string(),
    };
}

/// Random value for the `state` parameter of a sign-in redirect
fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn require(field: &str, value: &str, provider: Provider) -> Result<(), ProviderError> {
    if value.trim().is_empty() {
        return Err(ProviderError::Configuration(format!(
            "Missing {field} for provider {provider}"
        )));
    }
    Ok(())
}

fn default_scopes() -> Vec<String> {
    vec!["openid".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::TestFixtures;

    #[test]
    fn test_init_provider_dispatches_on_tag() {
        let settings = TestFixtures::settings("http://localhost:9080");

        let cognito = init_provider(Provider::Cognito, &settings).unwrap();
        assert_eq!(cognito.provider(), Provider::Cognito);

        let adb2c = init_provider(Provider::Adb2c, &settings).unwrap();
        assert_eq!(adb2c.provider(), Provider::Adb2c);
    }

    #[test]
    fn test_init_provider_reports_missing_configuration() {
        let settings = IdlinkSettings::default();
        let err = init_provider(Provider::Adb2c, &settings).err().unwrap();
        assert!(matches!(err, ProviderError::Configuration(_)));
        assert!(err.to_string().contains("adb2c"));
    }

    #[test]
    fn test_generated_states_are_unique() {
        let a = generate_state();
        let b = generate_state();
        assert_eq!(a.len(), 43);
        assert_ne!(a, b);
    }

    #[test]
    fn test_failed_token_keeps_previous_state() {
        let mut state = AuthState::SignedOut;
        assert!(accept_identity_token(Provider::Cognito, &mut state, "garbage").is_err());
        assert_eq!(state, AuthState::SignedOut);
    }
}
