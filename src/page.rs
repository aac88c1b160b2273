//! Provider page state
//!
//! One page per identity provider: it tracks the provider sign-in, shows the
//! identity token and its claims, and lets the user establish a backend
//! session with that token.

use crate::claims::ClaimsTable;
use crate::handshake::BackendSignIn;
use crate::models::{AuthState, BackendSessionState, Provider};
use crate::provider::{IdentityProvider, ProviderError, SignInRedirect, SignOutRedirect};
use std::fmt::Write as _;

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("Not signed in to {0}")]
    NotAuthenticated(Provider),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// The provider choice page
pub struct ProviderChoice;

impl ProviderChoice {
    #[must_use]
    pub fn options() -> Vec<(Provider, &'static str)> {
        Provider::ALL
            .iter()
            .map(|provider| (*provider, provider.display_name()))
            .collect()
    }
}

pub struct ProviderPage {
    identity_provider: Box<dyn IdentityProvider>,
    backend: BackendSignIn,
    backend_session: BackendSessionState,
}

impl ProviderPage {
    #[must_use]
    pub fn new(identity_provider: Box<dyn IdentityProvider>, backend: BackendSignIn) -> Self {
        Self {
            identity_provider,
            backend,
            backend_session: BackendSessionState::SignedOut,
        }
    }

    #[must_use]
    pub fn provider(&self) -> Provider {
        self.identity_provider.provider()
    }

    #[must_use]
    pub fn identity_provider(&self) -> &dyn IdentityProvider {
        self.identity_provider.as_ref()
    }

    #[must_use]
    pub fn backend_session(&self) -> BackendSessionState {
        self.backend_session
    }

    /// # Errors
    ///
    /// Returns an error if the provider cannot build its sign-in redirect.
    pub fn sign_in(&mut self) -> Result<SignInRedirect, PageError> {
        Ok(self.identity_provider.sign_in()?)
    }

    /// # Errors
    ///
    /// Returns an error if the identity token cannot be decoded.
    pub fn complete_sign_in(&mut self, jwt: &str) -> Result<(), PageError> {
        self.identity_provider.complete_sign_in(jwt)?;
        Ok(())
    }

    /// Record a failed silent token acquisition
    pub fn refresh_failed(&mut self, reason: &str) {
        self.identity_provider.refresh_failed(reason);
    }

    /// Sign out of the provider; the backend flag goes with the token
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot build its sign-out redirect.
    pub fn sign_out(&mut self) -> Result<SignOutRedirect, PageError> {
        let redirect = self.identity_provider.sign_out()?;
        self.backend_session = BackendSessionState::SignedOut;
        Ok(redirect)
    }

    /// Run the backend sign-in handshake with the current identity token
    ///
    /// Handshake failures are logged and leave the backend flag as it was;
    /// the return value tells whether the backend accepted the token.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no current identity token. No request is
    /// sent in that case.
    pub async fn sign_in_backend(&mut self) -> Result<bool, PageError> {
        let provider = self.provider();
        let id_token = self
            .identity_provider
            .current_identity_token()
            .ok_or(PageError::NotAuthenticated(provider))?
            .jwt
            .clone();

        let mut signed_in = false;
        self.backend
            .sign_in_with(
                &id_token,
                provider,
                || signed_in = true,
                |message| log::error!("{message}"),
            )
            .await;

        if signed_in {
            self.backend_session = BackendSessionState::SignedIn;
        }
        Ok(signed_in)
    }

    /// Plain-text rendering of the page
    #[must_use]
    pub fn summary(&self) -> String {
        let provider = self.provider();
        let mut out = String::new();

        let auth_status = match self.identity_provider.auth_state() {
            AuthState::SignedOut => "Not signed in".to_string(),
            AuthState::SignedIn(_) if self.identity_provider.current_identity_token().is_none() => {
                "Signed in (token expired)".to_string()
            }
            AuthState::SignedIn(_) => "Signed in".to_string(),
            AuthState::RefreshFailed { reason } => format!("Token refresh failed: {reason}"),
        };
        let backend_status = if self.backend_session.is_signed_in() {
            "Signed in"
        } else {
            "Not signed in"
        };

        let _ = writeln!(out, "{} sign-in", provider.display_name());
        let _ = writeln!(out);
        let _ = writeln!(out, "{} status: {auth_status}", provider.display_name());
        let _ = writeln!(out, "Backend status: {backend_status}");

        if let Some(token) = self.identity_provider.current_identity_token() {
            let _ = writeln!(out);
            let _ = writeln!(out, "ID token:");
            let _ = writeln!(out, "{}", token.jwt);
            let _ = writeln!(out);
            let _ = writeln!(out, "ID token claims:");
            let _ = write!(out, "{}", ClaimsTable::from_claims(&token.claims));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::CognitoProvider;
    use crate::testing::fixtures::TestFixtures;
    use chrono::{Duration, Utc};

    fn cognito_page() -> ProviderPage {
        let provider = CognitoProvider::init(TestFixtures::cognito_config()).unwrap();
        // The listener is dropped right away, so any request fails in transport
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|listener| listener.local_addr())
            .unwrap();
        let backend = BackendSignIn::new(&format!("http://{addr}")).unwrap();
        ProviderPage::new(Box::new(provider), backend)
    }

    #[test]
    fn test_provider_choice_lists_both_providers() {
        assert_eq!(
            ProviderChoice::options(),
            vec![
                (Provider::Cognito, "Amazon Cognito"),
                (Provider::Adb2c, "Azure AD B2C")
            ]
        );
    }

    #[tokio::test]
    async fn test_backend_sign_in_requires_token() {
        let mut page = cognito_page();
        let err = page.sign_in_backend().await.unwrap_err();
        assert!(matches!(err, PageError::NotAuthenticated(Provider::Cognito)));
        assert_eq!(page.backend_session(), BackendSessionState::SignedOut);
    }

    #[tokio::test]
    async fn test_expired_token_cannot_sign_in_backend() {
        let mut page = cognito_page();
        page.complete_sign_in(&TestFixtures::id_token_expiring_at(
            Utc::now() - Duration::hours(1),
        ))
        .unwrap();

        assert!(matches!(
            page.sign_in_backend().await,
            Err(PageError::NotAuthenticated(_))
        ));
        assert!(page.summary().contains("Signed in (token expired)"));
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_backend_signed_out() {
        let mut page = cognito_page();
        page.complete_sign_in(&TestFixtures::identity_token().jwt)
            .unwrap();

        assert!(!page.sign_in_backend().await.unwrap());
        assert_eq!(page.backend_session(), BackendSessionState::SignedOut);
    }

    #[test]
    fn test_summary_signed_out() {
        let page = cognito_page();
        let summary = page.summary();
        assert!(summary.starts_with("Amazon Cognito sign-in\n"));
        assert!(summary.contains("Amazon Cognito status: Not signed in"));
        assert!(summary.contains("Backend status: Not signed in"));
        assert!(!summary.contains("ID token"));
    }

    #[test]
    fn test_summary_shows_token_and_claims() {
        let mut page = cognito_page();
        let token = TestFixtures::identity_token();
        page.complete_sign_in(&token.jwt).unwrap();

        let summary = page.summary();
        assert!(summary.contains("Amazon Cognito status: Signed in\n"));
        assert!(summary.contains(&token.jwt));
        assert!(summary.contains("ID token claims:"));
        assert!(summary.contains(crate::testing::constants::TEST_SUBJECT));
    }

    #[test]
    fn test_summary_shows_refresh_failure() {
        let mut page = cognito_page();
        page.refresh_failed("interaction_required");
        assert!(page
            .summary()
            .contains("Token refresh failed: interaction_required"));
    }
}
