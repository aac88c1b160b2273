//! Amazon Cognito user pool with the hosted UI

use super::{
    accept_identity_token, default_scopes, generate_state, mark_refresh_failed, require,
    IdentityProvider, ProviderError, SignInRedirect, SignOutRedirect,
};
use crate::models::{AuthState, IdentityToken, Provider};
use crate::utils::logging::LoggingHelper;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CognitoConfig {
    pub region: String,
    pub user_pool_id: String,
    pub client_id: String,
    /// Hosted UI domain, with or without the `https://` scheme
    pub domain: String,
    /// Used both after sign-in and after sign-out
    pub redirect_url: String,
    pub scopes: Vec<String>,
}

impl Default for CognitoConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            user_pool_id: String::new(),
            client_id: String::new(),
            domain: String::new(),
            redirect_url: String::new(),
            scopes: default_scopes(),
        }
    }
}

#[derive(Debug)]
pub struct CognitoProvider {
    config: CognitoConfig,
    domain_url: Url,
    state: AuthState,
}

impl CognitoProvider {
    /// Validate `config` and create a signed-out provider
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is empty, no scope is configured,
    /// or the domain / redirect URL do not parse.
    pub fn init(config: CognitoConfig) -> Result<Self, ProviderError> {
        let provider = Provider::Cognito;
        require("region", &config.region, provider)?;
        require("user_pool_id", &config.user_pool_id, provider)?;
        require("client_id", &config.client_id, provider)?;
        require("domain", &config.domain, provider)?;
        require("redirect_url", &config.redirect_url, provider)?;
        if config.scopes.is_empty() {
            return Err(ProviderError::Configuration(format!(
                "No scopes configured for provider {provider}"
            )));
        }
        Url::parse(&config.redirect_url)?;

        let domain_url = if config.domain.starts_with("http://") || config.domain.starts_with("https://") {
            Url::parse(&config.domain)?
        } else {
            Url::parse(&format!("https://{}", config.domain))?
        };

        let cognito = Self {
            config,
            domain_url,
            state: AuthState::SignedOut,
        };
        LoggingHelper::log_provider_initialized(provider, &cognito.issuer());
        Ok(cognito)
    }

    /// Issuer of the user pool's tokens
    #[must_use]
    pub fn issuer(&self) -> String {
        format!(
            "https://cognito-idp.{}.amazonaws.com/{}",
            self.config.region, self.config.user_pool_id
        )
    }

    #[must_use]
    pub fn config(&self) -> &CognitoConfig {
        &self.config
    }
}

impl IdentityProvider for CognitoProvider {
    fn provider(&self) -> Provider {
        Provider::Cognito
    }

    fn auth_state(&self) -> &AuthState {
        &self.state
    }

    fn sign_in(&mut self) -> Result<SignInRedirect, ProviderError> {
        let state = generate_state();
        let mut url = self.domain_url.join("oauth2/authorize")?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("redirect_uri", &self.config.redirect_url)
            .append_pair("state", &state);

        LoggingHelper::log_sign_in_redirect(Provider::Cognito, &self.config.scopes);
        Ok(SignInRedirect { url, state })
    }

    fn complete_sign_in(&mut self, jwt: &str) -> Result<IdentityToken, ProviderError> {
        accept_identity_token(Provider::Cognito, &mut self.state, jwt)
    }

    fn refresh_failed(&mut self, reason: &str) {
        mark_refresh_failed(Provider::Cognito, &mut self.state, reason);
    }

    fn sign_out(&mut self) -> Result<SignOutRedirect, ProviderError> {
        let mut url = self.domain_url.join("logout")?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("logout_uri", &self.config.redirect_url);

        self.state = AuthState::SignedOut;
        LoggingHelper::log_sign_out_redirect(Provider::Cognito);
        Ok(SignOutRedirect { url })
    }
}
