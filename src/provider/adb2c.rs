//! Azure AD B2C tenant with a sign-in user flow

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
pub struct Adb2cConfig {
    /// Tenant name without the `.onmicrosoft.com` suffix
    pub tenant: String,
    pub application_id: String,
    /// User flow, e.g. `B2C_1_signin`
    pub signin_policy: String,
    pub redirect_url: String,
    pub scopes: Vec<String>,
}

impl Default for Adb2cConfig {
    fn default() -> Self {
        Self {
            tenant: String::new(),
            application_id: String::new(),
            signin_policy: String::new(),
            redirect_url: String::new(),
            scopes: default_scopes(),
        }
    }
}

#[derive(Debug)]
pub struct Adb2cProvider {
    config: Adb2cConfig,
    authority: Url,
    state: AuthState,
}

impl Adb2cProvider {
    /// Validate `config` and create a signed-out provider
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is empty, no scope is configured,
    /// or the authority / redirect URL do not parse.
    pub fn init(config: Adb2cConfig) -> Result<Self, ProviderError> {
        let provider = Provider::Adb2c;
        require("tenant", &config.tenant, provider)?;
        require("application_id", &config.application_id, provider)?;
        require("signin_policy", &config.signin_policy, provider)?;
        require("redirect_url", &config.redirect_url, provider)?;
        if config.scopes.is_empty() {
            return Err(ProviderError::Configuration(format!(
                "No scopes configured for provider {provider}"
            )));
        }
        Url::parse(&config.redirect_url)?;

        // Trailing slash so endpoint paths join under the policy segment
        let authority = Url::parse(&format!(
            "https://{tenant}.b2clogin.com/{tenant}.onmicrosoft.com/{policy}/",
            tenant = config.tenant,
            policy = config.signin_policy
        ))?;

        let adb2c = Self {
            config,
            authority,
            state: AuthState::SignedOut,
        };
        LoggingHelper::log_provider_initialized(provider, &adb2c.authority());
        Ok(adb2c)
    }

    /// Authority URL of the sign-in user flow
    #[must_use]
    pub fn authority(&self) -> String {
        self.authority.as_str().trim_end_matches('/').to_string()
    }

    /// The only host tokens and redirects are expected from
    #[must_use]
    pub fn known_authority(&self) -> String {
        format!("{}.b2clogin.com", self.config.tenant)
    }

    #[must_use]
    pub fn config(&self) -> &Adb2cConfig {
        &self.config
    }
}

impl IdentityProvider for Adb2cProvider {
    fn provider(&self) -> Provider {
        Provider::Adb2c
    }

    fn auth_state(&self) -> &AuthState {
        &self.state
    }

    fn sign_in(&mut self) -> Result<SignInRedirect, ProviderError> {
        let state = generate_state();
        let mut url = self.authority.join("oauth2/v2.0/authorize")?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.application_id)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("redirect_uri", &self.config.redirect_url)
            .append_pair("response_mode", "fragment")
            .append_pair("state", &state);

        LoggingHelper::log_sign_in_redirect(Provider::Adb2c, &self.config.scopes);
        Ok(SignInRedirect { url, state })
    }

    fn complete_sign_in(&mut self, jwt: &str) -> Result<IdentityToken, ProviderError> {
        accept_identity_token(Provider::Adb2c, &mut self.state, jwt)
    }

    fn refresh_failed(&mut self, reason: &str) {
        mark_refresh_failed(Provider::Adb2c, &mut self.state, reason);
    }

    fn sign_out(&mut self) -> Result<SignOutRedirect, ProviderError> {
        let mut url = self.authority.join("oauth2/v2.0/logout")?;
        url.query_pairs_mut()
            .append_pair("post_logout_redirect_uri", &self.config.redirect_url);

        self.state = AuthState::SignedOut;
        LoggingHelper::log_sign_out_redirect(Provider::Adb2c);
        Ok(SignOutRedirect { url })
    }
}
