//! Backend sign-in handshake
//!
//! Bridges a provider-issued identity token into a backend session using a
//! double-submit CSRF defense:
//!
//! 1. `GET /api/csrf_token` returns the header name and value to echo back.
//! 2. `POST /api/{provider}/login` submits `{"idToken": ...}` with that header.
//!
//! The CSRF token is fetched again on every invocation and never cached. No
//! login request is sent unless step 1 succeeded within the same invocation.

use crate::models::{CsrfToken, LoginRequest, Provider};
use crate::settings::BackendSettings;
use crate::utils::logging::LoggingHelper;
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use std::fmt;
use std::time::Duration;
use url::Url;

const CSRF_TOKEN_PATH: &str = "api/csrf_token";

/// Progress of a single handshake invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStage {
    Idle,
    FetchingCsrf,
    CsrfFailed,
    SubmittingLogin,
    LoginFailed,
    Authenticated,
}

impl fmt::Display for HandshakeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandshakeStage::Idle => "idle",
            HandshakeStage::FetchingCsrf => "fetching CSRF token",
            HandshakeStage::CsrfFailed => "CSRF token fetch failed",
            HandshakeStage::SubmittingLogin => "submitting login",
            HandshakeStage::LoginFailed => "login failed",
            HandshakeStage::Authenticated => "authenticated",
        };
        f.write_str(name)
    }
}

/// Failure category reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendSignInErrorKind {
    MissingIdToken,
    CsrfFetchFailed,
    LoginRejected,
    TransportError,
}

/// Backend sign-in failures
#[derive(Debug, thiserror::Error)]
pub enum BackendSignInError {
    #[error("Backend sign-in requires an identity token")]
    MissingIdToken,

    #[error("Get CSRF token failed: backend responded with {status}")]
    CsrfFetchFailed { status: StatusCode },

    #[error("Login failed: {provider} login rejected with {status}")]
    LoginRejected {
        provider: Provider,
        status: StatusCode,
    },

    #[error("Fetch failed while {stage}: {message}")]
    TransportError {
        stage: HandshakeStage,
        message: String,
    },
}

impl BackendSignInError {
    #[must_use]
    pub fn kind(&self) -> BackendSignInErrorKind {
        match self {
            BackendSignInError::MissingIdToken => BackendSignInErrorKind::MissingIdToken,
            BackendSignInError::CsrfFetchFailed { .. } => BackendSignInErrorKind::CsrfFetchFailed,
            BackendSignInError::LoginRejected { .. } => BackendSignInErrorKind::LoginRejected,
            BackendSignInError::TransportError { .. } => BackendSignInErrorKind::TransportError,
        }
    }

    /// Stage the handshake stopped in
    #[must_use]
    pub fn stage(&self) -> HandshakeStage {
        match self {
            BackendSignInError::MissingIdToken => HandshakeStage::Idle,
            BackendSignInError::CsrfFetchFailed { .. } => HandshakeStage::CsrfFailed,
            BackendSignInError::LoginRejected { .. } => HandshakeStage::LoginFailed,
            BackendSignInError::TransportError { stage, .. } => *stage,
        }
    }

    fn transport(stage: HandshakeStage, err: impl fmt::Display) -> Self {
        BackendSignInError::TransportError {
            stage,
            message: err.to_string(),
        }
    }
}

/// HTTP client for the backend sign-in handshake
///
/// Cloning is cheap; clones share the underlying connection pool. Concurrent
/// invocations are not deduplicated.
#[derive(Debug, Clone)]
pub struct BackendSignIn {
    base_url: Url,
    http_client: reqwest::Client,
}

impl BackendSignIn {
    /// Create a handshake client for the backend at `base_url`
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a handshake client that reuses an existing `reqwest::Client`
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute URL.
    pub fn with_client(base_url: &str, http_client: reqwest::Client) -> Result<Self, url::ParseError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            http_client,
        })
    }

    /// Create a handshake client from backend settings
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn from_settings(settings: &BackendSettings) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = settings.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build()?;
        Ok(Self::with_client(&settings.base_url, http_client)?)
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Run the handshake and report the outcome through callbacks
    ///
    /// Exactly one of `on_success` / `on_failure` is called, exactly once.
    pub async fn sign_in_with<S, F>(
        &self,
        id_token: &str,
        provider: Provider,
        on_success: S,
        on_failure: F,
    ) where
        S: FnOnce(),
        F: FnOnce(String),
    {
        match self.sign_in(id_token, provider).await {
            Ok(()) => on_success(),
            Err(e) => on_failure(e.to_string()),
        }
    }

    /// Establish a backend session for `id_token` issued by `provider`
    ///
    /// The session itself is carried by whatever the backend sets out of band
    /// (typically a cookie); nothing is returned on success.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `id_token` is empty (no request is sent)
    /// - The CSRF token endpoint responds with a non-success status
    /// - The login endpoint responds with a non-success status
    /// - Either request fails in transport, or the CSRF response cannot be read
    pub async fn sign_in(&self, id_token: &str, provider: Provider) -> Result<(), BackendSignInError> {
        if id_token.is_empty() {
            return Err(BackendSignInError::MissingIdToken);
        }

        let result = self.run(id_token, provider).await;
        match &result {
            Ok(()) => LoggingHelper::log_backend_sign_in_success(provider),
            Err(e) => LoggingHelper::log_backend_sign_in_failure(provider, e),
        }
        result
    }

    async fn run(&self, id_token: &str, provider: Provider) -> Result<(), BackendSignInError> {
        LoggingHelper::log_handshake_stage(provider, HandshakeStage::FetchingCsrf);
        let csrf_token = self.fetch_csrf_token().await?;

        LoggingHelper::log_handshake_stage(provider, HandshakeStage::SubmittingLogin);
        self.submit_login(id_token, provider, &csrf_token).await?;

        LoggingHelper::log_handshake_stage(provider, HandshakeStage::Authenticated);
        Ok(())
    }

    async fn fetch_csrf_token(&self) -> Result<CsrfToken, BackendSignInError> {
        let stage = HandshakeStage::FetchingCsrf;
        let url = self
            .base_url
            .join(CSRF_TOKEN_PATH)
            .map_err(|e| BackendSignInError::transport(stage, e))?;

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| BackendSignInError::transport(stage, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendSignInError::CsrfFetchFailed { status });
        }

        let csrf_token: CsrfToken = response
            .json()
            .await
            .map_err(|e| BackendSignInError::transport(stage, e))?;

        LoggingHelper::log_csrf_token_received(&csrf_token);
        Ok(csrf_token)
    }

    async fn submit_login(
        &self,
        id_token: &str,
        provider: Provider,
        csrf_token: &CsrfToken,
    ) -> Result<(), BackendSignInError> {
        let stage = HandshakeStage::SubmittingLogin;
        let url = self
            .base_url
            .join(&format!("api/{}/login", provider.as_str()))
            .map_err(|e| BackendSignInError::transport(stage, e))?;

        let header_name = HeaderName::from_bytes(csrf_token.header_name.as_bytes())
            .map_err(|e| BackendSignInError::transport(stage, e))?;
        let header_value = HeaderValue::from_str(&csrf_token.header_value)
            .map_err(|e| BackendSignInError::transport(stage, e))?;

        let response = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(header_name, header_value)
            .json(&LoginRequest { id_token })
            .send()
            .await
            .map_err(|e| BackendSignInError::transport(stage, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendSignInError::LoginRejected { provider, status });
        }
        Ok(())
    }
}

/// `Url::join` drops the last path segment unless the base ends with `/`
fn normalize_base_url(base_url: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
