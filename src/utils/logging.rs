// Centralized logging so token material is handled the same way everywhere
use crate::handshake::{BackendSignInError, HandshakeStage};
use crate::models::{CsrfToken, IdentityToken, Provider};
use log::{debug, error, info, warn};

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log provider initialization
    pub fn log_provider_initialized(provider: Provider, authority: &str) {
        info!("✅ {} configured ({authority})", provider.display_name());
    }

    /// Log a built sign-in redirect
    pub fn log_sign_in_redirect(provider: Provider, scopes: &[String]) {
        info!(
            "🔍 Built {} sign-in redirect with scopes: {}",
            provider.display_name(),
            scopes.join(" ")
        );
    }

    /// Log a built sign-out redirect
    pub fn log_sign_out_redirect(provider: Provider) {
        info!("🔍 Built {} sign-out redirect", provider.display_name());
    }

    /// Log an accepted identity token (subject and expiry only)
    pub fn log_identity_token_accepted(provider: Provider, token: &IdentityToken) {
        info!(
            "Identity token accepted from {}: sub={}, exp={:?}",
            provider.display_name(),
            token.subject().unwrap_or("<none>"),
            token.expires_at()
        );
        debug!("Identity token carries {} claims", token.claims.len());
    }

    /// Log a failed silent token acquisition
    pub fn log_refresh_failed(provider: Provider, reason: &str) {
        warn!(
            "⚠️  {} token acquisition failed: {reason}",
            provider.display_name()
        );
    }

    /// Log handshake stage transitions
    pub fn log_handshake_stage(provider: Provider, stage: HandshakeStage) {
        debug!("Backend sign-in ({provider}): {stage}");
    }

    /// Log the received CSRF header name; the value stays out of the logs
    pub fn log_csrf_token_received(csrf_token: &CsrfToken) {
        debug!(
            "Received CSRF token for header {}",
            csrf_token.header_name
        );
    }

    /// Log backend sign-in success
    pub fn log_backend_sign_in_success(provider: Provider) {
        info!("🎯 Signed in to backend with {} identity token", provider.display_name());
    }

    /// Log backend sign-in failure
    pub fn log_backend_sign_in_failure(provider: Provider, err: &BackendSignInError) {
        error!("❌ Backend sign-in with {} failed: {err}", provider.display_name());
    }
}
