#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the idlink application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod claims;
pub mod handshake;
pub mod models;
pub mod page;
pub mod provider;
pub mod settings;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use claims::ClaimsTable;
pub use handshake::{BackendSignIn, BackendSignInError, BackendSignInErrorKind, HandshakeStage};
pub use models::{AuthState, BackendSessionState, CsrfToken, IdentityToken, Provider};
pub use page::{PageError, ProviderChoice, ProviderPage};
pub use provider::{init_provider, IdentityProvider, ProviderError};
pub use settings::IdlinkSettings;
