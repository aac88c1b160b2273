//! Testing utilities for idlink
//!
//! Shared by the unit tests in each module and by the integration tests in
//! `tests/` (enable the `testing` feature for the latter).
//!
//! - [`fixtures`] - unsigned identity tokens, provider configs and settings
//!
//! ```ignore
//! use idlink::testing::fixtures::TestFixtures;
//!
//! let token = TestFixtures::identity_token();
//! assert_eq!(token.subject(), Some(idlink::testing::constants::TEST_SUBJECT));
//! ```

pub mod fixtures;

pub use fixtures::TestFixtures;

/// Common test constants
pub mod constants {
    /// Subject of the default test identity token
    pub const TEST_SUBJECT: &str = "3f6c2a1e-5b7d-4e0a-9c8f-1a2b3c4d5e6f";

    /// Email of the default test identity token
    pub const TEST_EMAIL: &str = "test@example.com";

    /// CSRF header name the test backend hands out
    pub const TEST_CSRF_HEADER: &str = "X-CSRF-Token";

    /// CSRF header value the test backend hands out
    pub const TEST_CSRF_VALUE: &str = "abc123";
}
