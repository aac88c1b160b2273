//! Mock backend for the sign-in handshake

#![allow(dead_code)]

use idlink::testing::constants::{TEST_CSRF_HEADER, TEST_CSRF_VALUE};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;

pub const CSRF_PATH: &str = "/api/csrf_token";

pub fn login_path(provider: &str) -> String {
    format!("/api/{provider}/login")
}

/// CSRF endpoint answering with the default test header pair
pub async fn mock_csrf_ok(server: &mut ServerGuard, hits: usize) -> Mock {
    server
        .mock("GET", CSRF_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "csrfTokenHeaderName": TEST_CSRF_HEADER,
                "csrfTokenValue": TEST_CSRF_VALUE
            })
            .to_string(),
        )
        .expect(hits)
        .create_async()
        .await
}

/// CSRF endpoint answering with `status` and no token
pub async fn mock_csrf_status(server: &mut ServerGuard, status: usize) -> Mock {
    server
        .mock("GET", CSRF_PATH)
        .with_status(status)
        .expect(1)
        .create_async()
        .await
}

/// Login endpoint that only matches requests carrying the test CSRF header and `id_token`
pub async fn mock_login(
    server: &mut ServerGuard,
    provider: &str,
    id_token: &str,
    status: usize,
    hits: usize,
) -> Mock {
    server
        .mock("POST", login_path(provider).as_str())
        .match_header("content-type", "application/json")
        .match_header(TEST_CSRF_HEADER, TEST_CSRF_VALUE)
        .match_body(Matcher::Json(json!({ "idToken": id_token })))
        .with_status(status)
        .expect(hits)
        .create_async()
        .await
}

/// Catch-all for login requests to any provider
pub async fn mock_any_login(server: &mut ServerGuard, hits: usize) -> Mock {
    server
        .mock("POST", Matcher::Regex(r"^/api/[^/]+/login$".to_string()))
        .expect(hits)
        .create_async()
        .await
}
