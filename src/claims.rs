//! ID token claim decoding and the claims table
//!
//! Claims are decoded for display only. The signature is never checked here;
//! the backend verifies the token when it receives it.

use base64::{engine::general_purpose, Engine as _};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum ClaimsError {
    #[error("malformed JWT: expected 3 segments, found {0}")]
    Malformed(usize),
    #[error("JWT payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("JWT payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("JWT payload is not a JSON object")]
    NotAnObject,
}

/// Decode the payload segment of a JWT into its claims
///
/// # Errors
///
/// Returns an error if:
/// - The token does not have exactly three segments
/// - The payload is neither base64url nor padded base64
/// - The payload is not a JSON object
pub fn decode_claims(jwt: &str) -> Result<Map<String, Value>, ClaimsError> {
    let parts: Vec<&str> = jwt.split('.').collect();
    if parts.len() != 3 {
        return Err(ClaimsError::Malformed(parts.len()));
    }

    let payload_b64 = parts[1];
    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .or_else(|_| general_purpose::STANDARD.decode(payload_b64))?;

    match serde_json::from_slice(&payload_bytes)? {
        Value::Object(claims) => Ok(claims),
        _ => Err(ClaimsError::NotAnObject),
    }
}

/// Render a claim value the way a browser's `String(value)` would
#[must_use]
pub fn claim_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                // Array.prototype.join renders null entries as empty strings
                Value::Null => String::new(),
                other => claim_value_to_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Two-column view of token claims, in the order they appear in the token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimsTable {
    rows: Vec<(String, String)>,
}

impl ClaimsTable {
    const KEY_HEADER: &'static str = "Claim";
    const VALUE_HEADER: &'static str = "Value";

    #[must_use]
    pub fn from_claims(claims: &Map<String, Value>) -> Self {
        let rows = claims
            .iter()
            .map(|(key, value)| (key.clone(), claim_value_to_string(value)))
            .collect();
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[(String, String)] {
        &self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for ClaimsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key_width = self
            .rows
            .iter()
            .map(|(key, _)| key.chars().count())
            .chain(std::iter::once(Self::KEY_HEADER.len()))
            .max()
            .unwrap_or_default();

        writeln!(f, "{:<key_width$}  {}", Self::KEY_HEADER, Self::VALUE_HEADER)?;
        writeln!(
            f,
            "{}  {}",
            "-".repeat(key_width),
            "-".repeat(Self::VALUE_HEADER.len())
        )?;
        for (key, value) in &self.rows {
            writeln!(f, "{key:<key_width$}  {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::TestFixtures;
    use serde_json::json;

    #[test]
    fn test_decode_claims_from_unsigned_token() {
        let jwt = TestFixtures::id_token_with_claims(&json!({
            "sub": "user-1",
            "email": "user@example.com",
            "email_verified": true
        }));

        let claims = decode_claims(&jwt).unwrap();
        assert_eq!(claims["sub"], "user-1");
        assert_eq!(claims["email_verified"], true);
    }

    #[test]
    fn test_decode_claims_accepts_padded_base64() {
        let payload = general_purpose::STANDARD.encode(br#"{"sub":"padded"}"#);
        let jwt = format!("e30.{payload}.sig");

        let claims = decode_claims(&jwt).unwrap();
        assert_eq!(claims["sub"], "padded");
    }

    #[test]
    fn test_decode_claims_rejects_wrong_segment_count() {
        assert!(matches!(
            decode_claims("only.two"),
            Err(ClaimsError::Malformed(2))
        ));
        assert!(matches!(decode_claims(""), Err(ClaimsError::Malformed(1))));
    }

    #[test]
    fn test_decode_claims_rejects_non_object_payload() {
        let payload = general_purpose::URL_SAFE_NO_PAD.encode(b"[1,2,3]");
        let jwt = format!("e30.{payload}.sig");
        assert!(matches!(decode_claims(&jwt), Err(ClaimsError::NotAnObject)));
    }

    #[test]
    fn test_decode_claims_rejects_garbage_payload() {
        assert!(matches!(
            decode_claims("e30.!!!.sig"),
            Err(ClaimsError::Base64(_))
        ));
        let payload = general_purpose::URL_SAFE_NO_PAD.encode(b"not json");
        assert!(matches!(
            decode_claims(&format!("e30.{payload}.sig")),
            Err(ClaimsError::Json(_))
        ));
    }

    #[test]
    fn test_claim_values_follow_js_string_conversion() {
        assert_eq!(claim_value_to_string(&json!("text")), "text");
        assert_eq!(claim_value_to_string(&json!(1_700_000_000)), "1700000000");
        assert_eq!(claim_value_to_string(&json!(false)), "false");
        assert_eq!(claim_value_to_string(&json!(null)), "null");
        assert_eq!(claim_value_to_string(&json!(["a", 1, null, true])), "a,1,,true");
        assert_eq!(claim_value_to_string(&json!([["a", "b"], "c"])), "a,b,c");
        assert_eq!(claim_value_to_string(&json!({"k": "v"})), "[object Object]");
    }

    #[test]
    fn test_claims_table_keeps_token_order() {
        let claims = decode_claims(&TestFixtures::id_token_with_claims(&json!({
            "sub": "user-1",
            "aud": "client",
            "cognito:groups": ["admin", "dev"]
        })))
        .unwrap();

        let table = ClaimsTable::from_claims(&claims);
        let keys: Vec<&str> = table.rows().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["sub", "aud", "cognito:groups"]);
        assert_eq!(table.rows()[2].1, "admin,dev");
    }

    #[test]
    fn test_claims_table_display_aligns_columns() {
        let claims = decode_claims(&TestFixtures::id_token_with_claims(&json!({
            "sub": "user-1",
            "token_use": "id"
        })))
        .unwrap();

        let rendered = ClaimsTable::from_claims(&claims).to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Claim      Value");
        assert_eq!(lines[1], "---------  -----");
        assert_eq!(lines[2], "sub        user-1");
        assert_eq!(lines[3], "token_use  id");
    }

    #[test]
    fn test_empty_claims_table_renders_header_only() {
        let table = ClaimsTable::from_claims(&Map::new());
        assert!(table.is_empty());
        assert_eq!(table.to_string().lines().count(), 2);
    }
}
