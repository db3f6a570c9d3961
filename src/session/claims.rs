//! Identity derivation from a login token.
//!
//! The backend issues a JWT whose payload carries the user claims. The
//! client never holds the signing key, so the payload is read without
//! signature verification, exactly as the server-rendered identity is
//! trusted over TLS. Decoding is a pure function of the token and the email
//! the user submitted, which keeps the fallback chain unit-testable.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use crate::api::ApiError;
use crate::model::{Role, User};

#[derive(Debug, Deserialize)]
struct TokenClaims {
    /// Backend user id. Some token issuers emit it as a number.
    #[serde(default)]
    user: Option<serde_json::Value>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// Derive the authenticated identity from a token's claims.
///
/// Fallback rules:
/// - id: `user` claim, empty string when absent
/// - email: `sub` claim, else the submitted email
/// - display name: `name` claim, else the submitted email's local part
/// - role: `scope` claim with the `ROLE_` prefix stripped, else USUARIO
pub fn identity_from_token(token: &str, submitted_email: &str) -> Result<User, ApiError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| ApiError::Decode("token sem payload".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| ApiError::Decode(format!("payload do token não é base64url: {e}")))?;
    let claims: TokenClaims = serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::Decode(format!("claims do token inválidas: {e}")))?;

    let id = match claims.user {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    let email = claims
        .sub
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| submitted_email.to_string());
    let nome = claims.name.filter(|s| !s.is_empty()).unwrap_or_else(|| {
        submitted_email
            .split('@')
            .next()
            .unwrap_or(submitted_email)
            .to_string()
    });
    let role = Role::from_scope(claims.scope.as_deref());

    Ok(User {
        id,
        email,
        nome,
        role,
    })
}
