//! Error taxonomy for backend calls.
//!
//! Every failure a caller can see from the API client or the query layer is
//! one of these variants. All variants carry owned strings so results can be
//! fanned out to deduplicated waiters by clone.

use serde::Deserialize;
use thiserror::Error;

/// A failure from the remote API or the transport underneath it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The authenticate endpoint rejected the credentials. Surfaced to the
    /// login form; never triggers session teardown.
    #[error("credenciais inválidas: {0}")]
    InvalidCredentials(String),

    /// A non-login endpoint rejected the session token. The client has
    /// already torn the session down by the time this is returned.
    #[error("sessão expirada")]
    SessionExpired,

    /// 404 for the requested resource.
    #[error("não encontrado: {0}")]
    NotFound(String),

    /// 409 from the backend, e.g. a duplicate email on create. Carries the
    /// backend's own message.
    #[error("conflito: {0}")]
    Conflict(String),

    /// Any other non-2xx response.
    #[error("erro da API ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure (connection refused, timeout, DNS).
    #[error("falha de rede: {0}")]
    Network(String),

    /// The response body did not match the expected shape.
    #[error("resposta inesperada: {0}")]
    Decode(String),
}

impl ApiError {
    /// Read fetches get one transparent retry for these.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Error envelope the backend returns on failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Extract a human-readable message from a raw error body, falling back to
/// the body text itself.
fn message_from_body(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Map a non-success response to an [`ApiError`].
///
/// `is_login` marks the authenticate call: its 401 means bad credentials,
/// everyone else's 401 means the session is no longer accepted.
pub(crate) fn map_failure(status: u16, body: &str, is_login: bool) -> ApiError {
    let message = message_from_body(body);
    match status {
        401 if is_login => ApiError::InvalidCredentials(if message.is_empty() {
            "email ou senha incorretos".to_string()
        } else {
            message
        }),
        401 => ApiError::SessionExpired,
        404 => ApiError::NotFound(message),
        409 => ApiError::Conflict(message),
        _ => ApiError::Api { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_401_is_invalid_credentials() {
        let err = map_failure(401, r#"{"message":"Usuário ou senha inválidos"}"#, true);
        assert_eq!(
            err,
            ApiError::InvalidCredentials("Usuário ou senha inválidos".into())
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_non_login_401_is_session_expired() {
        assert_eq!(map_failure(401, "", false), ApiError::SessionExpired);
    }

    #[test]
    fn test_conflict_carries_backend_message() {
        let err = map_failure(409, r#"{"message":"Email ana@x.com já cadastrado"}"#, false);
        assert_eq!(err, ApiError::Conflict("Email ana@x.com já cadastrado".into()));
    }

    #[test]
    fn test_unknown_status_keeps_status_and_body() {
        let err = map_failure(500, "boom", false);
        assert_eq!(
            err,
            ApiError::Api {
                status: 500,
                message: "boom".into()
            }
        );
    }

    #[test]
    fn test_error_key_fallback() {
        let err = map_failure(404, r#"{"error":"Motorista não encontrado"}"#, false);
        assert_eq!(err, ApiError::NotFound("Motorista não encontrado".into()));
    }

    #[test]
    fn test_only_network_errors_retry() {
        assert!(ApiError::Network("connection refused".into()).is_retryable());
        assert!(!ApiError::SessionExpired.is_retryable());
        assert!(!ApiError::Conflict("dup".into()).is_retryable());
        assert!(!ApiError::Decode("bad json".into()).is_retryable());
    }
}
