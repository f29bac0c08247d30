//! SDK error types
//!
//! Token-validation failures each get their own variant so callers can tell
//! a replayed-tenant token apart from a stale one or a bad signature. None of
//! them are ever collapsed into a generic "invalid token".

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error extracted from a non-2xx platform response
///
/// Stored by [`crate::reporter::ErrorReporter`] and queryable after a
/// non-throwing failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    /// Platform error code, when the response body carried one
    pub code: String,
    /// Human-readable message (see [`crate::reporter::ErrorReporter`] for
    /// the extraction priority)
    pub message: String,
    /// HTTP status of the failed response
    pub http_status: Option<u16>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.http_status {
            Some(status) => write!(f, "[{}] {} (status {})", self.code, self.message, status),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// Errors produced by the SDK core
#[derive(Error, Debug)]
pub enum ClientError {
    /// Unknown service key or otherwise unusable configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Credential exchange failed, or a call required a token the SDK does
    /// not hold
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Presented token is not a well-formed compact JWT
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// Presented token's `exp` claim is in the past
    #[error("Token expired at unix timestamp {expired_at}")]
    ExpiredToken {
        /// The `exp` claim value
        expired_at: u64,
    },

    /// Presented token is bound to a different tenant than expected
    #[error("Token is bound to tenant '{actual}', expected '{expected}'")]
    TenantMismatch {
        /// Tenant the caller expected
        expected: String,
        /// Tenant the token is actually bound to
        actual: String,
    },

    /// Presented token carries a different `type` claim than expected
    #[error("Token is of type '{actual}', expected '{expected}'")]
    WrongTokenType {
        /// Type the caller expected
        expected: String,
        /// Type the token actually carries
        actual: String,
    },

    /// The vendor key-set endpoint could not be fetched or parsed
    #[error("Key set fetch failed: {0}")]
    KeyFetch(String),

    /// No key in the fetched key set matches the token's `kid`
    #[error("No key with kid '{kid}' in the vendor key set")]
    KeyNotFound {
        /// The key identifier from the token header
        kid: String,
    },

    /// Token header `alg` is outside the fixed allow-list
    #[error("Unsupported signing algorithm '{alg}' (allowed: HS256, RS256)")]
    UnsupportedAlgorithm {
        /// The algorithm name from the token header
        alg: String,
    },

    /// Signature did not verify, or the verifier itself faulted
    #[error("Signature verification failed: {0}")]
    SignatureVerification(String),

    /// Non-2xx response from a resource or auth-plane call (throwing policy)
    #[error("API error: {0}")]
    Api(ApiError),

    /// Network-level transport failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed JSON in a response body the SDK had to decode
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for SDK operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_status() {
        let err = ApiError {
            code: "not_found".to_string(),
            message: "user does not exist".to_string(),
            http_status: Some(404),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("not_found"));
        assert!(rendered.contains("404"));
    }

    #[test]
    fn validation_errors_are_distinct() {
        let tenant = ClientError::TenantMismatch {
            expected: "t1".to_string(),
            actual: "t2".to_string(),
        };
        let alg = ClientError::UnsupportedAlgorithm {
            alg: "none".to_string(),
        };
        assert!(tenant.to_string().contains("t2"));
        assert!(alg.to_string().contains("none"));
        assert!(!matches!(tenant, ClientError::WrongTokenType { .. }));
    }
}
