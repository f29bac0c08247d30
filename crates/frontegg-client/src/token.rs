//! Access tokens and presented-token claims

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Kind of token the platform issues
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TokenType {
    /// Vendor-level token obtained through the client-credential exchange
    #[serde(rename = "vendor")]
    Vendor,
    /// End-user token issued by the hosted login
    #[serde(rename = "user")]
    User,
    /// Tenant-scoped API token
    #[serde(rename = "tenantApiToken")]
    TenantApi,
}

impl TokenType {
    /// Wire name of this token type, as it appears in the `type` claim
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vendor => "vendor",
            Self::User => "user",
            Self::TenantApi => "tenantApiToken",
        }
    }
}

/// The SDK's own outbound access token
///
/// Exclusively owned by the [`crate::authenticator::Authenticator`] that
/// created it. Replaced wholesale on refresh, never mutated field-by-field.
#[derive(Debug, Clone)]
pub struct AccessToken {
    value: String,
    token_type: TokenType,
    expires_at: SystemTime,
}

impl AccessToken {
    /// Create a token expiring at an absolute instant
    pub fn new(value: String, token_type: TokenType, expires_at: SystemTime) -> Self {
        Self {
            value,
            token_type,
            expires_at,
        }
    }

    /// Create a token from a value and a time-to-live, as returned by the
    /// credential exchange
    pub fn with_ttl(value: String, token_type: TokenType, ttl: Duration) -> Self {
        Self::new(value, token_type, SystemTime::now() + ttl)
    }

    /// The raw bearer value for the `x-access-token` header
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Kind of token this is
    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    /// Absolute expiry instant
    pub fn expires_at(&self) -> SystemTime {
        self.expires_at
    }

    /// A token is expired once the current time reaches `expires_at`
    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }
}

/// Claims parsed from a presented JWT payload, plus the header fields the
/// validator needs
///
/// Transient: scoped to a single validation call, never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    /// Expiry as unix seconds; tokens are valid strictly before this instant
    pub exp: u64,
    /// Tenant the token is bound to
    #[serde(rename = "tenantId")]
    pub tenant_id: String,
    /// Token type as issued (`vendor`, `user`, `tenantApiToken`)
    #[serde(rename = "type")]
    pub token_type: String,
    /// Subject, when the issuer included one
    #[serde(default)]
    pub sub: Option<String>,
    /// Key identifier from the token header (filled in by the validator)
    #[serde(skip)]
    pub kid: String,
    /// Algorithm name from the token header (filled in by the validator)
    #[serde(skip)]
    pub alg: String,
}

/// Current unix timestamp in seconds
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_not_expired() {
        let token = AccessToken::with_ttl(
            "tok".to_string(),
            TokenType::Vendor,
            Duration::from_secs(3600),
        );
        assert!(!token.is_expired());
        assert_eq!(token.value(), "tok");
        assert_eq!(token.token_type(), TokenType::Vendor);
    }

    #[test]
    fn token_at_or_past_expiry_is_expired() {
        let token = AccessToken::new(
            "tok".to_string(),
            TokenType::Vendor,
            SystemTime::now() - Duration::from_secs(1),
        );
        assert!(token.is_expired());
    }

    #[test]
    fn claims_deserialize_wire_names() {
        let claims: TokenClaims = serde_json::from_str(
            r#"{"exp": 4102444800, "tenantId": "acme", "type": "user", "sub": "u-1"}"#,
        )
        .unwrap();
        assert_eq!(claims.tenant_id, "acme");
        assert_eq!(claims.token_type, "user");
        assert_eq!(claims.sub.as_deref(), Some("u-1"));
    }

    #[test]
    fn token_type_wire_names() {
        assert_eq!(TokenType::TenantApi.as_str(), "tenantApiToken");
        assert_eq!(TokenType::Vendor.as_str(), "vendor");
    }
}
