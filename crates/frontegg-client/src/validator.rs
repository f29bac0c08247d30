//! Inbound token validation
//!
//! [`TokenValidator`] verifies third-party-presented JWTs against the
//! vendor's published key set. Validation is a sequence of ordered,
//! fail-fast gates, each short-circuiting with its own error:
//!
//! 1. structural parse of the compact form
//! 2. expiry (before any network access)
//! 3. tenant binding
//! 4. type binding
//! 5. algorithm allow-list (before the key fetch, so an attacker-chosen
//!    `alg` never drives a network call)
//! 6. key resolution by `kid`
//! 7. signature verification
//!
//! Independent of the authenticator's own token state; stateless and safe to
//! call concurrently.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::{debug, error};

use crate::error::{ClientError, ClientResult};
use crate::jwks::KeySetResolver;
use crate::token::{unix_now, TokenClaims};

/// Raw JWT header, parsed before any algorithm name is trusted
///
/// Parsed by hand rather than through `jsonwebtoken::decode_header` so an
/// unknown `alg` value (`none`, `ES256`, ...) is reportable as
/// [`ClientError::UnsupportedAlgorithm`] instead of a parse failure.
#[derive(Debug, Deserialize)]
struct RawHeader {
    alg: String,
    #[serde(default)]
    kid: Option<String>,
}

/// Validates signatures against a fixed algorithm allow-list
///
/// The allow-list is exactly `{HS256, RS256}`. It is an explicit match, not
/// a lookup table keyed by attacker-controlled input, which closes the
/// algorithm-confusion family of attacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureVerifier;

impl SignatureVerifier {
    /// Resolve an algorithm name from a token header against the allow-list
    ///
    /// Comparison is case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UnsupportedAlgorithm`] for any name outside
    /// the allow-list, including `none`.
    pub fn resolve_algorithm(&self, name: &str) -> ClientResult<Algorithm> {
        match name.to_ascii_uppercase().as_str() {
            "HS256" => Ok(Algorithm::HS256),
            "RS256" => Ok(Algorithm::RS256),
            _ => {
                error!(alg = name, "Token algorithm outside the allow-list");
                Err(ClientError::UnsupportedAlgorithm {
                    alg: name.to_string(),
                })
            }
        }
    }

    /// Verify the signature over the token's header+payload
    ///
    /// The validator's ordered gates have already checked expiry, tenant and
    /// type, so every claim-level check is disabled here; this step is pure
    /// signature cryptography.
    ///
    /// The underlying verifier re-parses the header and matches the `alg`
    /// name case-sensitively, so a non-standard lowercase spelling (for
    /// example `"rs256"`) that passed [`Self::resolve_algorithm`] still
    /// fails here. Standard JOSE headers are always uppercase.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::SignatureVerification`] both for an invalid
    /// signature and for any verifier-internal fault (unusable key
    /// material). Never coerced to a silent false.
    pub fn verify(
        &self,
        token: &str,
        algorithm: Algorithm,
        key: &jsonwebtoken::jwk::Jwk,
    ) -> ClientResult<TokenClaims> {
        let decoding_key = DecodingKey::from_jwk(key).map_err(|e| {
            error!(error = %e, "Unusable key material in vendor key set");
            ClientError::SignatureVerification(format!("unusable verification key: {e}"))
        })?;

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims::<&str>(&[]);

        decode::<TokenClaims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                error!(error = %e, "Token signature rejected");
                ClientError::SignatureVerification(e.to_string())
            })
    }
}

/// Validates third-party-presented tokens for a host application
pub struct TokenValidator {
    resolver: Arc<KeySetResolver>,
    verifier: SignatureVerifier,
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidator")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl TokenValidator {
    /// Create a validator reading keys through the given resolver
    pub fn new(resolver: Arc<KeySetResolver>) -> Self {
        Self {
            resolver,
            verifier: SignatureVerifier,
        }
    }

    /// Validate a presented token against an expected tenant and token type
    ///
    /// Runs the ordered gates described at the module level. `Ok` carries
    /// the parsed claims and is the only "valid" outcome; every failure is a
    /// distinct [`ClientError`] variant and is never downgraded or retried.
    ///
    /// # Errors
    ///
    /// One of [`ClientError::MalformedToken`], [`ClientError::ExpiredToken`],
    /// [`ClientError::TenantMismatch`], [`ClientError::WrongTokenType`],
    /// [`ClientError::UnsupportedAlgorithm`], [`ClientError::KeyFetch`],
    /// [`ClientError::KeyNotFound`], [`ClientError::SignatureVerification`],
    /// or [`ClientError::Transport`] from the key fetch.
    pub async fn validate(
        &self,
        token: &str,
        expected_tenant: &str,
        expected_type: &str,
    ) -> ClientResult<TokenClaims> {
        // Gate 1: structural parse.
        let (header, claims) = Self::parse(token)?;
        let kid = header.kid.ok_or_else(|| {
            ClientError::MalformedToken("header is missing the kid field".to_string())
        })?;

        // Gate 2: expiry, strictly before any network access.
        let now = unix_now();
        if claims.exp <= now {
            debug!(exp = claims.exp, now, "Rejecting expired token");
            return Err(ClientError::ExpiredToken {
                expired_at: claims.exp,
            });
        }

        // Gate 3: tenant binding. Blocks cross-tenant replay.
        if claims.tenant_id != expected_tenant {
            error!(
                expected = expected_tenant,
                actual = %claims.tenant_id,
                "Token bound to a different tenant"
            );
            return Err(ClientError::TenantMismatch {
                expected: expected_tenant.to_string(),
                actual: claims.tenant_id,
            });
        }

        // Gate 4: type binding.
        if claims.token_type != expected_type {
            return Err(ClientError::WrongTokenType {
                expected: expected_type.to_string(),
                actual: claims.token_type,
            });
        }

        // Gate 5: algorithm allow-list, before the key-set endpoint is ever
        // touched.
        let algorithm = self.verifier.resolve_algorithm(&header.alg)?;

        // Gate 6: key resolution by kid.
        let key = self.resolver.resolve(&kid).await?;

        // Gate 7: signature verification.
        let mut verified = self.verifier.verify(token, algorithm, &key)?;

        debug!(
            tenant = expected_tenant,
            token_type = expected_type,
            kid = %kid,
            "Token validated"
        );
        verified.kid = kid;
        verified.alg = header.alg;
        Ok(verified)
    }

    /// Split the compact form and decode header and payload
    fn parse(token: &str) -> ClientResult<(RawHeader, TokenClaims)> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 || parts.iter().any(|part| part.is_empty()) {
            return Err(ClientError::MalformedToken(
                "token is not in three-part compact form".to_string(),
            ));
        }

        let header_bytes = URL_SAFE_NO_PAD
            .decode(parts[0])
            .map_err(|e| ClientError::MalformedToken(format!("header encoding: {e}")))?;
        let header: RawHeader = serde_json::from_slice(&header_bytes)
            .map_err(|e| ClientError::MalformedToken(format!("header: {e}")))?;

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|e| ClientError::MalformedToken(format!("payload encoding: {e}")))?;
        let claims: TokenClaims = serde_json::from_slice(&payload_bytes)
            .map_err(|e| ClientError::MalformedToken(format!("claims: {e}")))?;

        Ok((header, claims))
    }
}
