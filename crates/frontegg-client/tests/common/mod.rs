//! Common test utilities
//!
//! A scripted, call-counting [`MockTransport`] for call-count assertions,
//! plus HS256 token-minting helpers for exercising the validator end to end.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;

use frontegg_client::{ClientResult, HttpRequest, HttpResponse, Transport};

/// Shared HS256 signing secret for minted test tokens
pub const TEST_SECRET: &[u8] = b"test_secret_key_at_least_32_bytes_long_12345678";

/// kid published for the test secret
pub const TEST_KID: &str = "test-key-1";

/// Current unix timestamp in seconds
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// JWKS body publishing [`TEST_SECRET`] as an oct key under [`TEST_KID`]
pub fn test_jwks_body() -> serde_json::Value {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    json!({
        "keys": [{
            "kty": "oct",
            "kid": TEST_KID,
            "alg": "HS256",
            "k": URL_SAFE_NO_PAD.encode(TEST_SECRET),
        }]
    })
}

/// Mint an HS256 token with the given claims and header kid
pub fn mint_token(kid: Option<&str>, exp: u64, tenant_id: &str, token_type: &str) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = kid.map(str::to_string);
    let claims = json!({
        "exp": exp,
        "tenantId": tenant_id,
        "type": token_type,
        "sub": "user-1",
    });
    encode(&header, &claims, &EncodingKey::from_secret(TEST_SECRET)).expect("failed to mint token")
}

/// Transport routing requests by URL with per-endpoint call counters
#[derive(Debug, Default)]
pub struct MockTransport {
    auth_response: Mutex<Option<HttpResponse>>,
    jwks_response: Mutex<Option<HttpResponse>>,
    resource_responses: Mutex<Vec<HttpResponse>>,
    pub auth_calls: AtomicUsize,
    pub jwks_calls: AtomicUsize,
    pub resource_calls: AtomicUsize,
    seen_requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Respond to credential exchanges with a token and TTL
    pub fn with_auth_success(self: Arc<Self>, ttl: u64) -> Arc<Self> {
        *self.auth_response.lock().unwrap() = Some(HttpResponse {
            status: 200,
            body: format!(r#"{{"token": "vendor-token", "expiresIn": {ttl}}}"#),
        });
        self
    }

    /// Respond to credential exchanges with a failure
    pub fn with_auth_failure(self: Arc<Self>, status: u16, body: &str) -> Arc<Self> {
        *self.auth_response.lock().unwrap() = Some(HttpResponse {
            status,
            body: body.to_string(),
        });
        self
    }

    /// Publish the standard test key set
    pub fn with_test_jwks(self: Arc<Self>) -> Arc<Self> {
        *self.jwks_response.lock().unwrap() = Some(HttpResponse {
            status: 200,
            body: test_jwks_body().to_string(),
        });
        self
    }

    /// Respond to key-set fetches with an arbitrary response
    pub fn with_jwks_response(self: Arc<Self>, status: u16, body: serde_json::Value) -> Arc<Self> {
        *self.jwks_response.lock().unwrap() = Some(HttpResponse {
            status,
            body: body.to_string(),
        });
        self
    }

    /// Queue a response for the next resource call
    pub fn push_resource_response(&self, status: u16, body: &str) {
        self.resource_responses.lock().unwrap().push(HttpResponse {
            status,
            body: body.to_string(),
        });
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn jwks_calls(&self) -> usize {
        self.jwks_calls.load(Ordering::SeqCst)
    }

    pub fn resource_calls(&self) -> usize {
        self.resource_calls.load(Ordering::SeqCst)
    }

    /// Requests observed so far, in order
    pub fn seen_requests(&self) -> Vec<HttpRequest> {
        self.seen_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        self.seen_requests.lock().unwrap().push(request.clone());

        if request.url.contains("/auth/vendor") {
            self.auth_calls.fetch_add(1, Ordering::SeqCst);
            return Ok(self
                .auth_response
                .lock()
                .unwrap()
                .clone()
                .expect("no auth response scripted"));
        }
        if request.url.contains("/.well-known/jwks.json") {
            self.jwks_calls.fetch_add(1, Ordering::SeqCst);
            return Ok(self
                .jwks_response
                .lock()
                .unwrap()
                .clone()
                .expect("no jwks response scripted"));
        }

        self.resource_calls.fetch_add(1, Ordering::SeqCst);
        let mut queued = self.resource_responses.lock().unwrap();
        assert!(!queued.is_empty(), "no resource response scripted for {}", request.url);
        Ok(queued.remove(0))
    }
}
