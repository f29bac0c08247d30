//! Vendor credential exchange and outbound token ownership
//!
//! The authenticator walks Unauthenticated -> Authenticating ->
//! Authenticated -> Expired and back: [`Authenticator::validate_authentication`]
//! is the idempotent entry point resource clients call before every request,
//! and [`Authenticator::authenticate`] performs the actual exchange against
//! the auth plane. The held token is replaced wholesale on refresh.

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::{ClientConfig, ServiceKey};
use crate::error::{ClientError, ClientResult};
use crate::reporter::ErrorReporter;
use crate::token::{AccessToken, TokenType};
use crate::transport::{HttpRequest, Transport};

/// Success body of the credential exchange
#[derive(Debug, Deserialize)]
struct ExchangeResponse {
    token: String,
    #[serde(rename = "expiresIn")]
    expires_in: u64,
}

/// Owns the SDK's own access token and refreshes it when stale
pub struct Authenticator {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    reporter: Arc<ErrorReporter>,
    // Write lock held across the exchange so concurrent refreshes coalesce
    // into a single round trip.
    token: RwLock<Option<AccessToken>>,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    /// Create an authenticator in the unauthenticated state
    pub fn new(
        config: Arc<ClientConfig>,
        transport: Arc<dyn Transport>,
        reporter: Arc<ErrorReporter>,
    ) -> Self {
        Self {
            config,
            transport,
            reporter,
            token: RwLock::new(None),
        }
    }

    /// Exchange the client credentials for a fresh access token
    ///
    /// On success the previous token, if any, is discarded. On a non-2xx
    /// response the failure is routed through the [`ErrorReporter`]:
    /// raised when the config throws on error, otherwise recorded and
    /// signalled by `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Authentication`] for a failed exchange under
    /// the throwing policy, [`ClientError::Transport`] for network faults.
    pub async fn authenticate(&self) -> ClientResult<bool> {
        let mut held = self.token.write().await;
        self.exchange(&mut held).await
    }

    /// Ensure a live token exists, exchanging credentials only when the held
    /// token is absent or expired
    ///
    /// Idempotent; safe to call unconditionally before every outbound
    /// request.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::authenticate`].
    pub async fn validate_authentication(&self) -> ClientResult<bool> {
        {
            let held = self.token.read().await;
            if let Some(token) = held.as_ref() {
                if !token.is_expired() {
                    debug!("Held access token still fresh, skipping exchange");
                    return Ok(true);
                }
            }
        }

        let mut held = self.token.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if let Some(token) = held.as_ref() {
            if !token.is_expired() {
                return Ok(true);
            }
        }
        self.exchange(&mut held).await
    }

    /// The currently held token, if any
    ///
    /// Pure read; never performs I/O. Expired tokens are still returned so
    /// callers can inspect them, but [`Self::validate_authentication`] will
    /// replace them before the next request.
    pub async fn access_token(&self) -> Option<AccessToken> {
        self.token.read().await.clone()
    }

    async fn exchange(&self, held: &mut Option<AccessToken>) -> ClientResult<bool> {
        let url = self.config.authentication_url(ServiceKey::Authentication);
        debug!(url = %url, client_id = self.config.client_id(), "Exchanging vendor credentials");

        let request = HttpRequest::post(
            url,
            json!({
                "clientId": self.config.client_id(),
                "secret": self.config.client_secret().expose_secret(),
            }),
        );
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            // Discard any stale token; a failed refresh must not leave the
            // authenticator claiming to be authenticated.
            *held = None;
            return match self
                .reporter
                .classify(&response, self.config.throw_on_error())
                .await
            {
                Ok(_) => Ok(false),
                Err(ClientError::Api(api_error)) => Err(ClientError::Authentication(format!(
                    "credential exchange failed: {api_error}"
                ))),
                Err(other) => Err(other),
            };
        }

        let exchange: ExchangeResponse = response.json().map_err(|e| {
            ClientError::Authentication(format!("malformed credential exchange response: {e}"))
        })?;

        info!(
            expires_in = exchange.expires_in,
            "Vendor credential exchange succeeded"
        );
        *held = Some(AccessToken::with_ttl(
            exchange.token,
            TokenType::Vendor,
            Duration::from_secs(exchange.expires_in),
        ));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::transport::HttpResponse;

    /// Transport returning canned responses and counting calls
    #[derive(Debug)]
    struct ScriptedTransport {
        responses: std::sync::Mutex<Vec<HttpResponse>>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<HttpResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: std::sync::Mutex::new(responses),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, _request: HttpRequest) -> ClientResult<HttpResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                panic!("transport called more times than scripted");
            }
            Ok(responses.remove(0))
        }
    }

    fn exchange_ok(ttl: u64) -> HttpResponse {
        HttpResponse {
            status: 200,
            body: format!(r#"{{"token": "vendor-token", "expiresIn": {ttl}}}"#),
        }
    }

    fn authenticator(
        transport: Arc<ScriptedTransport>,
        throw_on_error: bool,
    ) -> (Authenticator, Arc<ErrorReporter>) {
        let config = Arc::new(
            ClientConfig::builder("client-1", "secret-1")
                .base_url("https://api.example.com")
                .throw_on_error(throw_on_error)
                .build(),
        );
        let reporter = Arc::new(ErrorReporter::new());
        (
            Authenticator::new(config, transport, Arc::clone(&reporter)),
            reporter,
        )
    }

    #[tokio::test]
    async fn authenticate_stores_a_fresh_token() {
        let transport = ScriptedTransport::new(vec![exchange_ok(3600)]);
        let (authenticator, _) = authenticator(Arc::clone(&transport), true);

        assert!(authenticator.access_token().await.is_none());
        assert!(authenticator.authenticate().await.unwrap());

        let token = authenticator.access_token().await.unwrap();
        assert_eq!(token.value(), "vendor-token");
        assert_eq!(token.token_type(), TokenType::Vendor);
        assert!(!token.is_expired());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn validate_authentication_is_a_noop_while_fresh() {
        let transport = ScriptedTransport::new(vec![exchange_ok(3600)]);
        let (authenticator, _) = authenticator(Arc::clone(&transport), true);

        assert!(authenticator.validate_authentication().await.unwrap());
        assert_eq!(transport.calls(), 1);

        // Token has a 3600s TTL; repeated validation performs no I/O.
        assert!(authenticator.validate_authentication().await.unwrap());
        assert!(authenticator.validate_authentication().await.unwrap());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn validate_authentication_refreshes_an_expired_token() {
        // TTL 0: the stored token is expired by the next call.
        let transport = ScriptedTransport::new(vec![exchange_ok(0), exchange_ok(3600)]);
        let (authenticator, _) = authenticator(Arc::clone(&transport), true);

        assert!(authenticator.validate_authentication().await.unwrap());
        assert_eq!(transport.calls(), 1);

        // Exactly one new exchange, replacing the token wholesale.
        assert!(authenticator.validate_authentication().await.unwrap());
        assert_eq!(transport.calls(), 2);
        let token = authenticator.access_token().await.unwrap();
        assert!(!token.is_expired());
    }

    #[tokio::test]
    async fn failed_exchange_raises_under_throwing_policy() {
        let transport = ScriptedTransport::new(vec![HttpResponse {
            status: 401,
            body: r#"{"message": "invalid client credentials"}"#.to_string(),
        }]);
        let (authenticator, reporter) = authenticator(Arc::clone(&transport), true);

        let err = authenticator.authenticate().await.unwrap_err();
        assert!(matches!(err, ClientError::Authentication(_)));
        assert!(err.to_string().contains("invalid client credentials"));
        assert!(authenticator.access_token().await.is_none());
        // The record is still queryable after the raise.
        assert_eq!(reporter.api_error().await.unwrap().http_status, Some(401));
    }

    #[tokio::test]
    async fn failed_exchange_records_under_non_throwing_policy() {
        let transport = ScriptedTransport::new(vec![HttpResponse {
            status: 503,
            body: String::new(),
        }]);
        let (authenticator, reporter) = authenticator(Arc::clone(&transport), false);

        let ok = authenticator.authenticate().await.unwrap();
        assert!(!ok);
        assert!(authenticator.access_token().await.is_none());

        let api_error = reporter.api_error().await.unwrap();
        assert_eq!(api_error.http_status, Some(503));
        assert_eq!(api_error.message, "unknown error, status=503");
    }

    #[tokio::test]
    async fn concurrent_validation_coalesces_into_one_exchange() {
        let transport = ScriptedTransport::new(vec![exchange_ok(3600)]);
        let (authenticator, _) = authenticator(Arc::clone(&transport), true);
        let authenticator = Arc::new(authenticator);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let authenticator = Arc::clone(&authenticator);
            handles.push(tokio::spawn(async move {
                authenticator.validate_authentication().await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap());
        }
        assert_eq!(transport.calls(), 1);
    }
}
