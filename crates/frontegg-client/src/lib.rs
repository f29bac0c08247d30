//! # frontegg-client - Rust SDK for the Frontegg identity platform
//!
//! Authenticates a host application to the multi-tenant identity platform
//! and validates bearer tokens presented to it.
//!
//! Two independent capabilities make up the core:
//!
//! - **Outbound**: the [`Authenticator`] exchanges the vendor client
//!   credentials for an access token, holds it, and refreshes it when
//!   stale. Resource clients call
//!   [`Authenticator::validate_authentication`] before every request and
//!   read the bearer value for the `x-access-token` header.
//! - **Inbound**: the [`TokenValidator`] cryptographically verifies
//!   third-party-issued JWTs against the vendor's published key set, with
//!   ordered fail-fast gates for expiry, tenant binding, token type, a
//!   fixed `{HS256, RS256}` algorithm allow-list, and signature
//!   verification. It never depends on the authenticator's own token.
//!
//! ## Architecture
//!
//! - [`config`] - immutable settings, closed service-key enumeration, URL
//!   resolution across the API/auth/vendor planes
//! - [`token`] - access-token value object and presented-token claims
//! - [`transport`] - the HTTP seam ([`Transport`]) and the shipped
//!   reqwest-backed [`HttpTransport`]
//! - [`reporter`] - response classification and queryable [`ApiError`]
//!   records under the configurable throw-or-record policy
//! - [`authenticator`] - the credential-exchange state machine
//! - [`jwks`] - vendor key-set resolution with an opt-in bounded-TTL cache
//! - [`validator`] - [`SignatureVerifier`] and [`TokenValidator`]
//! - [`resources`] - thin per-resource REST wrappers (users, events)
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use frontegg_client::{Client, ClientConfig};
//!
//! # tokio_test::block_on(async {
//! let config = ClientConfig::builder("my-client-id", "my-client-secret").build();
//! let client = Client::new(config)?;
//!
//! // Outbound: call the platform as the vendor.
//! let user = client.users().get_user("user-1", Some("tenant-1")).await?;
//!
//! // Inbound: verify a token an end user presented to the host app.
//! let claims = client
//!     .token_validator()
//!     .validate("eyJhbGci...", "tenant-1", "user")
//!     .await?;
//! println!("token subject: {:?}", claims.sub);
//! # Ok::<(), frontegg_client::ClientError>(())
//! # });
//! ```

pub mod authenticator;
pub mod config;
pub mod error;
pub mod jwks;
pub mod reporter;
pub mod resources;
pub mod token;
pub mod transport;
pub mod validator;

use std::sync::Arc;

#[doc(inline)]
pub use authenticator::Authenticator;
#[doc(inline)]
pub use config::{ClientConfig, ClientConfigBuilder, ContextResolver, RequestContext, ServiceKey};
#[doc(inline)]
pub use error::{ApiError, ClientError, ClientResult};
#[doc(inline)]
pub use jwks::KeySetResolver;
#[doc(inline)]
pub use reporter::ErrorReporter;
#[doc(inline)]
pub use resources::{EventsClient, UsersClient};
#[doc(inline)]
pub use token::{AccessToken, TokenClaims, TokenType};
#[doc(inline)]
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport};
#[doc(inline)]
pub use validator::{SignatureVerifier, TokenValidator};

/// Entry point wiring the core components together
///
/// Shares one transport, one authenticator and one error reporter across
/// all resource clients created from it.
pub struct Client {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    authenticator: Arc<Authenticator>,
    reporter: Arc<ErrorReporter>,
    validator: TokenValidator,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client over the default reqwest transport
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the HTTP client cannot be
    /// constructed.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new()?);
        Ok(Self::with_transport(config, transport))
    }

    /// Create a client over a caller-supplied transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let config = Arc::new(config);
        let reporter = Arc::new(ErrorReporter::new());
        let authenticator = Arc::new(Authenticator::new(
            Arc::clone(&config),
            Arc::clone(&transport),
            Arc::clone(&reporter),
        ));
        let resolver = Arc::new(KeySetResolver::new(
            config.jwks_url(),
            Arc::clone(&transport),
        ));
        let validator = TokenValidator::new(resolver);
        Self {
            config,
            transport,
            authenticator,
            reporter,
            validator,
        }
    }

    /// The immutable configuration this client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The credential-exchange state machine
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// The inbound-token validator
    pub fn token_validator(&self) -> &TokenValidator {
        &self.validator
    }

    /// Last recorded API error, when the non-throwing policy is active
    pub async fn api_error(&self) -> Option<ApiError> {
        self.reporter.api_error().await
    }

    /// Client for the users service
    pub fn users(&self) -> UsersClient {
        UsersClient::new(
            Arc::clone(&self.config),
            Arc::clone(&self.transport),
            Arc::clone(&self.authenticator),
            Arc::clone(&self.reporter),
        )
    }

    /// Client for the event-trigger service
    pub fn events(&self) -> EventsClient {
        EventsClient::new(
            Arc::clone(&self.config),
            Arc::clone(&self.transport),
            Arc::clone(&self.authenticator),
            Arc::clone(&self.reporter),
        )
    }
}
