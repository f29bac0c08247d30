//! Thin per-resource REST wrappers
//!
//! These are external collaborators of the core: request builders that only
//! need a bearer token and a transport. Every call follows the same
//! contract: ensure the authenticator holds a live token, attach it as
//! `x-access-token`, attach tenant scoping when requested, and run the raw
//! response through the error reporter under the configured policy.
//!
//! Tenant scoping is always an explicit, declared `Option<&str>` parameter
//! on operations that can be tenant-scoped; when absent, the config's
//! context resolver supplies a default.

pub mod events;
pub mod users;

use std::sync::Arc;

use crate::authenticator::Authenticator;
use crate::config::{ClientConfig, ServiceKey};
use crate::error::{ClientError, ClientResult};
use crate::reporter::ErrorReporter;
use crate::transport::{HttpRequest, HttpResponse, Transport};

pub use events::{EventTrigger, EventsClient};
pub use users::{User, UsersClient};

/// Shared plumbing composed by every resource client
pub(crate) struct ResourceClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    authenticator: Arc<Authenticator>,
    reporter: Arc<ErrorReporter>,
    service: ServiceKey,
}

impl ResourceClient {
    pub(crate) fn new(
        config: Arc<ClientConfig>,
        transport: Arc<dyn Transport>,
        authenticator: Arc<Authenticator>,
        reporter: Arc<ErrorReporter>,
        service: ServiceKey,
    ) -> Self {
        Self {
            config,
            transport,
            authenticator,
            reporter,
            service,
        }
    }

    /// Base URL of this client's service
    pub(crate) fn service_url(&self) -> String {
        self.config.service_url(self.service)
    }

    /// Execute one request under the resource-client contract
    ///
    /// Returns the raw response after classification so callers can decode
    /// a body on success; on a non-throwing failure the response is
    /// returned as-is and the recorded [`crate::error::ApiError`] is
    /// queryable.
    pub(crate) async fn send(
        &self,
        request: HttpRequest,
        tenant_id: Option<&str>,
    ) -> ClientResult<HttpResponse> {
        self.authenticator.validate_authentication().await?;
        let token = self.authenticator.access_token().await.ok_or_else(|| {
            // Reachable only under the non-throwing policy after a failed
            // exchange; the call cannot proceed without a bearer value.
            ClientError::Authentication("no access token held".to_string())
        })?;

        let mut request = request.header("x-access-token", token.value());

        let tenant = tenant_id
            .map(str::to_string)
            .or_else(|| self.config.resolve_context().tenant_id);
        if let Some(tenant) = tenant {
            request = request.header(self.service.tenant_header(), tenant);
        }

        let response = self.transport.send(request).await?;
        self.reporter
            .classify(&response, self.config.throw_on_error())
            .await?;
        Ok(response)
    }
}
