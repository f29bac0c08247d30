//! Event triggering

use std::sync::Arc;

use serde::Serialize;

use super::ResourceClient;
use crate::authenticator::Authenticator;
use crate::config::{ClientConfig, ServiceKey};
use crate::error::ClientResult;
use crate::reporter::ErrorReporter;
use crate::transport::{HttpRequest, Transport};

/// An event to trigger on the platform
#[derive(Debug, Clone, Serialize)]
pub struct EventTrigger {
    /// Event key registered with the platform
    #[serde(rename = "eventKey")]
    pub event_key: String,
    /// Free-form event payload
    pub data: serde_json::Value,
}

/// Thin client for the event-trigger service
pub struct EventsClient {
    inner: ResourceClient,
}

impl EventsClient {
    pub(crate) fn new(
        config: Arc<ClientConfig>,
        transport: Arc<dyn Transport>,
        authenticator: Arc<Authenticator>,
        reporter: Arc<ErrorReporter>,
    ) -> Self {
        Self {
            inner: ResourceClient::new(
                config,
                transport,
                authenticator,
                reporter,
                ServiceKey::Events,
            ),
        }
    }

    /// Trigger an event, optionally scoped to one tenant
    ///
    /// Returns whether the platform accepted the trigger.
    ///
    /// # Errors
    ///
    /// [`crate::error::ClientError::Api`] under the throwing policy for a
    /// non-2xx response.
    pub async fn trigger(&self, event: &EventTrigger, tenant_id: Option<&str>) -> ClientResult<bool> {
        let body = serde_json::to_value(event)?;
        let response = self
            .inner
            .send(HttpRequest::post(self.inner.service_url(), body), tenant_id)
            .await?;
        Ok(response.is_success())
    }
}
