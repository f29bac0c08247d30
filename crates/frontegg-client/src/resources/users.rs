//! User lookup and management

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::ResourceClient;
use crate::authenticator::Authenticator;
use crate::config::{ClientConfig, ServiceKey};
use crate::error::ClientResult;
use crate::reporter::ErrorReporter;
use crate::transport::{HttpRequest, Transport};

/// A platform user as returned by the identity service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub id: String,
    /// Login email
    pub email: String,
    /// Display name, when set
    #[serde(default)]
    pub name: Option<String>,
    /// Tenants the user belongs to
    #[serde(default, rename = "tenantIds")]
    pub tenant_ids: Vec<String>,
}

/// Thin client for the users service
pub struct UsersClient {
    inner: ResourceClient,
}

impl UsersClient {
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
                ServiceKey::Users,
            ),
        }
    }

    /// Fetch a user by id
    ///
    /// # Errors
    ///
    /// [`crate::error::ClientError::Api`] under the throwing policy for a
    /// non-2xx response; `Ok(None)` under the recording policy.
    pub async fn get_user(&self, user_id: &str, tenant_id: Option<&str>) -> ClientResult<Option<User>> {
        let url = format!("{}/{user_id}", self.inner.service_url());
        let response = self.inner.send(HttpRequest::get(url), tenant_id).await?;
        if !response.is_success() {
            return Ok(None);
        }
        Ok(Some(response.json()?))
    }

    /// Invite a user to a tenant
    ///
    /// # Errors
    ///
    /// Same policy behavior as [`Self::get_user`].
    pub async fn create_user(
        &self,
        email: &str,
        name: Option<&str>,
        tenant_id: Option<&str>,
    ) -> ClientResult<Option<User>> {
        let mut body = json!({ "email": email });
        if let Some(name) = name {
            body["name"] = json!(name);
        }
        let response = self
            .inner
            .send(HttpRequest::post(self.inner.service_url(), body), tenant_id)
            .await?;
        if !response.is_success() {
            return Ok(None);
        }
        Ok(Some(response.json()?))
    }

    /// Update a user's profile fields
    ///
    /// Only the provided fields are sent; the platform leaves the rest
    /// untouched.
    ///
    /// # Errors
    ///
    /// Same policy behavior as [`Self::get_user`].
    pub async fn update_user(
        &self,
        user_id: &str,
        name: Option<&str>,
        tenant_id: Option<&str>,
    ) -> ClientResult<Option<User>> {
        let url = format!("{}/{user_id}", self.inner.service_url());
        let mut body = json!({});
        if let Some(name) = name {
            body["name"] = json!(name);
        }
        let response = self.inner.send(HttpRequest::put(url, body), tenant_id).await?;
        if !response.is_success() {
            return Ok(None);
        }
        Ok(Some(response.json()?))
    }

    /// Remove a user
    ///
    /// Returns whether the platform acknowledged the deletion.
    ///
    /// # Errors
    ///
    /// Same policy behavior as [`Self::get_user`].
    pub async fn delete_user(&self, user_id: &str, tenant_id: Option<&str>) -> ClientResult<bool> {
        let url = format!("{}/{user_id}", self.inner.service_url());
        let response = self.inner.send(HttpRequest::delete(url), tenant_id).await?;
        Ok(response.is_success())
    }
}
