//! SDK configuration
//!
//! [`ClientConfig`] is immutable after construction and lives for the host
//! object's lifetime. Service keys form a closed enumeration: the builtin
//! path table is a process-wide constant built once at startup, and no
//! runtime code path can add to it.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Default base URL of the hosted platform
pub const DEFAULT_BASE_URL: &str = "https://api.frontegg.com";

/// Well-known path of the vendor's published key set
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Closed enumeration of the services the SDK can address
///
/// Resolution of a key the platform does not know is a configuration error,
/// never a silent fallback; with the enum that error is unrepresentable in
/// typed code and surfaces in [`ServiceKey::from_str`] for string-keyed
/// entry points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ServiceKey {
    /// Vendor credential exchange on the auth plane
    Authentication,
    /// User lookup and management
    Users,
    /// Role management
    Roles,
    /// Permission management
    Permissions,
    /// Tenant management
    Tenants,
    /// Event triggering
    Events,
    /// Audit log access
    Audits,
}

impl ServiceKey {
    /// All known keys, in table order
    pub const ALL: [ServiceKey; 7] = [
        Self::Authentication,
        Self::Users,
        Self::Roles,
        Self::Permissions,
        Self::Tenants,
        Self::Events,
        Self::Audits,
    ];

    /// Stable lowercase name of this key
    pub fn name(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::Users => "users",
            Self::Roles => "roles",
            Self::Permissions => "permissions",
            Self::Tenants => "tenants",
            Self::Events => "events",
            Self::Audits => "audits",
        }
    }

    /// Tenant-scoping header for this service family
    ///
    /// Identity-plane services take `frontegg-tenant-id`; the event and
    /// audit families take `x-tenant-id`.
    pub fn tenant_header(&self) -> &'static str {
        match self {
            Self::Events | Self::Audits => "x-tenant-id",
            _ => "frontegg-tenant-id",
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ServiceKey {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.name() == s)
            .ok_or_else(|| ClientError::Configuration(format!("unknown service key '{s}'")))
    }
}

/// Builtin default path per service key
///
/// Read-only constant table; overrides come from
/// [`ClientConfig::service_url_overrides`], never from mutating this.
static BUILTIN_SERVICE_PATHS: Lazy<HashMap<ServiceKey, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (ServiceKey::Authentication, "/auth/vendor"),
        (ServiceKey::Users, "/identity/resources/users/v1"),
        (ServiceKey::Roles, "/identity/resources/roles/v1"),
        (ServiceKey::Permissions, "/identity/resources/permissions/v1"),
        (ServiceKey::Tenants, "/tenants/resources/tenants/v1"),
        (ServiceKey::Events, "/event/resources/triggers/v2"),
        (ServiceKey::Audits, "/audits/v1"),
    ])
});

/// Ambient request context supplied by the host application
///
/// Resource clients fall back to this for tenant scoping when the caller
/// passes no explicit tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Tenant to scope calls to, when known
    pub tenant_id: Option<String>,
    /// Acting user, when known
    pub user_id: Option<String>,
}

/// Typed context-resolver strategy
///
/// A plain function value on the config, invoked by resource clients. Never
/// dispatched by name.
pub type ContextResolver = Arc<dyn Fn() -> RequestContext + Send + Sync>;

/// Immutable SDK settings
///
/// Built once at startup via [`ClientConfig::builder`].
#[derive(Clone)]
pub struct ClientConfig {
    client_id: String,
    client_secret: SecretString,
    base_url: String,
    auth_base_url: String,
    vendor_base_url: String,
    service_url_overrides: HashMap<ServiceKey, String>,
    throw_on_error: bool,
    context_resolver: Option<ContextResolver>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("auth_base_url", &self.auth_base_url)
            .field("vendor_base_url", &self.vendor_base_url)
            .field("service_url_overrides", &self.service_url_overrides)
            .field("throw_on_error", &self.throw_on_error)
            .field(
                "context_resolver",
                &self.context_resolver.as_ref().map(|_| "<fn>"),
            )
            .finish()
    }
}

impl ClientConfig {
    /// Start building a config from the credential pair
    pub fn builder(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> ClientConfigBuilder {
        ClientConfigBuilder {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_base_url: None,
            vendor_base_url: None,
            service_url_overrides: HashMap::new(),
            throw_on_error: true,
            context_resolver: None,
        }
    }

    /// Client identifier used in the credential exchange
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Opaque client secret used in the credential exchange
    pub fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }

    /// Base URL of the general API plane
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL of the authentication plane
    ///
    /// Differs from [`Self::base_url`] in hybrid deployments where the auth
    /// plane is hosted separately.
    pub fn auth_base_url(&self) -> &str {
        &self.auth_base_url
    }

    /// Base URL of the vendor plane hosting the well-known key endpoint
    pub fn vendor_base_url(&self) -> &str {
        &self.vendor_base_url
    }

    /// Whether non-2xx responses raise or are recorded for later query
    pub fn throw_on_error(&self) -> bool {
        self.throw_on_error
    }

    /// Resolve a service URL against the API plane
    ///
    /// Returns `base_url + override` when an override exists for `key`, else
    /// `base_url + builtin default`.
    pub fn service_url(&self, key: ServiceKey) -> String {
        format!("{}{}", self.base_url, self.service_path(key))
    }

    /// Resolve a service URL against the authentication plane
    ///
    /// Identical path resolution to [`Self::service_url`], but against
    /// `auth_base_url`.
    pub fn authentication_url(&self, key: ServiceKey) -> String {
        format!("{}{}", self.auth_base_url, self.service_path(key))
    }

    /// The vendor plane's well-known key-set URL
    pub fn jwks_url(&self) -> String {
        format!("{}{}", self.vendor_base_url, JWKS_PATH)
    }

    /// Invoke the context-resolver strategy, if one was configured
    pub fn resolve_context(&self) -> RequestContext {
        self.context_resolver
            .as_ref()
            .map(|resolver| resolver())
            .unwrap_or_default()
    }

    /// Resolve a service URL from a string key, for hosts that configure
    /// services by name
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] for a key outside the closed
    /// service enumeration.
    pub fn service_url_by_name(&self, key: &str) -> ClientResult<String> {
        Ok(self.service_url(key.parse()?))
    }

    fn service_path(&self, key: ServiceKey) -> &str {
        if let Some(path) = self.service_url_overrides.get(&key) {
            return path;
        }
        // Every ServiceKey has a builtin entry; the table and the enum are
        // defined together.
        BUILTIN_SERVICE_PATHS
            .get(&key)
            .copied()
            .unwrap_or_default()
    }
}

/// Builder for [`ClientConfig`]
pub struct ClientConfigBuilder {
    client_id: String,
    client_secret: SecretString,
    base_url: String,
    auth_base_url: Option<String>,
    vendor_base_url: Option<String>,
    service_url_overrides: HashMap<ServiceKey, String>,
    throw_on_error: bool,
    context_resolver: Option<ContextResolver>,
}

impl ClientConfigBuilder {
    /// Set the API-plane base URL (default: hosted platform)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = trim_trailing_slash(url.into());
        self
    }

    /// Set a separate authentication-plane base URL
    pub fn auth_base_url(mut self, url: impl Into<String>) -> Self {
        self.auth_base_url = Some(trim_trailing_slash(url.into()));
        self
    }

    /// Set a separate vendor-plane base URL for the key endpoint
    pub fn vendor_base_url(mut self, url: impl Into<String>) -> Self {
        self.vendor_base_url = Some(trim_trailing_slash(url.into()));
        self
    }

    /// Override the path for one service key
    pub fn service_url_override(mut self, key: ServiceKey, path: impl Into<String>) -> Self {
        self.service_url_overrides.insert(key, path.into());
        self
    }

    /// Record API errors instead of raising them (see
    /// [`crate::reporter::ErrorReporter`])
    pub fn record_errors(mut self) -> Self {
        self.throw_on_error = false;
        self
    }

    /// Set the error policy explicitly
    pub fn throw_on_error(mut self, throw: bool) -> Self {
        self.throw_on_error = throw;
        self
    }

    /// Install a context-resolver strategy
    pub fn context_resolver(
        mut self,
        resolver: impl Fn() -> RequestContext + Send + Sync + 'static,
    ) -> Self {
        self.context_resolver = Some(Arc::new(resolver));
        self
    }

    /// Finish building the immutable config
    pub fn build(self) -> ClientConfig {
        let auth_base_url = self.auth_base_url.unwrap_or_else(|| self.base_url.clone());
        let vendor_base_url = self
            .vendor_base_url
            .unwrap_or_else(|| self.base_url.clone());
        ClientConfig {
            client_id: self.client_id,
            client_secret: self.client_secret,
            base_url: self.base_url,
            auth_base_url,
            vendor_base_url,
            service_url_overrides: self.service_url_overrides,
            throw_on_error: self.throw_on_error,
            context_resolver: self.context_resolver,
        }
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}
