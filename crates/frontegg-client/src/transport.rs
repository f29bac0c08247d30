//! HTTP transport seam
//!
//! The core never talks to the network directly; everything goes through
//! the [`Transport`] trait so hosts can substitute their own stack and tests
//! can count calls. [`HttpTransport`] is the shipped reqwest-backed
//! implementation with a single fixed per-request timeout.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Fixed per-request timeout for every network call the SDK makes
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP method of an outbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl Method {
    /// Method name on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// An outbound request as the core describes it
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Fully resolved URL
    pub url: String,
    /// Header name/value pairs
    pub headers: Vec<(String, String)>,
    /// JSON body, when the request carries one
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    /// Build a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Build a POST request with a JSON body
    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    /// Build a PUT request with a JSON body
    pub fn put(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Put,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    /// Build a DELETE request
    pub fn delete(url: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Attach a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A raw response as the core consumes it
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Json`] when the body is not valid JSON of the
    /// expected shape.
    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Synchronous-per-call request/response transport
///
/// Implementations must apply [`REQUEST_TIMEOUT`]; the core exposes no
/// per-call override or cancellation beyond it.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Execute one request and return the raw response
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] for network-level failures. A
    /// non-2xx status is not a transport error; classification happens in
    /// [`crate::reporter::ErrorReporter`].
    async fn send(&self, request: HttpRequest) -> ClientResult<HttpResponse>;
}

/// reqwest-backed transport used by default
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with the fixed request timeout
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the underlying client cannot be
    /// constructed (TLS backend initialization).
    pub fn new() -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        debug!(method = request.method.as_str(), url = %request.url, "Sending request");

        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
            Method::Put => self.client.put(&request.url),
            Method::Delete => self.client.delete(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("request to {} failed: {e}", request.url)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(format!("failed to read response body: {e}")))?;

        debug!(status, body_len = body.len(), "Received response");
        Ok(HttpResponse { status, body })
    }
}
