//! Response classification and structured error reporting
//!
//! Shared by the authenticator and every resource client. A response is an
//! error iff its status is outside the 2xx range; what happens next depends
//! on the config's `throw_on_error` policy.

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{ApiError, ClientError, ClientResult};
use crate::transport::HttpResponse;

/// Error payload shape the platform returns on failures
///
/// Every field is optional on the wire; the body is parsed once and the
/// parsed structure feeds both the stored record and the raised message.
#[derive(Debug, Default, serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, rename = "statusCode")]
    status_code: Option<u16>,
}

/// Classifies responses and keeps the last [`ApiError`] queryable
#[derive(Debug, Default)]
pub struct ErrorReporter {
    last_error: RwLock<Option<ApiError>>,
}

impl ErrorReporter {
    /// Create a reporter with no recorded error
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a raw response against the error policy
    ///
    /// 2xx clears any recorded error and returns `Ok(true)`. Otherwise the
    /// body is decoded into an [`ApiError`] and stored; with
    /// `throw_on_error` the error is raised, without it `Ok(false)` is
    /// returned and the record stays queryable via [`Self::api_error`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] for a non-2xx response when
    /// `throw_on_error` is set.
    pub async fn classify(
        &self,
        response: &HttpResponse,
        throw_on_error: bool,
    ) -> ClientResult<bool> {
        if response.is_success() {
            let mut last = self.last_error.write().await;
            *last = None;
            return Ok(true);
        }

        let api_error = Self::extract(response);
        warn!(
            status = response.status,
            code = %api_error.code,
            message = %api_error.message,
            "Request failed"
        );

        {
            let mut last = self.last_error.write().await;
            *last = Some(api_error.clone());
        }

        if throw_on_error {
            Err(ClientError::Api(api_error))
        } else {
            Ok(false)
        }
    }

    /// Last recorded error, if the previous classified response failed
    pub async fn api_error(&self) -> Option<ApiError> {
        self.last_error.read().await.clone()
    }

    /// Build the error record from a failed response
    ///
    /// Message priority: joined `errors[]` list, else the `message` field,
    /// else the raw body, else a generic unknown-error message.
    fn extract(response: &HttpResponse) -> ApiError {
        let parsed: ErrorBody = serde_json::from_str(&response.body).unwrap_or_else(|e| {
            debug!(error = %e, "Error body is not structured JSON");
            ErrorBody::default()
        });

        let message = if !parsed.errors.is_empty() {
            parsed.errors.join(", ")
        } else if let Some(message) = parsed.message {
            message
        } else if !response.body.trim().is_empty() {
            response.body.trim().to_string()
        } else {
            format!("unknown error, status={}", response.status)
        };

        ApiError {
            code: parsed.error.unwrap_or_else(|| "api_error".to_string()),
            message,
            http_status: Some(parsed.status_code.unwrap_or(response.status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn success_clears_recorded_error() {
        let reporter = ErrorReporter::new();
        reporter
            .classify(&response(500, "boom"), false)
            .await
            .unwrap();
        assert!(reporter.api_error().await.is_some());

        let ok = reporter.classify(&response(200, "{}"), false).await.unwrap();
        assert!(ok);
        assert!(reporter.api_error().await.is_none());
    }

    #[tokio::test]
    async fn non_throwing_failure_is_recorded_not_raised() {
        let reporter = ErrorReporter::new();
        let ok = reporter
            .classify(
                &response(404, r#"{"error": "not_found", "message": "no such user"}"#),
                false,
            )
            .await
            .unwrap();
        assert!(!ok);

        let stored = reporter.api_error().await.unwrap();
        assert_eq!(stored.http_status, Some(404));
        assert_eq!(stored.code, "not_found");
        assert_eq!(stored.message, "no such user");
    }

    #[tokio::test]
    async fn throwing_failure_raises_with_same_record() {
        let reporter = ErrorReporter::new();
        let err = reporter
            .classify(&response(403, r#"{"message": "forbidden"}"#), true)
            .await
            .unwrap_err();
        match err {
            ClientError::Api(api_error) => {
                assert_eq!(api_error.message, "forbidden");
                assert_eq!(api_error.http_status, Some(403));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        // Still queryable after the raise
        assert!(reporter.api_error().await.is_some());
    }

    #[test]
    fn message_priority_errors_list_first() {
        let api_error = ErrorReporter::extract(&response(
            400,
            r#"{"errors": ["a is required", "b is invalid"], "message": "bad request"}"#,
        ));
        assert_eq!(api_error.message, "a is required, b is invalid");
    }

    #[test]
    fn message_priority_falls_back_to_raw_body() {
        let api_error = ErrorReporter::extract(&response(502, "upstream unavailable"));
        assert_eq!(api_error.message, "upstream unavailable");
    }

    #[test]
    fn message_priority_generic_for_empty_body() {
        let api_error = ErrorReporter::extract(&response(500, ""));
        assert_eq!(api_error.message, "unknown error, status=500");
        assert_eq!(api_error.http_status, Some(500));
    }

    #[test]
    fn status_code_field_wins_over_transport_status() {
        let api_error =
            ErrorReporter::extract(&response(400, r#"{"statusCode": 422, "message": "nope"}"#));
        assert_eq!(api_error.http_status, Some(422));
    }
}
