//! API error handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use ratecast_core::error::RatecastError;

/// API error type.
///
/// Rendered as `{"error": "<message>"}`. The message is meant for clients;
/// internal details only go to the log.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Status code this error renders with.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Client-facing message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<RatecastError> for ApiError {
    fn from(err: RatecastError) -> Self {
        match err {
            RatecastError::ValidationError(message) => ApiError::bad_request(message),
            RatecastError::AlreadySubscribed(_) => {
                ApiError::bad_request("Subscriber already exists")
            }
            RatecastError::RegistryPersistence { .. } | RatecastError::RegistryClosed => {
                tracing::error!(error = %err, "Failed to save subscriber");
                ApiError::internal("Failed to save subscriber")
            }
            RatecastError::RateSourceError(_) => {
                tracing::error!(error = %err, "Failed to fetch exchange rates");
                ApiError::internal("Failed to fetch exchange rates")
            }
            RatecastError::MailGatewayError(_) => {
                tracing::error!(error = %err, "Failed to send email");
                ApiError::internal("Failed to send email")
            }
            _ => {
                tracing::error!(error = %err, "Internal error");
                ApiError::internal("An internal error occurred")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (RatecastError::ValidationError("Email is required".into()), StatusCode::BAD_REQUEST),
            (RatecastError::AlreadySubscribed("foo@mail.com".into()), StatusCode::BAD_REQUEST),
            (RatecastError::RegistryClosed, StatusCode::INTERNAL_SERVER_ERROR),
            (RatecastError::RateSourceError("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (RatecastError::MailGatewayError("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (RatecastError::ConfigError("bad".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_validation_message_is_passed_through() {
        let err = ApiError::from(RatecastError::ValidationError("Invalid email address".into()));
        assert_eq!(err.message(), "Invalid email address");
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = ApiError::from(RatecastError::RateSourceError("secret upstream detail".into()));
        assert!(!err.message().contains("secret"));
    }
}
