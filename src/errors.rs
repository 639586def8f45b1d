// ABOUTME: Unified error handling for the ECHO orchestration service
// ABOUTME: Defines error codes, the AppError type, and HTTP response formatting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

//! # Unified Error Handling System
//!
//! Centralized error taxonomy for the orchestration service: validation
//! errors reject before any network call, configuration errors are fatal to
//! the current request, provider errors carry the provider name, and
//! persistence errors stay inside the best-effort telemetry paths.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation (3000-3999)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    #[serde(rename = "MISSING_REQUIRED_FIELD")]
    MissingRequiredField = 3001,
    #[serde(rename = "INVALID_FORMAT")]
    InvalidFormat = 3002,

    // Resource Management (4000-4999)
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 4000,

    // LLM Providers (5000-5999)
    #[serde(rename = "PROVIDER_ERROR")]
    ProviderError = 5000,
    #[serde(rename = "PROVIDER_UNAVAILABLE")]
    ProviderUnavailable = 5001,
    #[serde(rename = "PROVIDER_TIMEOUT")]
    ProviderTimeout = 5002,
    #[serde(rename = "PROVIDER_UNPARSEABLE")]
    ProviderUnparseable = 5003,

    // Configuration (6000-6999)
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,
    #[serde(rename = "CONFIG_MISSING")]
    ConfigMissing = 6001,
    #[serde(rename = "CONFIG_INVALID")]
    ConfigInvalid = 6002,

    // Internal Errors (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError = 9001,
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9003,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            // 400 Bad Request
            Self::InvalidInput | Self::MissingRequiredField | Self::InvalidFormat => 400,

            // 404 Not Found
            Self::ResourceNotFound => 404,

            // 502 Bad Gateway
            Self::ProviderError | Self::ProviderUnparseable => 502,

            // 503 Service Unavailable
            Self::ProviderUnavailable => 503,

            // 504 Gateway Timeout
            Self::ProviderTimeout => 504,

            // 500 Internal Server Error
            Self::ConfigError
            | Self::ConfigMissing
            | Self::ConfigInvalid
            | Self::InternalError
            | Self::DatabaseError
            | Self::SerializationError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::InvalidFormat => "The data format is invalid",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ProviderError => "An LLM provider returned an error",
            Self::ProviderUnavailable => "An LLM provider is currently unavailable",
            Self::ProviderTimeout => "An LLM provider call timed out",
            Self::ProviderUnparseable => "An LLM provider returned an unparseable response",
            Self::ConfigError => "Configuration error encountered",
            Self::ConfigMissing => "Required configuration is missing",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::InternalError => "An internal server error occurred",
            Self::DatabaseError => "Database operation failed",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Provider name when the error originates from an LLM provider
    pub provider: Option<String>,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    /// Attach the originating provider name
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Whether this error came from an LLM provider or the configuration
    /// layer, i.e. the cases the Dynamic mode fallback is allowed to absorb.
    #[must_use]
    pub const fn is_recoverable_by_fallback(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::ProviderError
                | ErrorCode::ProviderUnavailable
                | ErrorCode::ProviderTimeout
                | ErrorCode::ProviderUnparseable
                | ErrorCode::ConfigError
                | ErrorCode::ConfigMissing
                | ErrorCode::ConfigInvalid
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.provider {
            Some(provider) => {
                write!(f, "{} [{provider}]: {}", self.code.description(), self.message)
            }
            None => write!(f, "{}: {}", self.code.description(), self.message),
        }
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorResponseDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
                provider: error.provider,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::from(self))).into_response()
    }
}

/// Convenience constructors for common errors
impl AppError {
    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Required field missing from a request or record
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("missing required field: {}", field.into()),
        )
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Provider reported a failure outside the HTTP transport, such as a
    /// failed asynchronous job
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProviderError, message).with_provider(provider)
    }

    /// Provider returned a non-2xx HTTP status
    pub fn provider_http(
        provider: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ProviderError,
            format!("HTTP {status}: {}", body.into()),
        )
        .with_provider(provider)
    }

    /// Provider response body did not match the expected shape
    pub fn provider_unparseable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ProviderUnparseable,
            format!("unparseable response: {}", message.into()),
        )
        .with_provider(provider)
    }

    /// Provider call exceeded the configured timeout
    pub fn provider_timeout(provider: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProviderTimeout, "request timed out").with_provider(provider)
    }

    /// Network-level failure talking to a provider
    pub fn provider_transport(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ProviderUnavailable,
            format!("transport failure: {}", message.into()),
        )
        .with_provider(provider)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Required configuration is missing
    pub fn config_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigMissing, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }
}

/// Conversion from anyhow::Error to AppError
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(ErrorCode::InternalError, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::InvalidInput.http_status(), 400);
        assert_eq!(ErrorCode::ResourceNotFound.http_status(), 404);
        assert_eq!(ErrorCode::ProviderError.http_status(), 502);
        assert_eq!(ErrorCode::ProviderTimeout.http_status(), 504);
        assert_eq!(ErrorCode::ConfigMissing.http_status(), 500);
    }

    #[test]
    fn test_provider_error_carries_provider_name() {
        let error = AppError::provider_http("anthropic", 500, "internal error");
        assert_eq!(error.provider.as_deref(), Some("anthropic"));
        assert!(error.to_string().contains("anthropic"));
        assert!(error.to_string().contains("HTTP 500"));
    }

    #[test]
    fn test_job_level_provider_error_has_no_http_status() {
        let error = AppError::provider("assemblyai", "transcription job failed: bad audio");
        assert_eq!(error.code, ErrorCode::ProviderError);
        assert_eq!(error.provider.as_deref(), Some("assemblyai"));
        assert!(!error.to_string().contains("HTTP"));
    }

    #[test]
    fn test_fallback_recoverability() {
        assert!(AppError::provider_timeout("openai").is_recoverable_by_fallback());
        assert!(AppError::config_missing("no active configuration").is_recoverable_by_fallback());
        assert!(!AppError::invalid_input("empty text").is_recoverable_by_fallback());
        assert!(!AppError::database("insert failed").is_recoverable_by_fallback());
    }

    #[test]
    fn test_error_response_serialization() {
        let error = AppError::provider_unparseable("google", "missing candidates");
        let response = ErrorResponse::from(error);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("PROVIDER_UNPARSEABLE"));
        assert!(json.contains("google"));
    }
}
