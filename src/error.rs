use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Structured error type for the storefront client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorefrontError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional context for additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Severity level
    pub severity: ErrorSeverity,
    /// Error category for retry policies and handling strategies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
    /// HTTP status that produced this error, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl StorefrontError {
    /// Create a new error builder with the specified error code
    pub fn new(code: ErrorCode) -> StorefrontErrorBuilder {
        StorefrontErrorBuilder {
            code,
            message: String::new(),
            context: None,
            severity: ErrorSeverity::Error,
            category: None,
            status: None,
        }
    }

    /// Whether the caller may retry the failed operation unchanged
    pub fn is_retryable(&self) -> bool {
        self.category.map_or(false, |c| c.is_retryable())
    }
}

/// Builder for creating StorefrontError instances
pub struct StorefrontErrorBuilder {
    code: ErrorCode,
    message: String,
    context: Option<String>,
    severity: ErrorSeverity,
    category: Option<ErrorCategory>,
    status: Option<u16>,
}

impl StorefrontErrorBuilder {
    /// Set the error message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the error context
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Set the error severity
    pub fn severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Set the error category
    pub fn category(mut self, category: ErrorCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Set the HTTP status
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Build the final StorefrontError
    pub fn build(self) -> StorefrontError {
        StorefrontError {
            code: self.code,
            message: self.message,
            context: self.context,
            severity: self.severity,
            category: self.category,
            status: self.status,
        }
    }
}

/// Error codes for different types of errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // General errors
    Unknown,
    Internal,

    // Storage related errors
    StorageReadFailed,
    StorageWriteFailed,

    // API related errors
    ApiRequestFailed,
    ApiRateLimited,
    ApiAuthenticationFailed,
    ApiPermissionDenied,
    ApiNotFound,
    ApiResponseInvalid,
    ApiRequestInvalid,

    // Authentication errors
    AuthTokenInvalid,

    // Cart errors
    CartItemInvalid,

    // Network errors
    NetworkTimeout,
    NetworkConnectionLost,

    // Configuration related errors
    ConfigInvalid,
    ConfigMissing,
}

/// Error types using thiserror
#[derive(Error, Debug, Clone)]
pub enum StorefrontErrorType {
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Failed to read storage at '{path}': {reason}")]
    StorageReadFailed { path: String, reason: String },

    #[error("Failed to write storage at '{path}': {reason}")]
    StorageWriteFailed { path: String, reason: String },

    #[error("Request to {endpoint} failed with status {status}: {message}")]
    ApiRequestFailed {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Invalid response from {endpoint}: {reason}")]
    ApiResponseInvalid { endpoint: String, reason: String },

    #[error("Invalid request field '{field}': {reason}")]
    ApiRequestInvalid { field: String, reason: String },

    #[error("Authentication token is invalid: {reason}")]
    AuthTokenInvalid { reason: String },

    #[error("Invalid cart item '{product_id}': {reason}")]
    CartItemInvalid { product_id: String, reason: String },

    #[error("Network timeout during {operation}")]
    NetworkTimeout { operation: String },

    #[error("Configuration value '{key}' is missing")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value '{value}' for '{key}': {reason}")]
    ConfigInvalid {
        key: String,
        value: String,
        reason: String,
    },
}

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// Informational messages that don't impact functionality
    Info,
    /// Warnings that might impact functionality but don't stop operation
    Warning,
    /// Errors that impact functionality but allow continued operation
    Error,
    /// Critical errors that prevent the application from functioning properly
    Critical,
}

/// Error categories for different retry strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Temporary network issues, timeouts, etc. - usually retryable
    Network,
    /// Missing or rejected credentials
    Authentication,
    /// API rate limiting - retryable with backoff
    RateLimit,
    /// API service unavailable - retryable with longer backoff
    ServiceUnavailable,
    /// Permission/access denied - not retryable without reconfiguration
    Permission,
    /// Configuration errors - not retryable without reconfiguration
    Configuration,
    /// Internal errors in our code - generally not retryable
    Internal,
    /// Resource not found - generally not retryable
    NotFound,
    /// Validation errors - not retryable without input changes
    Validation,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network | Self::RateLimit | Self::ServiceUnavailable => true,

            Self::Authentication
            | Self::Permission
            | Self::Configuration
            | Self::Internal
            | Self::NotFound
            | Self::Validation => false,
        }
    }

    /// Category for a non-success HTTP status
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Authentication,
            403 => Self::Permission,
            404 => Self::NotFound,
            408 => Self::Network,
            429 => Self::RateLimit,
            500..=599 => Self::ServiceUnavailable,
            _ => Self::Validation,
        }
    }
}

impl fmt::Display for StorefrontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "{}: {} ({})", self.code, self.message, context)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::Unknown => "UNKNOWN",
            ErrorCode::Internal => "INTERNAL",
            ErrorCode::StorageReadFailed => "STORAGE_READ_FAILED",
            ErrorCode::StorageWriteFailed => "STORAGE_WRITE_FAILED",
            ErrorCode::ApiRequestFailed => "API_REQUEST_FAILED",
            ErrorCode::ApiRateLimited => "API_RATE_LIMITED",
            ErrorCode::ApiAuthenticationFailed => "API_AUTHENTICATION_FAILED",
            ErrorCode::ApiPermissionDenied => "API_PERMISSION_DENIED",
            ErrorCode::ApiNotFound => "API_NOT_FOUND",
            ErrorCode::ApiResponseInvalid => "API_RESPONSE_INVALID",
            ErrorCode::ApiRequestInvalid => "API_REQUEST_INVALID",
            ErrorCode::AuthTokenInvalid => "AUTH_TOKEN_INVALID",
            ErrorCode::CartItemInvalid => "CART_ITEM_INVALID",
            ErrorCode::NetworkTimeout => "NETWORK_TIMEOUT",
            ErrorCode::NetworkConnectionLost => "NETWORK_CONNECTION_LOST",
            ErrorCode::ConfigInvalid => "CONFIG_INVALID",
            ErrorCode::ConfigMissing => "CONFIG_MISSING",
        };
        f.write_str(s)
    }
}

impl std::error::Error for StorefrontError {}

impl From<StorefrontErrorType> for StorefrontError {
    fn from(err: StorefrontErrorType) -> Self {
        let message = err.to_string();
        match err {
            StorefrontErrorType::Internal(_) => StorefrontError::new(ErrorCode::Internal)
                .message(message)
                .category(ErrorCategory::Internal)
                .build(),
            StorefrontErrorType::StorageReadFailed { path, .. } => {
                StorefrontError::new(ErrorCode::StorageReadFailed)
                    .message(message)
                    .context(path)
                    .category(ErrorCategory::Internal)
                    .build()
            }
            StorefrontErrorType::StorageWriteFailed { path, .. } => {
                StorefrontError::new(ErrorCode::StorageWriteFailed)
                    .message(message)
                    .context(path)
                    .category(ErrorCategory::Internal)
                    .build()
            }
            StorefrontErrorType::ApiRequestFailed {
                endpoint,
                status,
                message: server_message,
            } => {
                let code = match status {
                    401 => ErrorCode::ApiAuthenticationFailed,
                    403 => ErrorCode::ApiPermissionDenied,
                    404 => ErrorCode::ApiNotFound,
                    429 => ErrorCode::ApiRateLimited,
                    _ => ErrorCode::ApiRequestFailed,
                };
                let severity = if status >= 500 {
                    ErrorSeverity::Error
                } else {
                    ErrorSeverity::Warning
                };
                StorefrontError::new(code)
                    .message(server_message)
                    .context(endpoint)
                    .category(ErrorCategory::from_status(status))
                    .severity(severity)
                    .status(status)
                    .build()
            }
            StorefrontErrorType::ApiResponseInvalid { endpoint, .. } => {
                StorefrontError::new(ErrorCode::ApiResponseInvalid)
                    .message(message)
                    .context(endpoint)
                    .category(ErrorCategory::Validation)
                    .build()
            }
            StorefrontErrorType::ApiRequestInvalid { field, .. } => {
                StorefrontError::new(ErrorCode::ApiRequestInvalid)
                    .message(message)
                    .context(field)
                    .category(ErrorCategory::Validation)
                    .severity(ErrorSeverity::Warning)
                    .build()
            }
            StorefrontErrorType::AuthTokenInvalid { .. } => {
                StorefrontError::new(ErrorCode::AuthTokenInvalid)
                    .message(message)
                    .category(ErrorCategory::Authentication)
                    .severity(ErrorSeverity::Warning)
                    .build()
            }
            StorefrontErrorType::CartItemInvalid { .. } => {
                StorefrontError::new(ErrorCode::CartItemInvalid)
                    .message(message)
                    .category(ErrorCategory::Validation)
                    .severity(ErrorSeverity::Warning)
                    .build()
            }
            StorefrontErrorType::NetworkTimeout { .. } => {
                StorefrontError::new(ErrorCode::NetworkTimeout)
                    .message(message)
                    .category(ErrorCategory::Network)
                    .severity(ErrorSeverity::Warning)
                    .build()
            }
            StorefrontErrorType::ConfigMissing { .. } => {
                StorefrontError::new(ErrorCode::ConfigMissing)
                    .message(message)
                    .category(ErrorCategory::Configuration)
                    .build()
            }
            StorefrontErrorType::ConfigInvalid { .. } => {
                StorefrontError::new(ErrorCode::ConfigInvalid)
                    .message(message)
                    .category(ErrorCategory::Configuration)
                    .build()
            }
        }
    }
}

impl From<anyhow::Error> for StorefrontError {
    fn from(err: anyhow::Error) -> Self {
        // Try to extract error category from the error message
        let err_str = err.to_string().to_lowercase();
        let category = if err_str.contains("timeout") || err_str.contains("timed out") {
            ErrorCategory::Network
        } else if err_str.contains("unauthorized") || err_str.contains("token") {
            ErrorCategory::Authentication
        } else if err_str.contains("not found") {
            ErrorCategory::NotFound
        } else if err_str.contains("invalid") {
            ErrorCategory::Validation
        } else {
            ErrorCategory::Internal
        };

        StorefrontError::new(ErrorCode::Internal)
            .message(err.to_string())
            .category(category)
            .build()
    }
}

impl From<reqwest::Error> for StorefrontError {
    fn from(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            ErrorCode::NetworkTimeout
        } else {
            ErrorCode::NetworkConnectionLost
        };
        let mut builder = StorefrontError::new(code)
            .message(err.to_string())
            .category(ErrorCategory::Network)
            .severity(ErrorSeverity::Warning);
        if let Some(url) = err.url() {
            builder = builder.context(url.to_string());
        }
        builder.build()
    }
}

impl From<serde_json::Error> for StorefrontError {
    fn from(err: serde_json::Error) -> Self {
        StorefrontError::new(ErrorCode::ApiResponseInvalid)
            .message(format!("JSON error: {}", err))
            .category(ErrorCategory::Validation)
            .build()
    }
}

// Custom Result type for storefront operations
pub type StorefrontResult<T> = Result<T, StorefrontError>;

// Utility functions to create errors

/// Create a storage read error
pub fn storage_read_failed(path: impl Into<String>, err: impl fmt::Display) -> StorefrontError {
    StorefrontErrorType::StorageReadFailed {
        path: path.into(),
        reason: err.to_string(),
    }
    .into()
}

/// Create a storage write error
pub fn storage_write_failed(path: impl Into<String>, err: impl fmt::Display) -> StorefrontError {
    StorefrontErrorType::StorageWriteFailed {
        path: path.into(),
        reason: err.to_string(),
    }
    .into()
}

/// Create an error for a non-success API response
pub fn api_request_failed(
    endpoint: impl Into<String>,
    status: u16,
    message: impl Into<String>,
) -> StorefrontError {
    StorefrontErrorType::ApiRequestFailed {
        endpoint: endpoint.into(),
        status,
        message: message.into(),
    }
    .into()
}

/// Create an error for a response body that could not be decoded
pub fn api_response_invalid(endpoint: impl Into<String>, err: impl fmt::Display) -> StorefrontError {
    StorefrontErrorType::ApiResponseInvalid {
        endpoint: endpoint.into(),
        reason: err.to_string(),
    }
    .into()
}

/// Create an error for a request rejected before it was sent
pub fn api_request_invalid(field: impl Into<String>, reason: impl Into<String>) -> StorefrontError {
    StorefrontErrorType::ApiRequestInvalid {
        field: field.into(),
        reason: reason.into(),
    }
    .into()
}

/// Create an invalid token error
pub fn auth_token_invalid(reason: impl Into<String>) -> StorefrontError {
    StorefrontErrorType::AuthTokenInvalid {
        reason: reason.into(),
    }
    .into()
}

/// Create an invalid cart item error
pub fn cart_item_invalid(product_id: impl Into<String>, reason: impl Into<String>) -> StorefrontError {
    StorefrontErrorType::CartItemInvalid {
        product_id: product_id.into(),
        reason: reason.into(),
    }
    .into()
}

/// Create a network timeout error
pub fn network_timeout(operation: &str, after: Duration) -> StorefrontError {
    let mut err: StorefrontError = StorefrontErrorType::NetworkTimeout {
        operation: operation.to_string(),
    }
    .into();
    err.context = Some(format!("Timed out after {} ms", after.as_millis()));
    err
}

/// Create a configuration error
pub fn config_invalid(key: &str, value: &str, reason: &str) -> StorefrontError {
    StorefrontErrorType::ConfigInvalid {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// Create a configuration missing error
pub fn config_missing(key: &str) -> StorefrontError {
    StorefrontErrorType::ConfigMissing {
        key: key.to_string(),
    }
    .into()
}
