//! Typed error handling for the transit console core
//!
//! Every failure surfaced to a page is one of a small set of categories so
//! that the query controller can decide how to present it.
//!
//! # Error Categories
//!
//! - [`FetchError`]: list, statistics or filter-option requests that failed
//! - [`ValidationError`]: form or query input rejected before reaching a backend
//! - [`MutationError`]: create/delete requests rejected by the backend
//! - [`ConfigError`]: console configuration parsing and validation
//! - `NotFound`: a record requested by id does not exist
//!
//! # Example
//!
//! ```rust,ignore
//! match controller.delete("bus-42").await {
//!     Ok(()) => {}
//!     Err(ConsoleError::Mutation(e)) => toast(e.to_string()),
//!     Err(e) => tracing::error!(error = %e, "unexpected failure"),
//! }
//! ```

use crate::core::pluralize::Pluralizer;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The main error type for the console core
#[derive(Debug)]
pub enum ConsoleError {
    /// Network/server failure while loading data
    Fetch(FetchError),

    /// Input rejected locally
    Validation(ValidationError),

    /// Create/update/delete rejected
    Mutation(MutationError),

    /// Configuration errors
    Config(ConfigError),

    /// A record requested by id does not exist
    NotFound { resource: String, id: String },

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::Fetch(e) => write!(f, "{}", e),
            ConsoleError::Validation(e) => write!(f, "{}", e),
            ConsoleError::Mutation(e) => write!(f, "{}", e),
            ConsoleError::Config(e) => write!(f, "{}", e),
            ConsoleError::NotFound { resource, id } => {
                write!(f, "{} with id '{}' not found", resource, id)
            }
            ConsoleError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ConsoleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConsoleError::Fetch(e) => Some(e),
            ConsoleError::Validation(e) => Some(e),
            ConsoleError::Mutation(e) => Some(e),
            ConsoleError::Config(e) => Some(e),
            ConsoleError::NotFound { .. } | ConsoleError::Internal(_) => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ConsoleError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ConsoleError::Fetch(e) => e.status_code(),
            ConsoleError::Validation(e) => e.status_code(),
            ConsoleError::Mutation(e) => e.status_code(),
            ConsoleError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ConsoleError::NotFound { .. } => StatusCode::NOT_FOUND,
            ConsoleError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ConsoleError::Fetch(e) => e.error_code(),
            ConsoleError::Validation(e) => e.error_code(),
            ConsoleError::Mutation(e) => e.error_code(),
            ConsoleError::Config(_) => "CONFIG_ERROR",
            ConsoleError::NotFound { .. } => "RECORD_NOT_FOUND",
            ConsoleError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to an end user
    ///
    /// Raw backend errors are never echoed for fetches; validation messages
    /// and backend-supplied mutation messages are.
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::Fetch(e) => e.user_message(),
            ConsoleError::Validation(e) => e.to_string(),
            ConsoleError::Mutation(e) => e.user_message(),
            ConsoleError::Config(_) | ConsoleError::Internal(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            ConsoleError::NotFound { resource, .. } => {
                format!(
                    "The requested {} could not be found.",
                    Pluralizer::singularize(resource)
                )
            }
        }
    }

    /// Convert to an error response
    ///
    /// Internal errors carry a generic message; their detail is only logged.
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            ConsoleError::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };
        ErrorResponse {
            code: self.error_code().to_string(),
            message,
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ConsoleError::NotFound { resource, id } => Some(serde_json::json!({
                "resource": resource,
                "id": id
            })),
            ConsoleError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        if let ConsoleError::Internal(detail) = &self {
            tracing::error!(error = %detail, "internal error while serving request");
        }
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Fetch Errors
// =============================================================================

/// Errors raised while loading data from a backend collaborator
#[derive(Debug)]
pub enum FetchError {
    /// The primary list request failed
    ListFailed { resource: String, message: String },

    /// The statistics request failed (non-critical)
    StatisticsFailed { resource: String, message: String },

    /// The filter-options request failed (non-critical)
    FilterOptionsFailed { resource: String, message: String },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::ListFailed { resource, message } => {
                write!(f, "Failed to load {}: {}", resource, message)
            }
            FetchError::StatisticsFailed { resource, message } => {
                write!(f, "Failed to load {} statistics: {}", resource, message)
            }
            FetchError::FilterOptionsFailed { resource, message } => {
                write!(f, "Failed to load {} filter options: {}", resource, message)
            }
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_GATEWAY
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            FetchError::ListFailed { .. } => "LIST_FETCH_FAILED",
            FetchError::StatisticsFailed { .. } => "STATISTICS_FETCH_FAILED",
            FetchError::FilterOptionsFailed { .. } => "FILTER_OPTIONS_FETCH_FAILED",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            FetchError::ListFailed { resource, .. } => {
                format!("Failed to load {}. Please try again.", resource)
            }
            FetchError::StatisticsFailed { resource, .. } => {
                format!("Statistics for {} are unavailable.", resource)
            }
            FetchError::FilterOptionsFailed { resource, .. } => {
                format!("Some {} filters are unavailable.", resource)
            }
        }
    }
}

impl From<FetchError> for ConsoleError {
    fn from(err: FetchError) -> Self {
        ConsoleError::Fetch(err)
    }
}

// =============================================================================
// Mutation Errors
// =============================================================================

/// Errors raised when a backend rejects a mutation
#[derive(Debug)]
pub enum MutationError {
    /// Delete was rejected
    DeleteFailed {
        resource: String,
        id: String,
        message: String,
    },

    /// Create was rejected
    CreateFailed { resource: String, message: String },

    /// A record with the same id already exists
    Duplicate { resource: String, id: String },
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationError::DeleteFailed {
                resource,
                id,
                message,
            } => write!(f, "Failed to delete {} '{}': {}", resource, id, message),
            MutationError::CreateFailed { resource, message } => {
                write!(f, "Failed to create {}: {}", resource, message)
            }
            MutationError::Duplicate { resource, id } => {
                write!(f, "{} with id '{}' already exists", resource, id)
            }
        }
    }
}

impl std::error::Error for MutationError {}

impl MutationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            MutationError::Duplicate { .. } => StatusCode::CONFLICT,
            MutationError::DeleteFailed { .. } | MutationError::CreateFailed { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            MutationError::DeleteFailed { .. } => "DELETE_FAILED",
            MutationError::CreateFailed { .. } => "CREATE_FAILED",
            MutationError::Duplicate { .. } => "RECORD_ALREADY_EXISTS",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            MutationError::DeleteFailed { message, .. }
            | MutationError::CreateFailed { message, .. } => message.clone(),
            MutationError::Duplicate { resource, id } => {
                format!(
                    "A {} with id '{}' already exists.",
                    Pluralizer::singularize(resource),
                    id
                )
            }
        }
    }
}

impl From<MutationError> for ConsoleError {
    fn from(err: MutationError) -> Self {
        ConsoleError::Mutation(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// Two definitions share a name that must be unique
    Duplicate { context: String, name: String },

    /// No page is configured for a resource
    UnknownResource { resource: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError { file, message } => {
                if let Some(file) = file {
                    write!(f, "Failed to parse config file '{}': {}", file, message)
                } else {
                    write!(f, "Failed to parse config: {}", message)
                }
            }
            ConfigError::InvalidValue {
                field,
                value,
                message,
            } => write!(
                f,
                "Invalid value '{}' for field '{}': {}",
                value, field, message
            ),
            ConfigError::Duplicate { context, name } => {
                write!(f, "Duplicate {} '{}'", context, name)
            }
            ConfigError::UnknownResource { resource } => {
                write!(f, "No page configured for resource '{}'", resource)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for ConsoleError {
    fn from(err: ConfigError) -> Self {
        ConsoleError::Config(err)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug)]
pub enum ValidationError {
    /// Single field validation error
    FieldError { field: String, message: String },

    /// Multiple field validation errors
    FieldErrors(Vec<FieldValidationError>),

    /// Invalid JSON format
    InvalidJson { message: String },

    /// A query parameter could not be interpreted
    InvalidQuery { param: String, value: String },
}

/// A single field validation error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::FieldError { field, message } => {
                write!(f, "Validation error for field '{}': {}", field, message)
            }
            ValidationError::FieldErrors(errors) => {
                let msgs: Vec<String> = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect();
                write!(f, "Validation errors: {}", msgs.join(", "))
            }
            ValidationError::InvalidJson { message } => {
                write!(f, "Invalid JSON: {}", message)
            }
            ValidationError::InvalidQuery { param, value } => {
                write!(f, "Invalid value '{}' for query parameter '{}'", value, param)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ValidationError::FieldError { .. } | ValidationError::FieldErrors(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ValidationError::InvalidJson { .. } | ValidationError::InvalidQuery { .. } => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::FieldError { .. } | ValidationError::FieldErrors(_) => {
                "VALIDATION_ERROR"
            }
            ValidationError::InvalidJson { .. } => "INVALID_JSON",
            ValidationError::InvalidQuery { .. } => "INVALID_QUERY",
        }
    }

    /// Per-field messages for inline display
    pub fn field_errors(&self) -> Vec<FieldValidationError> {
        match self {
            ValidationError::FieldError { field, message } => vec![FieldValidationError {
                field: field.clone(),
                message: message.clone(),
            }],
            ValidationError::FieldErrors(errors) => errors.clone(),
            _ => Vec::new(),
        }
    }
}

impl From<ValidationError> for ConsoleError {
    fn from(err: ValidationError) -> Self {
        ConsoleError::Validation(err)
    }
}
