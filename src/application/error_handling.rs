// src/application/error_handling.rs
//
// Error Handling for Commands
//
// ARCHITECTURE:
// - Maps internal errors → user-facing responses
// - Provides one error format for every command
// - Never exposes internal implementation details
// - Logs errors for debugging

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AppError, ErrorKind};

/// Standard error response shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error_type: ErrorType,
    pub message: String,
    pub details: Option<String>,
}

/// Error categories shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The addressed movie (or file) does not exist
    NotFound,

    /// Input rejected before anything was sent
    Validation,

    /// The document or blob store failed
    Remote,

    /// Misconfiguration or a bug
    Internal,
}

impl ErrorResponse {
    /// Create error response from AppError
    pub fn from_app_error(error: AppError) -> Self {
        match error {
            AppError::Config(message) => {
                log::error!("Configuration error: {}", message);
                Self {
                    success: false,
                    error_type: ErrorType::Internal,
                    message: "Configuration is invalid".to_string(),
                    details: Some(message),
                }
            }

            AppError::Other(message) => {
                log::error!("Internal error: {}", message);
                Self {
                    success: false,
                    error_type: ErrorType::Internal,
                    message,
                    details: None,
                }
            }

            error => match error.kind() {
                ErrorKind::NotFound => Self {
                    success: false,
                    error_type: ErrorType::NotFound,
                    message: error.to_string(),
                    details: None,
                },

                ErrorKind::ValidationFailure => Self {
                    success: false,
                    error_type: ErrorType::Validation,
                    message: "Invalid movie data".to_string(),
                    details: Some(validation_detail(&error)),
                },

                ErrorKind::RemoteFailure => {
                    // Log full error for debugging
                    log::error!("Remote failure: {:?}", error);
                    Self {
                        success: false,
                        error_type: ErrorType::Remote,
                        message: "The catalog service could not complete the request".to_string(),
                        details: Some(error.to_string()),
                    }
                }
            },
        }
    }

    /// Create validation error
    pub fn validation(message: String) -> Self {
        Self {
            success: false,
            error_type: ErrorType::Validation,
            message,
            details: None,
        }
    }

    /// Create not found error
    pub fn not_found(resource: &str) -> Self {
        Self {
            success: false,
            error_type: ErrorType::NotFound,
            message: format!("{} not found", resource),
            details: None,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.message.clone())
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{}: {}", self.message, details),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ErrorResponse {}

// Shared fetch failures wrap the domain error; report the innermost message.
fn validation_detail(error: &AppError) -> String {
    match error {
        AppError::Domain(domain) => domain.to_string(),
        AppError::Shared(inner) => validation_detail(inner),
        other => other.to_string(),
    }
}

/// Helper trait to convert Results to ErrorResponse
pub trait ToErrorResponse<T> {
    fn to_error_response(self) -> Result<T, ErrorResponse>;
}

impl<T> ToErrorResponse<T> for Result<T, AppError> {
    fn to_error_response(self) -> Result<T, ErrorResponse> {
        self.map_err(ErrorResponse::from_app_error)
    }
}
