// src/application/error_handling.rs
//
// Error Handling for Commands
//
// ARCHITECTURE:
// - Maps internal errors → presentation-friendly responses
// - Provides consistent error format for the caller
// - Never exposes database internals
// - Logs errors for debugging

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::error::AppError;

/// Standard error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error_type: ErrorType,
    pub message: String,
    pub details: Option<String>,
}

/// Error categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Resource not found
    NotFound,

    /// Invalid input
    Validation,

    /// Operation not allowed in the current state
    DomainError,

    /// Caller broke a command's precondition (non-adjacent swap, missing neighbour)
    Precondition,

    /// Stored data violates an invariant; nothing was repaired
    DataIntegrity,

    /// Database/persistence error
    Database,

    /// File system error
    FileSystem,

    /// Other/unknown error
    Internal,
}

impl ErrorResponse {
    /// Create error response from AppError
    pub fn from_app_error(error: AppError) -> Self {
        match error {
            AppError::NotFound => Self::not_found("Resource"),

            AppError::Domain(domain_error) => Self::from_domain_error(domain_error),

            AppError::Database(db_error) => {
                log::error!("[DB] Database error: {:?}", db_error);

                Self {
                    success: false,
                    error_type: ErrorType::Database,
                    message: "Database operation failed".to_string(),
                    details: Some("Check logs for details".to_string()),
                }
            }

            AppError::Serialization(serde_error) => {
                log::error!("Serialization error: {:?}", serde_error);

                Self {
                    success: false,
                    error_type: ErrorType::Internal,
                    message: "Data serialization failed".to_string(),
                    details: None,
                }
            }

            AppError::Io(io_error) => {
                log::error!("IO error: {:?}", io_error);

                Self {
                    success: false,
                    error_type: ErrorType::FileSystem,
                    message: "File system operation failed".to_string(),
                    details: Some(io_error.to_string()),
                }
            }

            AppError::Pool(pool_error) => {
                log::error!("[DB] Connection pool error: {}", pool_error);

                Self {
                    success: false,
                    error_type: ErrorType::Database,
                    message: "Database connection failed".to_string(),
                    details: None,
                }
            }

            AppError::Other(message) => {
                log::error!("Other error: {}", message);

                Self {
                    success: false,
                    error_type: ErrorType::Internal,
                    message,
                    details: None,
                }
            }
        }
    }

    fn from_domain_error(error: DomainError) -> Self {
        let (error_type, message) = match &error {
            DomainError::NotFound(_) => (ErrorType::NotFound, "Resource not found"),
            DomainError::PreconditionViolation(_) => {
                (ErrorType::Precondition, "Command is not permitted here")
            }
            DomainError::DataIntegrity(_) => {
                log::warn!("[CATALOG] {}", error);
                (ErrorType::DataIntegrity, "Stored catalog data is inconsistent")
            }
            DomainError::InvalidOperation(_) | DomainError::InvariantViolation(_) => {
                (ErrorType::DomainError, "Domain validation failed")
            }
        };

        Self {
            success: false,
            error_type,
            message: message.to_string(),
            details: Some(error.to_string()),
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

    /// JSON form handed back to the caller
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "Internal error".to_string())
    }
}

/// Helper trait to convert Results to ErrorResponse
pub trait ToErrorResponse<T> {
    fn to_error_response(self) -> Result<T, String>;
}

impl<T> ToErrorResponse<T> for Result<T, AppError> {
    fn to_error_response(self) -> Result<T, String> {
        self.map_err(|e| ErrorResponse::from_app_error(e).to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = ErrorResponse::from_app_error(AppError::NotFound);
        assert_eq!(error.error_type, ErrorType::NotFound);
        assert_eq!(error.message, "Resource not found");
    }

    #[test]
    fn test_validation_error() {
        let error = ErrorResponse::validation("Invalid input".to_string());
        assert_eq!(error.error_type, ErrorType::Validation);
        assert_eq!(error.message, "Invalid input");
    }

    #[test]
    fn test_domain_errors_are_categorized() {
        let precondition = ErrorResponse::from_app_error(AppError::Domain(
            DomainError::PreconditionViolation("not adjacent".to_string()),
        ));
        assert_eq!(precondition.error_type, ErrorType::Precondition);
        assert_eq!(
            precondition.details.as_deref(),
            Some("Precondition violated: not adjacent")
        );

        let integrity = ErrorResponse::from_app_error(AppError::Domain(
            DomainError::DataIntegrity("gap".to_string()),
        ));
        assert_eq!(integrity.error_type, ErrorType::DataIntegrity);

        let invalid = ErrorResponse::from_app_error(AppError::Domain(
            DomainError::InvalidOperation("foreign child".to_string()),
        ));
        assert_eq!(invalid.error_type, ErrorType::DomainError);
    }

    #[test]
    fn test_serialization() {
        let json = ErrorResponse::not_found("Franchise").to_json();
        assert!(json.contains("not_found"));
        assert!(json.contains("Franchise not found"));
    }

    #[test]
    fn test_result_conversion() {
        let result: Result<(), AppError> = Err(AppError::Domain(DomainError::DataIntegrity(
            "duplicate sequence number".to_string(),
        )));
        let message = result.to_error_response().unwrap_err();
        assert!(message.contains("data_integrity"));
    }
}
