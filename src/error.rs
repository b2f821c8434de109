//! Error types for record operations
//!
//! Errors are classified by recoverability:
//! - Retryable: network failures, rejected or partially failed requests
//! - NonRetryable: missing records, unreadable responses, configuration
//! - RequiresUserAction: form validation, blocked drag gestures

use thiserror::Error;

use crate::gateway::RecordKind;
use crate::types::RecordId;
use crate::validation::FieldErrors;

/// Error types for record operations
#[derive(Debug, Error)]
pub enum CrmError {
    // Retryable errors
    #[error("Network error: {0}")]
    Network(String),

    #[error("Record service rejected the request: {0}")]
    Remote(String),

    #[error("Failed to {action} {failed} {kind} record(s): {message}")]
    PartialFailure {
        kind: RecordKind,
        action: &'static str,
        failed: usize,
        message: String,
    },

    // Non-retryable errors
    #[error("{kind} {id} not found")]
    NotFound { kind: RecordKind, id: RecordId },

    #[error("Record service returned no {0} record")]
    NoRecordReturned(RecordKind),

    #[error("Failed to parse record service response: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Requires user action
    #[error("Please correct the highlighted fields")]
    Validation(FieldErrors),

    #[error("A stage change for deal {0} is still being saved")]
    CommitInFlight(RecordId),

    #[error("Deal {0} is not on the pipeline board")]
    NotOnBoard(RecordId),
}

impl CrmError {
    /// Returns true if retrying the same action may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CrmError::Network(_) | CrmError::Remote(_) | CrmError::PartialFailure { .. }
        )
    }

    /// Returns true if the user has to change something before retrying
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            CrmError::Validation(_) | CrmError::CommitInFlight(_) | CrmError::NotOnBoard(_)
        )
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CrmError::Network(_) => "Check your internet connection and try again.",
            CrmError::Remote(_) => "The record service refused the change. Try again.",
            CrmError::PartialFailure { .. } => "Some records were not saved. Try again.",
            CrmError::NotFound { .. } => "The record may have been deleted. Refresh the page.",
            CrmError::NoRecordReturned(_) => "Refresh the page to see the latest records.",
            CrmError::Parse(_) => "The record service sent an unexpected response.",
            CrmError::Configuration(_) => {
                "Check your settings in ~/.salesdesk/config.json"
            }
            CrmError::Validation(_) => "Fix the highlighted fields and submit again.",
            CrmError::CommitInFlight(_) => "Wait for the current move to finish.",
            CrmError::NotOnBoard(_) => "Refresh the pipeline and try again.",
        }
    }
}

impl From<serde_json::Error> for CrmError {
    fn from(err: serde_json::Error) -> Self {
        CrmError::Parse(err.to_string())
    }
}

/// Serializable error representation for the presentation layer
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFacingError {
    pub message: String,
    pub error_type: ErrorType,
    pub can_retry: bool,
    pub recovery_suggestion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FieldErrors>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorType {
    Retryable,
    NonRetryable,
    RequiresUserAction,
}

impl From<&CrmError> for UserFacingError {
    fn from(err: &CrmError) -> Self {
        let error_type = if err.requires_user_action() {
            ErrorType::RequiresUserAction
        } else if err.is_retryable() {
            ErrorType::Retryable
        } else {
            ErrorType::NonRetryable
        };

        let field_errors = match err {
            CrmError::Validation(errors) => Some(errors.clone()),
            _ => None,
        };

        UserFacingError {
            message: err.to_string(),
            error_type,
            can_retry: err.is_retryable(),
            recovery_suggestion: err.recovery_suggestion().to_string(),
            field_errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(CrmError::Network("reset".into()).is_retryable());
        assert!(!CrmError::NotFound {
            kind: RecordKind::Deal,
            id: 4
        }
        .is_retryable());
        assert!(CrmError::CommitInFlight(1).requires_user_action());
    }

    #[test]
    fn test_user_facing_validation_carries_fields() {
        let mut errors = FieldErrors::default();
        errors.insert("email", "Email is required");
        let err = CrmError::Validation(errors);
        let ui = UserFacingError::from(&err);
        assert_eq!(ui.error_type, ErrorType::RequiresUserAction);
        assert!(!ui.can_retry);
        let fields = ui.field_errors.unwrap();
        assert_eq!(fields.get("email"), Some("Email is required"));
    }

    #[test]
    fn test_not_found_message() {
        let err = CrmError::NotFound {
            kind: RecordKind::Contact,
            id: 9,
        };
        assert_eq!(err.to_string(), "contact 9 not found");
    }
}
