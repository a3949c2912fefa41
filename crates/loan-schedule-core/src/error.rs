use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoanScheduleError {
    #[error("Invalid amount: {field}: {reason}")]
    InvalidAmount { field: String, reason: String },

    #[error("Invalid rate: {field}: {reason}")]
    InvalidRate { field: String, reason: String },

    #[error("Invalid installment: {field}: {reason}")]
    InvalidInstallment { field: String, reason: String },

    #[error("Invalid count: {field}: {reason}")]
    InvalidCount { field: String, reason: String },

    #[error("Missing field: {field}: {reason}")]
    MissingField { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Coarse category of a validation failure, for callers that map errors to
/// user-facing messages without matching on the full variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidAmount,
    InvalidRate,
    InvalidInstallment,
    InvalidCount,
    MissingField,
    Serialization,
}

impl LoanScheduleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoanScheduleError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            LoanScheduleError::InvalidRate { .. } => ErrorKind::InvalidRate,
            LoanScheduleError::InvalidInstallment { .. } => ErrorKind::InvalidInstallment,
            LoanScheduleError::InvalidCount { .. } => ErrorKind::InvalidCount,
            LoanScheduleError::MissingField { .. } => ErrorKind::MissingField,
            LoanScheduleError::SerializationError(_) => ErrorKind::Serialization,
        }
    }

    /// The input field the failure refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            LoanScheduleError::InvalidAmount { field, .. }
            | LoanScheduleError::InvalidRate { field, .. }
            | LoanScheduleError::InvalidInstallment { field, .. }
            | LoanScheduleError::InvalidCount { field, .. }
            | LoanScheduleError::MissingField { field, .. } => Some(field),
            LoanScheduleError::SerializationError(_) => None,
        }
    }

    /// Human-readable explanation without the kind prefix.
    pub fn reason(&self) -> &str {
        match self {
            LoanScheduleError::InvalidAmount { reason, .. }
            | LoanScheduleError::InvalidRate { reason, .. }
            | LoanScheduleError::InvalidInstallment { reason, .. }
            | LoanScheduleError::InvalidCount { reason, .. }
            | LoanScheduleError::MissingField { reason, .. } => reason,
            LoanScheduleError::SerializationError(msg) => msg,
        }
    }
}

impl From<serde_json::Error> for LoanScheduleError {
    fn from(e: serde_json::Error) -> Self {
        LoanScheduleError::SerializationError(e.to_string())
    }
}

/// Field-level view of a failure, suitable for returning to a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub kind: ErrorKind,
    pub field: String,
    pub message: String,
}

impl From<&LoanScheduleError> for FieldIssue {
    fn from(e: &LoanScheduleError) -> Self {
        FieldIssue {
            kind: e.kind(),
            field: e.field().unwrap_or_default().to_string(),
            message: e.reason().to_string(),
        }
    }
}
