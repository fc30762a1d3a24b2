//! Error types for fundweb-core
//!
//! Two kinds of failure come out of an edit and they are kept apart:
//! - `ValidationError`: a user-correctable problem with the submitted batch,
//!   reported as a list before anything is mutated.
//! - `ApplyError`: a fatal problem while applying an already validated
//!   batch. It aborts the whole batch and is never downgraded to a
//!   validation error.
//!
//! `CoreError` wraps both for the store level and carries the error code,
//! severity and details used for logging and API responses.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::currency::CurrencyError;
use crate::models::Transaction;
use crate::types::{Phid, TransactionType};

/// One problem found while validating a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub title: String,
    pub message: String,
    /// Identifier of the offending transaction, if any
    pub transaction_id: Option<Phid>,
    /// A required field would be left empty
    pub is_missing_field_error: bool,
}

impl ValidationError {
    pub fn new(
        transaction_type: TransactionType,
        title: impl Into<String>,
        message: impl Into<String>,
        transaction: Option<&Transaction>,
    ) -> Self {
        Self {
            transaction_type,
            title: title.into(),
            message: message.into(),
            transaction_id: transaction.map(|x| x.id().clone()),
            is_missing_field_error: false,
        }
    }

    pub fn missing_field(mut self) -> Self {
        self.is_missing_field_error = true;
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.title, self.transaction_type, self.message)
    }
}

/// Fatal error raised while applying a validated batch
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApplyError {
    #[error("No such backer: {phid}")]
    BackerNotFound { phid: Phid },

    #[error("Invalid value for {transaction_type}: expected {expected}, got {actual}")]
    InvalidValue {
        transaction_type: TransactionType,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Transaction type {transaction_type} is not supported by this editor")]
    UnsupportedTransactionType { transaction_type: TransactionType },

    #[error(transparent)]
    Currency(#[from] CurrencyError),
}

/// Outcome of a rejected edit
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("Validation failed with {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    #[error("Apply failed: {0}")]
    Apply(#[from] ApplyError),
}

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InitiativeNotFound,
    ValidationError,
    ReferenceNotFound,
    InvalidValue,
    UnsupportedTransactionType,
    CurrencyError,
    ParseError,
    IoError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::InitiativeNotFound => write!(f, "INITIATIVE_NOT_FOUND"),
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::ReferenceNotFound => write!(f, "REFERENCE_NOT_FOUND"),
            ErrorCode::InvalidValue => write!(f, "INVALID_VALUE"),
            ErrorCode::UnsupportedTransactionType => write!(f, "UNSUPPORTED_TRANSACTION_TYPE"),
            ErrorCode::CurrencyError => write!(f, "CURRENCY_ERROR"),
            ErrorCode::ParseError => write!(f, "PARSE_ERROR"),
            ErrorCode::IoError => write!(f, "IO_ERROR"),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Info,
    /// The request was rejected, nothing changed
    Warning,
    Error,
    /// Indicates a race or a bug
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Main error type for fundweb-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Initiative not found: {phid}")]
    InitiativeNotFound { phid: Phid },

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("IO error: {message}")]
    IoError { message: String },
}

impl From<std::io::Error> for CoreError {
    fn from(error: std::io::Error) -> Self {
        CoreError::IoError {
            message: error.to_string(),
        }
    }
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::InitiativeNotFound { .. } => ErrorCode::InitiativeNotFound,
            CoreError::Edit(EditError::Validation(_)) => ErrorCode::ValidationError,
            CoreError::Edit(EditError::Apply(e)) => match e {
                ApplyError::BackerNotFound { .. } => ErrorCode::ReferenceNotFound,
                ApplyError::InvalidValue { .. } => ErrorCode::InvalidValue,
                ApplyError::UnsupportedTransactionType { .. } => ErrorCode::UnsupportedTransactionType,
                ApplyError::Currency(_) => ErrorCode::CurrencyError,
            },
            CoreError::ParseError { .. } => ErrorCode::ParseError,
            CoreError::IoError { .. } => ErrorCode::IoError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::InitiativeNotFound { .. } => ErrorSeverity::Info,
            CoreError::Edit(EditError::Validation(_)) => ErrorSeverity::Warning,
            CoreError::Edit(EditError::Apply(_)) => ErrorSeverity::Critical,
            CoreError::ParseError { .. } => ErrorSeverity::Error,
            CoreError::IoError { .. } => ErrorSeverity::Error,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::Edit(EditError::Validation(errors)) => {
                details = details.with_detail(serde_json::json!({ "errors": errors }));
                details = details.with_suggestion(
                    "Correct the listed fields and submit the edit again.".to_string(),
                );
            }
            CoreError::Edit(EditError::Apply(ApplyError::BackerNotFound { phid })) => {
                details = details.with_detail(serde_json::json!({ "backer": phid }));
                details = details.with_suggestion(
                    "The backer disappeared between validation and apply; retry the edit.".to_string(),
                );
            }
            CoreError::ParseError { .. } => {
                details = details.with_suggestion(
                    "Check the seed file against the documented JSON layout.".to_string(),
                );
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation being performed
    pub operation: String,
    /// Acting user, if known
    pub actor: Option<Phid>,
    /// Object being edited, if any
    pub object: Option<Phid>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Self::default()
        }
    }

    pub fn with_actor(mut self, actor: Phid) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn with_object(mut self, object: Phid) -> Self {
        self.object = Some(object);
        self
    }
}

/// Error logger trait
pub trait ErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
}

/// Default error logger using log crate; level follows the error severity
#[derive(Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        let level = match error.severity() {
            ErrorSeverity::Info => log::Level::Debug,
            ErrorSeverity::Warning => log::Level::Warn,
            ErrorSeverity::Error | ErrorSeverity::Critical => log::Level::Error,
        };
        log::log!(
            target: "fundweb::error",
            level,
            "[{}] {} - Operation: {} - Actor: {:?} - Object: {:?}",
            error.code(),
            error,
            context.operation,
            context.actor,
            context.object
        );
    }
}

// ==================== Tests ====================
