//! Error types for vaultweb-core
//!
//! Every store interaction fails the same way from the page's point of view,
//! so there is a single error kind. Failures are reported through an
//! [`ErrorLogger`] and never propagated past the controller.

use thiserror::Error;

use crate::store::Operation;

/// Main error type for vaultweb-core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Network failure, non-success status, or an undecodable response
    #[error("Request failed ({operation}): {reason}")]
    RequestFailed { operation: Operation, reason: String },
}

impl CoreError {
    pub fn request_failed(operation: Operation, reason: impl Into<String>) -> Self {
        CoreError::RequestFailed {
            operation,
            reason: reason.into(),
        }
    }

    /// The store operation that failed
    pub fn operation(&self) -> Operation {
        match self {
            CoreError::RequestFailed { operation, .. } => *operation,
        }
    }

    /// Short message suitable for showing next to the failed action
    pub fn user_message(&self) -> String {
        match self.operation() {
            Operation::List => "Could not load accounts from the store.".to_string(),
            op => format!("The store did not accept the {} request. Please try again.", op),
        }
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation being performed
    pub operation: String,
    /// Additional context data
    pub data: serde_json::Value,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            data: serde_json::json!({}),
        }
    }

    /// Add context data
    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data[key] = value;
        self
    }
}

/// Diagnostic channel for failed actions
pub trait ErrorLogger: Send + Sync {
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Debug, Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        log::error!(
            target: "vaultweb::error",
            "ERROR {} - Action: {} - Context: {}",
            error,
            context.operation,
            context.data
        );
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(
            target: "vaultweb::error",
            "WARNING: {} - Action: {} - Context: {}",
            message,
            context.operation,
            context.data
        );
    }
}

// ==================== Tests ====================
