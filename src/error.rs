//! Error types for the host dashboard
//!
//! Provides one structured error type shared by the host reconciler, the
//! device/OSD mapper, the task manager and the REST layer.

use thiserror::Error;

/// Unified error type for the dashboard service
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Host Errors
    // =========================================================================
    #[error("Host not found: {hostname}")]
    HostNotFound { hostname: String },

    #[error("Host already exists: {hostname}")]
    HostAlreadyExists { hostname: String },

    // =========================================================================
    // Orchestrator Errors
    // =========================================================================
    #[error("Orchestrator is not available")]
    OrchestratorUnavailable,

    #[error("Orchestrator operation failed: {operation}: {reason}")]
    OrchestratorOperation { operation: String, reason: String },

    // =========================================================================
    // Task Errors
    // =========================================================================
    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    // =========================================================================
    // Request Errors
    // =========================================================================
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an orchestrator operation error
    pub fn orchestrator(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::OrchestratorOperation {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Short machine-readable error code used in API responses
    pub fn code(&self) -> &'static str {
        match self {
            Error::Internal(_) | Error::Io(_) => "internal_error",
            Error::Configuration(_) => "configuration_error",
            Error::HostNotFound { .. } => "host_not_found",
            Error::HostAlreadyExists { .. } => "host_already_exists",
            Error::OrchestratorUnavailable => "orchestrator_unavailable",
            Error::OrchestratorOperation { .. } => "orchestrator_error",
            Error::TaskNotFound { .. } => "task_not_found",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::JsonParse(_) | Error::YamlParse(_) => "parse_error",
        }
    }

    /// Check if the caller may retry the request later
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::OrchestratorUnavailable)
    }

    /// Check if the error was caused by the request rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::HostNotFound { .. }
                | Error::HostAlreadyExists { .. }
                | Error::TaskNotFound { .. }
                | Error::InvalidArgument(_)
                | Error::OrchestratorOperation { .. }
        )
    }
}

/// Result type alias for the dashboard service
pub type Result<T> = std::result::Result<T, Error>;
