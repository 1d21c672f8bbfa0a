//! Error types for the pool engine
use thiserror::Error;

use crate::resource::Placeholder;
use crate::task::TaskType;

/// Result type for pool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Every fault a pool operation can report.
///
/// Usage faults, dispatch faults and race faults all leave the registries
/// valid; none of them is fatal to the pool.
#[derive(Error, Debug)]
pub enum Error {
    /// `initialize` was called on a pool that finished initializing before.
    #[error("Pool has already been initialized")]
    AlreadyInitialized,

    /// A connection handle was required but none was supplied.
    #[error("Cannot {operation} a null connection")]
    NullConnection {
        /// The pool operation that received the null handle
        operation: &'static str,
    },

    /// No operator claimed a dispatched task.
    #[error("Something wrong, can not find any worker for task {task_type}")]
    NoOperator {
        /// Rendered task type, or `None` when no task was given
        task_type: String,
    },

    /// An operator claimed a task and failed while servicing it.
    #[error("Operator '{operator}' failed: {message}")]
    Operator {
        /// Operator name
        operator: String,
        /// The failure description
        message: String,
    },

    /// A placeholder was no longer present in the pool when it was replaced.
    #[error("Placeholder {placeholder} not found in pool")]
    PlaceholderNotFound {
        /// The missing reservation token
        placeholder: Placeholder,
    },

    /// Appending to the pool would exceed the configured maximum.
    #[error("Pool is full: {max} slots in use")]
    PoolFull {
        /// The configured maximum
        max: usize,
    },

    /// The connection manager failed to create a connection.
    #[error("Failed to create connection: {reason}")]
    Connect {
        /// The failure reason
        reason: String,
        /// The underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The connection manager failed to destroy a connection.
    #[error("Failed to destroy connection: {reason}")]
    Disconnect {
        /// The failure reason
        reason: String,
        /// The underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A pending request was not fulfilled in time.
    #[error("Timed out after {timeout_ms}ms waiting for a connection")]
    AcquireTimeout {
        /// The timeout in milliseconds
        timeout_ms: u64,
    },

    /// The pool was cleared while the request was still pending.
    #[error("Pool was cleared while the request was pending")]
    Cleared,

    /// Pool options are invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// The error message
        message: String,
    },
}

impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a connect error without an underlying source
    pub fn connect<S: Into<String>>(reason: S) -> Self {
        Self::Connect {
            reason: reason.into(),
            source: None,
        }
    }

    /// Create a connect error wrapping an underlying error
    pub fn connect_with<E>(reason: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connect {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a disconnect error without an underlying source
    pub fn disconnect<S: Into<String>>(reason: S) -> Self {
        Self::Disconnect {
            reason: reason.into(),
            source: None,
        }
    }

    /// Create an operator error
    pub fn operator(operator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Operator {
            operator: operator.into(),
            message: message.into(),
        }
    }

    /// Fault raised when a dispatch found no operator for `task_type`.
    #[must_use]
    pub fn no_operator(task_type: Option<TaskType>) -> Self {
        Self::NoOperator {
            task_type: task_type.map_or_else(|| "None".to_string(), |t| t.to_string()),
        }
    }

    /// Check if this error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connect { .. } | Self::AcquireTimeout { .. } | Self::PoolFull { .. } => true,
            Self::PlaceholderNotFound { .. } | Self::Cleared => true,
            _ => false,
        }
    }
}
