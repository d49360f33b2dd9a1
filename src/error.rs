//! Error types for sqlbridge.
//!
//! Driver crates surface failures as free-form text; [`Error::classify`]
//! folds those messages into a stable taxonomy so callers can branch on
//! [`ErrorKind`] instead of scraping strings themselves.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Failed to establish or keep a connection.
    Connection,
    /// Credentials rejected.
    Authentication,
    /// Operation exceeded its time budget.
    Timeout,
    /// Statement failed to parse on the server.
    Syntax,
    /// Statement parsed but failed to execute.
    Execution,
    /// Constraint violation (unique, foreign key, ...).
    Constraint,
    /// Transaction left in an unusable state.
    Transaction,
    /// Operation denied by the server's grants.
    PermissionDenied,
    /// Referenced object does not exist.
    NotFound,
    /// Caller passed something unusable.
    InvalidArgument,
    /// Operation not supported by this dialect or driver.
    Unsupported,
    /// Bad configuration.
    Configuration,
    /// Invariant violation inside the crate.
    Internal,
}

/// Errors produced by connectors, dialects, and drivers.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection establishment or liveness failure.
    #[error("connection error: {message}")]
    Connection {
        /// Human-readable description.
        message: String,
    },

    /// Authentication failure.
    #[error("authentication failed: {message}")]
    Authentication {
        /// Server-provided detail.
        message: String,
    },

    /// Timed out.
    #[error("timeout: {message}")]
    Timeout {
        /// What timed out.
        message: String,
    },

    /// SQL syntax error.
    #[error("syntax error: {message}")]
    Syntax {
        /// Server-provided detail.
        message: String,
        /// The offending statement, if known.
        sql: Option<String>,
    },

    /// Statement execution failure.
    #[error("execution failed: {message}")]
    Execution {
        /// Server-provided detail.
        message: String,
        /// The offending statement, if known.
        sql: Option<String>,
    },

    /// Constraint violation.
    #[error("constraint violation: {message}")]
    Constraint {
        /// Server-provided detail.
        message: String,
    },

    /// Transaction in an unusable state; the session must reconnect.
    #[error("transaction error: {message}")]
    Transaction {
        /// Server-provided detail.
        message: String,
    },

    /// Permission denied.
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Server-provided detail.
        message: String,
    },

    /// Object not found.
    #[error("not found: {name}")]
    NotFound {
        /// Missing object name.
        name: String,
    },

    /// Invalid argument from the caller.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong.
        message: String,
    },

    /// Unsupported operation for this dialect or driver.
    #[error("unsupported: {message}")]
    Unsupported {
        /// What is unsupported.
        message: String,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Configuration {
        /// What is misconfigured.
        message: String,
    },

    /// Internal invariant violation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the violated invariant.
        message: String,
    },
}

impl Error {
    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Error::Connection {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Error::Timeout {
            message: message.into(),
        }
    }

    /// Create an execution error without statement context.
    pub fn execution(message: impl Into<String>) -> Self {
        Error::Execution {
            message: message.into(),
            sql: None,
        }
    }

    /// Create a not-found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Error::NotFound { name: name.into() }
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an unsupported-operation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Error::Unsupported {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// The taxonomy bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Connection { .. } => ErrorKind::Connection,
            Error::Authentication { .. } => ErrorKind::Authentication,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Syntax { .. } => ErrorKind::Syntax,
            Error::Execution { .. } => ErrorKind::Execution,
            Error::Constraint { .. } => ErrorKind::Constraint,
            Error::Transaction { .. } => ErrorKind::Transaction,
            Error::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Error::Unsupported { .. } => ErrorKind::Unsupported,
            Error::Configuration { .. } => ErrorKind::Configuration,
            Error::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Whether the session should drop its cached connection after this
    /// error. Transaction-state errors leave the wire session unusable.
    pub fn forces_reconnect(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transaction | ErrorKind::Connection)
    }

    /// Classify a raw driver message into the taxonomy.
    ///
    /// Substring matching over lower-cased server text. Server upgrades can
    /// reword these messages, so every pattern lives here and nowhere else.
    pub fn classify(message: impl Into<String>, sql: Option<&str>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if lower.contains("syntax error") || lower.contains("parse error") {
            return Error::Syntax {
                message,
                sql: sql.map(str::to_owned),
            };
        }
        if lower.contains("timeout") || lower.contains("timed out") {
            return Error::Timeout { message };
        }
        if lower.contains("authentication")
            || lower.contains("access denied")
            || lower.contains("login failed")
        {
            return Error::Authentication { message };
        }
        if lower.contains("permission denied") || lower.contains("insufficient privilege") {
            return Error::PermissionDenied { message };
        }
        if lower.contains("connection refused")
            || lower.contains("connection failed")
            || lower.contains("unable to open")
        {
            return Error::Connection { message };
        }
        if lower.contains("invalid transaction") || lower.contains("can't reconnect") {
            return Error::Transaction { message };
        }
        if lower.contains("duplicate")
            || lower.contains("constraint")
            || lower.contains("unique")
            || lower.contains("foreign key")
        {
            return Error::Constraint { message };
        }

        Error::Execution {
            message,
            sql: sql.map(str::to_owned),
        }
    }
}
