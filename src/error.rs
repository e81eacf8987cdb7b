use thiserror::Error;

/// Native status code reported by the engine (`SQLITE_*`).
pub type SqlErrorCode = i32;

/// Classified failure of a database operation.
///
/// Every variant carries the native status code and the engine's latest
/// diagnostic text captured at the moment of failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SqlError {
    #[error("failed to open database (code {code}): {message}")]
    Open { code: SqlErrorCode, message: String },

    #[error("failed to prepare statement (code {code}): {message}")]
    Prepare { code: SqlErrorCode, message: String },

    #[error("failed to step statement (code {code}): {message}")]
    Step { code: SqlErrorCode, message: String },

    #[error("failed to bind value to statement (code {code}): {message}")]
    Bind { code: SqlErrorCode, message: String },

    #[error("failed to reset statement (code {code}): {message}")]
    Reset { code: SqlErrorCode, message: String },

    #[error("failed to execute (code {code}): {message}")]
    Execute { code: SqlErrorCode, message: String },
}

impl SqlError {
    /// Native status code of the failure.
    #[must_use]
    pub fn code(&self) -> SqlErrorCode {
        match self {
            Self::Open { code, .. }
            | Self::Prepare { code, .. }
            | Self::Step { code, .. }
            | Self::Bind { code, .. }
            | Self::Reset { code, .. }
            | Self::Execute { code, .. } => *code,
        }
    }

    /// Diagnostic text captured when the failure happened.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Open { message, .. }
            | Self::Prepare { message, .. }
            | Self::Step { message, .. }
            | Self::Bind { message, .. }
            | Self::Reset { message, .. }
            | Self::Execute { message, .. } => message,
        }
    }

    pub(crate) fn open(code: SqlErrorCode, message: impl Into<String>) -> Self {
        Self::Open {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn prepare(code: SqlErrorCode, message: impl Into<String>) -> Self {
        Self::Prepare {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn step(code: SqlErrorCode, message: impl Into<String>) -> Self {
        Self::Step {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn bind(code: SqlErrorCode, message: impl Into<String>) -> Self {
        Self::Bind {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn reset(code: SqlErrorCode, message: impl Into<String>) -> Self {
        Self::Reset {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn execute(code: SqlErrorCode, message: impl Into<String>) -> Self {
        Self::Execute {
            code,
            message: message.into(),
        }
    }
}

/// Result type for database operations.
pub type SqlResult<T> = Result<T, SqlError>;
