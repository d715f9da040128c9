use serde::Serialize;
use std::fmt;

#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type", content = "data")]
pub enum CockpitError {
    SessionNotFound {
        session_id: String,
    },
    PtySpawnFailed {
        message: String,
    },
    TerminalOperationFailed {
        session_id: String,
        operation: String,
        message: String,
    },
    IoError {
        operation: String,
        path: String,
        message: String,
    },
    PersistenceError {
        message: String,
    },
    InvalidInput {
        field: String,
        message: String,
    },
}

impl CockpitError {
    pub fn spawn(error: impl ToString) -> Self {
        CockpitError::PtySpawnFailed {
            message: error.to_string(),
        }
    }

    pub fn terminal(session_id: &str, operation: &str, error: impl ToString) -> Self {
        CockpitError::TerminalOperationFailed {
            session_id: session_id.to_string(),
            operation: operation.to_string(),
            message: error.to_string(),
        }
    }

    pub fn io(operation: &str, path: impl ToString, error: impl ToString) -> Self {
        CockpitError::IoError {
            operation: operation.to_string(),
            path: path.to_string(),
            message: error.to_string(),
        }
    }

    pub fn invalid_input(field: &str, message: impl ToString) -> Self {
        CockpitError::InvalidInput {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for CockpitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::SessionNotFound { session_id } => {
                write!(f, "Session '{session_id}' not found")
            }
            Self::PtySpawnFailed { message } => {
                write!(f, "Failed to spawn PTY: {message}")
            }
            Self::TerminalOperationFailed {
                session_id,
                operation,
                message,
            } => {
                write!(
                    f,
                    "Terminal operation '{operation}' failed for session '{session_id}': {message}"
                )
            }
            Self::IoError {
                operation,
                path,
                message,
            } => {
                write!(f, "I/O error during '{operation}' on '{path}': {message}")
            }
            Self::PersistenceError { message } => {
                write!(f, "Persistence error: {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
        }
    }
}

impl std::error::Error for CockpitError {}

impl From<CockpitError> for String {
    fn from(error: CockpitError) -> Self {
        error.to_string()
    }
}
