//! Error types for the logevo core library.

/// Top-level error enum for the logevo core library.
#[derive(Debug, thiserror::Error)]
pub enum LogEvoError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(feature = "python")]
impl From<LogEvoError> for pyo3::PyErr {
    fn from(err: LogEvoError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};

        match &err {
            LogEvoError::Database(_) | LogEvoError::Sqlite(_) => {
                PyRuntimeError::new_err(err.to_string())
            }
            LogEvoError::Config(_) | LogEvoError::InvalidInput(_) => {
                PyValueError::new_err(err.to_string())
            }
            LogEvoError::Parse(_) => PyValueError::new_err(err.to_string()),
            LogEvoError::Io(_) => PyIOError::new_err(err.to_string()),
            LogEvoError::Json(_) => PyValueError::new_err(err.to_string()),
        }
    }
}

pub type LogEvoResult<T> = Result<T, LogEvoError>;
