use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlRowMapError {
    #[error("Parameter binding error: {0}")]
    BindError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for SqlRowMapError {
    fn from(err: rusqlite::Error) -> Self {
        SqlRowMapError::ExecutionError(format!("sqlite error: {err}"))
    }
}

#[cfg(feature = "sqlite")]
impl From<bb8::RunError<rusqlite::Error>> for SqlRowMapError {
    fn from(err: bb8::RunError<rusqlite::Error>) -> Self {
        SqlRowMapError::ExecutionError(format!("sqlite pool error: {err}"))
    }
}

impl From<tokio::task::JoinError> for SqlRowMapError {
    fn from(err: tokio::task::JoinError) -> Self {
        SqlRowMapError::ExecutionError(format!("blocking task join error: {err}"))
    }
}

impl From<serde_json::Error> for SqlRowMapError {
    fn from(err: serde_json::Error) -> Self {
        SqlRowMapError::EncodingError(err.to_string())
    }
}
