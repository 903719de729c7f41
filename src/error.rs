use thiserror::Error;

use crate::storage::StorageError;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from the terminal or log file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Loading or saving the folder tree or settings failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Unusable configuration, e.g. a bad log filter.
    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert!(app_err.to_string().contains("file not found"));
    }

    #[test]
    fn terminal_error_display() {
        let err = AppError::Terminal("failed to enter raw mode".into());
        assert_eq!(err.to_string(), "Terminal error: failed to enter raw mode");
    }

    #[test]
    fn storage_error_is_transparent() {
        let err: AppError = StorageError::Watch("inotify limit".into()).into();
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(err.to_string(), "Cannot watch store: inotify limit");
    }

    #[test]
    fn config_error_display() {
        let err = AppError::Config("bad filter".into());
        assert_eq!(err.to_string(), "Configuration error: bad filter");
    }
}
