use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Usage query failed: {0}")]
    Usage(String),

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Background task failed: {0}")]
    Join(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl AppError {
    pub fn capture(self) -> Self {
        sentry::capture_message(&self.to_string(), sentry::Level::Error);
        self
    }

    /// Every failure raised by the file-system service surfaces as the same kind.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Io
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Join(err.to_string())
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Io,
    InvalidRequest,
}
