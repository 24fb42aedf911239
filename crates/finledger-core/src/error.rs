use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinledgerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FinledgerError {
    /// Short error code string, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            FinledgerError::Config(_) => "CONFIG_ERROR",
            FinledgerError::InvalidDatetime(_) => "INVALID_DATETIME",
            FinledgerError::Serialization(_) => "SERIALIZATION_ERROR",
            FinledgerError::Io(_) => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, FinledgerError>;
