use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Duplicate: {0}")]
    Duplicate(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code reported to callers.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Duplicate(_) => "DUPLICATE",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Storage(_) | AppError::Serialization(_) | AppError::Csv(_) => {
                "STORAGE_FAILURE"
            }
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP-style status code for the error.
    pub fn status(&self) -> u16 {
        match self {
            AppError::InvalidInput(_) => 400,
            AppError::Unauthorized => 401,
            AppError::Duplicate(_) => 409,
            AppError::Storage(_)
            | AppError::Serialization(_)
            | AppError::Csv(_)
            | AppError::Internal(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
