use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Row {0} is out of range")]
    RowOutOfRange(usize),

    #[error("The '{name}' file was not found at {path}.")]
    MissingResource { name: String, path: String },

    #[error("Dataset has not been initialized for this session")]
    Uninitialized,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("{0}")]
    Other(String),
}

impl DashError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashError>;
