use thiserror::Error;

#[derive(Error, Debug)]
pub enum NutriError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid facts: {0}")]
    InvalidFacts(String),

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Rule ID already exists: {0}")]
    DuplicateKey(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("ID mismatch: path has '{path}' but rule body has '{body}'")]
    IdMismatch { path: String, body: String },
}

pub type Result<T> = std::result::Result<T, NutriError>;
