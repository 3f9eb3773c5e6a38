use thiserror::Error;

pub type Result<T> = std::result::Result<T, LoupeError>;

#[derive(Debug, Error)]
pub enum LoupeError {
    #[error("Git error: {0}")]
    Git(#[from] Box<gix::open::Error>),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config error in {path}: {message}")]
    Config { path: String, message: String },
    #[error("Script error on line {line}: {message}")]
    Script { line: usize, message: String },
    #[error("Error: {0}")]
    Generic(String),
}

impl From<gix::open::Error> for LoupeError {
    fn from(error: gix::open::Error) -> Self {
        LoupeError::Git(Box::new(error))
    }
}

impl From<String> for LoupeError {
    fn from(error: String) -> Self {
        LoupeError::Generic(error)
    }
}

impl From<&str> for LoupeError {
    fn from(error: &str) -> Self {
        LoupeError::Generic(error.to_string())
    }
}
