use thiserror::Error;

/// Why an incoming item was refused before normalization
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("item {index}: not an object")]
    NotAnObject { index: usize },

    #[error("item {index}: missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },
}
