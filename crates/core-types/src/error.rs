use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),
}
