use database::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecalcError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Concurrency must be at least 1")]
    InvalidConcurrency,
}
