use model::filter::FilterError;
use thiserror::Error;

pub mod client;
pub mod database;
pub mod memory;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Establishment not found")]
    NotFound,

    #[error(transparent)]
    InvalidInput(#[from] FilterError),

    #[error("Database error: {0}")]
    Store(database::DatabaseError),
}

impl From<database::DatabaseError> for RequestError {
    fn from(value: database::DatabaseError) -> Self {
        match value {
            database::DatabaseError::NotFound => Self::NotFound,
            other => Self::Store(other),
        }
    }
}

pub type RequestResult<O> = Result<O, RequestError>;
