//! Error types for medkg-db

use medkg_error::{FatalError, InternalError, WarningError};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DbError {
    #[error("Database error: {0}")]
    Cozo(String),

    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Query execution error: {0}")]
    QueryExecution(String),

    #[error("Query rejected, contains mutating keyword `{keyword}`")]
    UnsafeQuery { keyword: String },

    #[error("Could not decode column `{column}`: {message}")]
    Decode { column: String, message: String },
}

impl From<DbError> for medkg_error::Error {
    fn from(value: DbError) -> Self {
        match value {
            DbError::IndexUnavailable(msg) => FatalError::IndexUnavailable(msg).into(),
            DbError::QueryExecution(msg) => WarningError::QueryExecution(msg).into(),
            DbError::UnsafeQuery { keyword } => WarningError::UnsafeQuery {
                keyword,
                query: String::new(),
            }
            .into(),
            DbError::Decode { column, message } => {
                InternalError::Decode(format!("{column}: {message}")).into()
            }
            DbError::Cozo(msg) => InternalError::InvalidState(msg).into(),
        }
    }
}
