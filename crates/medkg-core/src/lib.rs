//! Core data types shared across the medkg crates.
//!
//! Everything in here is request-scoped: an embedding, the candidates it retrieves, the query
//! the model produced and the rows that query returned are created for one question and
//! dropped once that question is answered.
pub mod query;
pub mod rag_types;
pub mod records;
pub mod schema;

pub use query::{GeneratedQuery, QueryResult, QueryResultRow};
pub use records::{CandidateRecord, QuestionEmbedding};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Embedding vector is empty")]
    EmptyEmbedding,

    #[error("Embedding contains a non-finite value at position {0}")]
    NonFiniteEmbedding(usize),
}
