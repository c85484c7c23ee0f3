use std::sync::Arc;

use async_trait::async_trait;
use medkg_core::{CandidateRecord, QueryResult, QuestionEmbedding};

use crate::{
    guard::validate_read_only,
    index::hnsw::{search_similar, SimilarArgs},
    result::to_query_result,
    Database, DbError,
};

/// Nearest-neighbour search over node embeddings.
#[async_trait]
pub trait VectorIndex: Send + Sync + std::fmt::Debug {
    /// Up to `k` candidates in no guaranteed order. Every failure surfaces as
    /// [`DbError::IndexUnavailable`].
    async fn search(
        &self,
        embedding: &QuestionEmbedding,
        k: usize,
    ) -> Result<Vec<CandidateRecord>, DbError>;
}

/// Execution of a structured query against the graph.
#[async_trait]
pub trait GraphStore: Send + Sync + std::fmt::Debug {
    /// Run `query` with read-only semantics. Failures surface as
    /// [`DbError::QueryExecution`] or [`DbError::UnsafeQuery`].
    async fn run_read_query(&self, query: &str) -> Result<QueryResult, DbError>;
}

#[async_trait]
impl VectorIndex for Database {
    async fn search(
        &self,
        embedding: &QuestionEmbedding,
        k: usize,
    ) -> Result<Vec<CandidateRecord>, DbError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let db = self.clone();
        let embedding = embedding.clone();
        tokio::task::spawn_blocking(move || {
            search_similar(SimilarArgs {
                db: &db,
                vector_query: embedding.as_slice(),
                k,
                ef: db.ef(),
            })
        })
        .await
        .map_err(|e| DbError::IndexUnavailable(format!("search task failed: {e}")))?
        .map_err(|e| match e {
            DbError::IndexUnavailable(msg) => DbError::IndexUnavailable(msg),
            other => DbError::IndexUnavailable(other.to_string()),
        })
    }
}

#[async_trait]
impl GraphStore for Database {
    async fn run_read_query(&self, query: &str) -> Result<QueryResult, DbError> {
        validate_read_only(query)?;
        let db = self.clone();
        let script = query.to_string();
        let rows = tokio::task::spawn_blocking(move || db.raw_query(&script))
            .await
            .map_err(|e| DbError::QueryExecution(format!("query task failed: {e}")))?
            .map_err(|e| match e {
                DbError::Cozo(msg) => DbError::QueryExecution(msg),
                other => other,
            })?;
        Ok(to_query_result(rows))
    }
}

#[async_trait]
impl<T: VectorIndex + ?Sized> VectorIndex for Arc<T> {
    async fn search(
        &self,
        embedding: &QuestionEmbedding,
        k: usize,
    ) -> Result<Vec<CandidateRecord>, DbError> {
        (**self).search(embedding, k).await
    }
}

#[async_trait]
impl<T: GraphStore + ?Sized> GraphStore for Arc<T> {
    async fn run_read_query(&self, query: &str) -> Result<QueryResult, DbError> {
        (**self).run_read_query(query).await
    }
}
