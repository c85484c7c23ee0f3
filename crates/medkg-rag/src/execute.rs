use std::sync::Arc;

use medkg_core::{GeneratedQuery, QueryResult};
use medkg_db::{guard::validate_read_only, DbError, GraphStore};
use tracing::instrument;

use crate::error::RagError;

/// Why the query channel has nothing to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoQueryReason {
    /// The model produced no query text.
    Empty,
    /// The query failed the read-only check.
    Unsafe { keyword: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    NoQuery(NoQueryReason),
    Rows(QueryResult),
}

impl QueryOutcome {
    pub fn rows(&self) -> Option<&QueryResult> {
        match self {
            QueryOutcome::Rows(r) => Some(r),
            QueryOutcome::NoQuery(_) => None,
        }
    }
}

/// Check a generated query against the read-only rules. An empty query trivially passes.
pub fn validate(query: &GeneratedQuery) -> Result<(), RagError> {
    let Some(text) = query.as_str() else {
        return Ok(());
    };
    validate_read_only(text).map_err(|e| match e {
        DbError::UnsafeQuery { keyword } => RagError::UnsafeQuery {
            keyword,
            query: text.to_string(),
        },
        other => RagError::QueryExecution(other.to_string()),
    })
}

#[derive(Debug, Clone)]
pub struct QueryExecutor {
    store: Arc<dyn GraphStore>,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Run a generated query if there is one and it is read-only.
    ///
    /// Empty and rejected queries never reach the store.
    #[instrument(skip_all, fields(query_len = query.as_str().map_or(0, str::len)))]
    pub async fn execute(&self, query: &GeneratedQuery) -> Result<QueryOutcome, RagError> {
        let Some(text) = query.as_str() else {
            tracing::debug!("no query to execute");
            return Ok(QueryOutcome::NoQuery(NoQueryReason::Empty));
        };
        if let Err(e) = validate(query) {
            tracing::warn!(error = %e, "generated query rejected");
            return match e {
                RagError::UnsafeQuery { keyword, .. } => {
                    Ok(QueryOutcome::NoQuery(NoQueryReason::Unsafe { keyword }))
                }
                other => Err(other),
            };
        }
        match self.store.run_read_query(text).await {
            Ok(rows) => {
                tracing::debug!(rows = rows.len(), headers = ?rows.headers, "query executed");
                Ok(QueryOutcome::Rows(rows))
            }
            Err(DbError::UnsafeQuery { keyword }) => {
                tracing::warn!(%keyword, "store rejected generated query");
                Ok(QueryOutcome::NoQuery(NoQueryReason::Unsafe { keyword }))
            }
            Err(e) => {
                tracing::warn!(error = %e, "generated query failed");
                Err(RagError::QueryExecution(e.to_string()))
            }
        }
    }
}
