//! Graph store for the biomedical knowledge graph, backed by CozoDB.
//!
//! Two read paths are exposed behind traits so the orchestrator can be tested against
//! substitutes:
//! - [`VectorIndex`]: HNSW nearest-neighbour search over node embeddings
//! - [`GraphStore`]: execution of an arbitrary, read-only CozoScript query
//!
//! [`guard::validate_read_only`] is the gate every model-generated query has to pass before it
//! is allowed near [`GraphStore::run_read_query`].
mod database;
mod error;
pub mod guard;
mod index;
mod result;
pub mod schema;
mod store;

pub use database::{Database, Engine, DEFAULT_EF};
pub use error::DbError;
pub use index::hnsw::{search_similar, SimilarArgs};
pub use result::{to_query_result, value_to_json};
pub use store::{GraphStore, VectorIndex};
