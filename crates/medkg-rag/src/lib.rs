//! Hybrid retrieval over the medical knowledge graph.
//!
//! [`RagService`] answers a question through two independent channels: vector similarity
//! over node embeddings, and a model-written CozoScript query run read-only against the
//! graph. Each channel ends in its own answer; see [`HybridReport`].
pub mod context;
pub mod core;
pub mod error;
pub mod execute;
pub mod rank;
pub mod translate;

pub use context::{ApproxCharTokenizer, ContextBudget, TokenCounter};
pub use crate::core::{
    HybridReport, QueryReport, QueryStage, RagConfig, RagService, RequestStage, RetrievalConfig,
    TimeoutConfig, VectorReport, VectorStage,
};
pub use error::RagError;
pub use execute::{NoQueryReason, QueryExecutor, QueryOutcome};
pub use translate::QueryTranslator;
