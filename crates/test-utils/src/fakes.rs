//! Substitute collaborators for orchestrator tests. Each one counts its calls so tests can
//! assert that a stage was, or was not, reached.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use medkg_core::{CandidateRecord, QueryResult, QuestionEmbedding};
use medkg_db::{DbError, GraphStore, VectorIndex};
use medkg_embed::{EmbedError, Embedder};
use medkg_llm::{Generator, LlmError};

/// Returns the same vector for every question, or always fails.
#[derive(Debug)]
pub struct FakeEmbedder {
    result: Result<Vec<f32>, EmbedError>,
    dims: usize,
    calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn fixed(vector: Vec<f32>) -> Self {
        Self {
            dims: vector.len(),
            result: Ok(vector),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(err: EmbedError) -> Self {
        Self {
            result: Err(err),
            dims: 0,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, _text: &str) -> Result<QuestionEmbedding, EmbedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let v = self.result.clone()?;
        Ok(QuestionEmbedding::new(v)?)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// Serves a fixed batch of candidates, in the order given, truncated to `k`.
#[derive(Debug)]
pub struct StaticIndex {
    result: Result<Vec<CandidateRecord>, DbError>,
    calls: AtomicUsize,
}

impl StaticIndex {
    pub fn new(records: Vec<CandidateRecord>) -> Self {
        Self {
            result: Ok(records),
            calls: AtomicUsize::new(0),
        }
    }

    /// Candidates named `c0, c1, ...` carrying the given scores.
    pub fn with_scores(scores: &[f32]) -> Self {
        Self::new(
            scores
                .iter()
                .enumerate()
                .map(|(i, s)| CandidateRecord::named(format!("c{i}"), *s))
                .collect(),
        )
    }

    pub fn failing(err: DbError) -> Self {
        Self {
            result: Err(err),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorIndex for StaticIndex {
    async fn search(
        &self,
        _embedding: &QuestionEmbedding,
        k: usize,
    ) -> Result<Vec<CandidateRecord>, DbError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut records = self.result.clone()?;
        records.truncate(k);
        Ok(records)
    }
}

/// Answers every read query with the same result and remembers what it was asked.
#[derive(Debug)]
pub struct CountingStore {
    result: Result<QueryResult, DbError>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl CountingStore {
    pub fn new(result: QueryResult) -> Self {
        Self {
            result: Ok(result),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: DbError) -> Self {
        Self {
            result: Err(err),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.seen.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl GraphStore for CountingStore {
    async fn run_read_query(&self, query: &str) -> Result<QueryResult, DbError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(query.to_string());
        }
        self.result.clone()
    }
}

/// Replies according to the first rule whose needle occurs in the prompt, falling back to a
/// default reply.
#[derive(Debug)]
pub struct ScriptedGenerator {
    rules: Vec<(String, Result<String, LlmError>)>,
    default: Result<String, LlmError>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            default: Ok(default.into()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn reply_when(mut self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        self.rules.push((needle.into(), Ok(reply.into())));
        self
    }

    pub fn fail_when(mut self, needle: impl Into<String>, err: LlmError) -> Self {
        self.rules.push((needle.into(), Err(err)));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default.clone())
    }
}

/// The error an `ollama run` of a missing model produces.
pub fn model_not_found() -> LlmError {
    LlmError::Invocation {
        status: Some(1),
        stderr: "model not found".to_string(),
    }
}
