
use std::{fmt, future::Future, sync::Arc, time::Duration};

use medkg_core::{
    rag_types::{AssembledContext, Modality},
    CandidateRecord, GeneratedQuery,
};
use medkg_db::{DbError, GraphStore, VectorIndex};
use medkg_embed::Embedder;
use medkg_llm::Generator;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    context::{
        assemble_query_context, assemble_vector_context, query_answer_prompt,
        vector_answer_prompt, ApproxCharTokenizer, ContextBudget, TokenCounter,
    },
    error::RagError,
    execute::{NoQueryReason, QueryExecutor, QueryOutcome},
    rank::{rank, top_n},
    translate::QueryTranslator,
};

/// How many candidates to fetch, log and hand to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Nearest neighbours requested from the vector index.
    pub top_k: usize,
    /// Ranked matches written to the log and kept in the report.
    pub log_top: usize,
    /// Ranked matches used as answer context.
    pub context_n: usize,
    pub budget: ContextBudget,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            log_top: 3,
            context_n: 2,
            budget: ContextBudget::default(),
        }
    }
}

/// Per-stage limits, in seconds.
///
/// `translate_secs` and `generate_secs` bound the model call itself. Time spent waiting for a
/// shared model behind a [`medkg_llm::GenerationQueue`] is not counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub embed_secs: u64,
    pub search_secs: u64,
    pub translate_secs: u64,
    pub execute_secs: u64,
    pub generate_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            embed_secs: 30,
            search_secs: 10,
            translate_secs: 45,
            execute_secs: 10,
            generate_secs: 45,
        }
    }
}

impl TimeoutConfig {
    pub fn embed(&self) -> Duration {
        Duration::from_secs(self.embed_secs)
    }

    pub fn search(&self) -> Duration {
        Duration::from_secs(self.search_secs)
    }

    pub fn translate(&self) -> Duration {
        Duration::from_secs(self.translate_secs)
    }

    pub fn execute(&self) -> Duration {
        Duration::from_secs(self.execute_secs)
    }

    pub fn generate(&self) -> Duration {
        Duration::from_secs(self.generate_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub retrieval: RetrievalConfig,
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VectorStage {
    Start,
    Embedded,
    Retrieved,
    Ranked,
    VectorAnswered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QueryStage {
    Start,
    Translated,
    Executed,
    QueryAnswered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RequestStage {
    Done,
}

/// What the vector channel retrieved and answered.
#[derive(Debug, Clone)]
pub struct VectorReport {
    pub stage: VectorStage,
    /// The best `log_top` ranked matches.
    pub top_matches: Vec<CandidateRecord>,
    /// The ranked matches the answer was generated from.
    pub context_records: Vec<CandidateRecord>,
    pub context: AssembledContext,
    pub answer: Result<String, RagError>,
}

/// What the query channel generated, ran and answered.
#[derive(Debug, Clone)]
pub struct QueryReport {
    pub stage: QueryStage,
    /// `None` when translation failed.
    pub generated: Option<GeneratedQuery>,
    /// `None` when translation or execution failed.
    pub outcome: Option<QueryOutcome>,
    /// Why the channel answered from an empty context, if it did.
    pub failure: Option<RagError>,
    pub context: AssembledContext,
    pub answer: Result<String, RagError>,
}

#[derive(Debug, Clone)]
pub struct HybridReport {
    pub question: String,
    pub vector: VectorReport,
    pub query: QueryReport,
    pub stage: RequestStage,
}

/// Hybrid question answering over the knowledge graph.
///
/// Each question runs two channels concurrently:
/// - vector: embed the question, search the node index, rank, answer from the top matches
/// - query: translate the question into a read-only CozoScript query, run it, answer from the rows
///
/// Only a failure to embed or to search aborts the request. Anything else is recorded in the
/// failing channel's report and that channel answers from an empty context.
#[derive(Debug, Clone)]
pub struct RagService {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    translator: QueryTranslator,
    executor: QueryExecutor,
    generator: Arc<dyn Generator>,
    tokenizer: Arc<dyn TokenCounter>,
    config: RagConfig,
}

impl RagService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn GraphStore>,
        generator: Arc<dyn Generator>,
        config: RagConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            translator: QueryTranslator::new(generator.clone()),
            executor: QueryExecutor::new(store),
            generator,
            tokenizer: Arc::new(ApproxCharTokenizer),
            config,
        }
    }

    /// Replace the token counter used for context budgeting.
    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn TokenCounter>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Answer `question` through both channels.
    ///
    /// Returns `Err` only for [`RagError::EmbeddingUnavailable`] and
    /// [`RagError::IndexUnavailable`]; the query channel's in-flight work is dropped with it.
    #[instrument(skip(self, question), fields(question_len = question.len(), top_k = self.config.retrieval.top_k))]
    pub async fn answer(&self, question: &str) -> Result<HybridReport, RagError> {
        let outcome = tokio::try_join!(self.vector_channel(question), self.query_channel(question));
        let (vector, query) = match outcome {
            Ok(reports) => reports,
            Err(e) => {
                tracing::error!(error = %e, "request aborted");
                return Err(e);
            }
        };
        tracing::info!(stage = ?RequestStage::Done, "request finished");
        Ok(HybridReport {
            question: question.to_string(),
            vector,
            query,
            stage: RequestStage::Done,
        })
    }

    async fn vector_channel(&self, question: &str) -> Result<VectorReport, RagError> {
        let timeouts = &self.config.timeouts;
        let retrieval = &self.config.retrieval;
        let mut stage = VectorStage::Start;

        let embedding = within(
            timeouts.embed(),
            "embedding",
            async {
                self.embedder
                    .embed(question)
                    .await
                    .map_err(|e| RagError::EmbeddingUnavailable(e.to_string()))
            },
            RagError::EmbeddingUnavailable,
        )
        .await?;
        advance(Modality::Vector, &mut stage, VectorStage::Embedded);

        let candidates = within(
            timeouts.search(),
            "vector search",
            async {
                self.index
                    .search(&embedding, retrieval.top_k)
                    .await
                    .map_err(|e| match e {
                        DbError::IndexUnavailable(msg) => RagError::IndexUnavailable(msg),
                        other => RagError::IndexUnavailable(other.to_string()),
                    })
            },
            RagError::IndexUnavailable,
        )
        .await?;
        tracing::debug!(candidates = candidates.len(), "retrieved candidates");
        advance(Modality::Vector, &mut stage, VectorStage::Retrieved);

        let ranked = rank(candidates);
        advance(Modality::Vector, &mut stage, VectorStage::Ranked);

        let top_matches = top_n(&ranked, retrieval.log_top).to_vec();
        for (i, m) in top_matches.iter().enumerate() {
            tracing::info!(rank = i + 1, name = %m.name, score = m.score, "top match");
        }

        let context_records = top_n(&ranked, retrieval.context_n).to_vec();
        let context =
            assemble_vector_context(&context_records, &retrieval.budget, self.tokenizer.as_ref());
        let answer = self
            .generate_answer(Modality::Vector, vector_answer_prompt(question, &context))
            .await;
        advance(Modality::Vector, &mut stage, VectorStage::VectorAnswered);

        Ok(VectorReport {
            stage,
            top_matches,
            context_records,
            context,
            answer,
        })
    }

    /// Never fails; every failure here degrades to an empty context.
    async fn query_channel(&self, question: &str) -> Result<QueryReport, RagError> {
        let timeouts = &self.config.timeouts;
        let mut stage = QueryStage::Start;
        let mut failure = None;
        let mut outcome = None;

        let generated = match self.translator.translate(question, timeouts.translate()).await {
            Ok(query) => {
                advance(Modality::Query, &mut stage, QueryStage::Translated);
                Some(query)
            }
            Err(e) => {
                tracing::warn!(error = %e, "query channel continues without a query");
                failure = Some(e);
                None
            }
        };

        if let Some(query) = &generated {
            match within(
                timeouts.execute(),
                "query execution",
                self.executor.execute(query),
                RagError::QueryExecution,
            )
            .await
            {
                Ok(result) => {
                    if let QueryOutcome::NoQuery(NoQueryReason::Unsafe { keyword }) = &result {
                        failure = Some(RagError::UnsafeQuery {
                            keyword: keyword.clone(),
                            query: query.to_string(),
                        });
                    }
                    advance(Modality::Query, &mut stage, QueryStage::Executed);
                    outcome = Some(result);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "query channel continues without rows");
                    failure = Some(e);
                }
            }
        }

        let rows = outcome
            .as_ref()
            .and_then(QueryOutcome::rows)
            .map(|r| r.rows.as_slice())
            .unwrap_or_default();
        let context = assemble_query_context(
            rows,
            &self.config.retrieval.budget,
            self.tokenizer.as_ref(),
        );
        let answer = self
            .generate_answer(Modality::Query, query_answer_prompt(question, &context))
            .await;
        advance(Modality::Query, &mut stage, QueryStage::QueryAnswered);

        Ok(QueryReport {
            stage,
            generated,
            outcome,
            failure,
            context,
            answer,
        })
    }

    async fn generate_answer(&self, channel: Modality, prompt: String) -> Result<String, RagError> {
        let failure = move |message: String| RagError::GenerationFailure { channel, message };
        let answer = self
            .generator
            .generate_within(&prompt, self.config.timeouts.generate())
            .await
            .map_err(|e| failure(e.to_string()));
        if let Err(e) = &answer {
            tracing::warn!(%channel, error = %e, "answer generation failed");
        }
        answer
    }
}

fn advance<S: Copy + fmt::Debug>(channel: Modality, current: &mut S, next: S) {
    tracing::debug!(%channel, from = ?*current, to = ?next, "stage transition");
    *current = next;
}

/// Run `fut` for at most `limit`. Expiry drops the future and reports `timed_out`.
async fn within<T, F>(
    limit: Duration,
    what: &str,
    fut: F,
    timed_out: impl FnOnce(String) -> RagError,
) -> Result<T, RagError>
where
    F: Future<Output = Result<T, RagError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(timed_out(format!(
            "{what} timed out after {}s",
            limit.as_secs()
        ))),
    }
}
