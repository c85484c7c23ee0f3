#![allow(missing_docs)]
//! Context assembly: turning a channel's retrieved data into prompt text.
//!
//! Each record or row becomes one JSON part. Parts are trimmed to a per-part token limit and
//! included in order until the total budget runs out, so the best-ranked parts always make it
//! into the prompt. Token counts come from a [`TokenCounter`]; [`ApproxCharTokenizer`] is the
//! deterministic default.
use medkg_core::{
    rag_types::{AssembledContext, ContextPart, ContextStats, Modality},
    CandidateRecord, QueryResultRow,
};
use serde::Deserialize;
use tracing::instrument;

/// Token budget parameters for context assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContextBudget {
    /// Maximum total tokens across all included parts.
    pub max_total: usize,
    /// Maximum tokens allowed per part; parts exceeding this will be trimmed.
    pub per_part_max: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            max_total: 4096,
            per_part_max: 1024,
        }
    }
}

/// Trait for counting tokens. Implementations can be provided by consumers.
pub trait TokenCounter: Send + Sync + std::fmt::Debug {
    fn count(&self, text: &str) -> usize;
}

/// A simple, deterministic tokenizer: approximates tokens as ceil(chars / 4).
#[derive(Default, Debug)]
pub struct ApproxCharTokenizer;

impl TokenCounter for ApproxCharTokenizer {
    fn count(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}

fn trim_text_to_tokens(
    text: &str,
    max_tokens: usize,
    tokenizer: &dyn TokenCounter,
) -> (String, bool) {
    if max_tokens == 0 {
        return (String::new(), true);
    }
    if tokenizer.count(text) <= max_tokens {
        return (text.to_string(), false);
    }

    // Rough cut at ~4 chars/token, then shave until the tokenizer agrees.
    let mut candidate: String = text.chars().take(max_tokens.saturating_mul(4)).collect();
    while !candidate.is_empty() && tokenizer.count(&candidate) > max_tokens {
        candidate.pop();
    }
    (candidate, true)
}

fn pack(
    modality: Modality,
    parts: impl IntoIterator<Item = (String, Option<f32>)>,
    budget: &ContextBudget,
    tokenizer: &dyn TokenCounter,
) -> AssembledContext {
    let mut out = AssembledContext::empty(modality);
    let mut stats = ContextStats::default();
    for (text, score) in parts {
        let remaining = budget.max_total.saturating_sub(stats.total_tokens);
        let limit = budget.per_part_max.min(remaining);
        if limit == 0 {
            stats.dropped += 1;
            continue;
        }
        let (text, truncated) = trim_text_to_tokens(&text, limit, tokenizer);
        if text.is_empty() {
            stats.dropped += 1;
            continue;
        }
        if truncated {
            stats.truncated_parts += 1;
        }
        stats.total_tokens += tokenizer.count(&text);
        stats.parts += 1;
        out.parts.push(ContextPart { text, score });
    }
    out.stats = stats;
    out
}

/// Context for the vector channel: one JSON object per record, score included.
#[instrument(skip_all, fields(records = records.len()))]
pub fn assemble_vector_context(
    records: &[CandidateRecord],
    budget: &ContextBudget,
    tokenizer: &dyn TokenCounter,
) -> AssembledContext {
    let parts = records.iter().map(|r| {
        // A plain struct of strings and numbers always serialises.
        let text = serde_json::to_string(r).unwrap_or_default();
        (text, Some(r.score))
    });
    let ctx = pack(Modality::Vector, parts, budget, tokenizer);
    tracing::debug!(stats = ?ctx.stats, "assembled vector context");
    ctx
}

/// Context for the query channel: one JSON object per row, keys in header order.
#[instrument(skip_all, fields(rows = rows.len()))]
pub fn assemble_query_context(
    rows: &[QueryResultRow],
    budget: &ContextBudget,
    tokenizer: &dyn TokenCounter,
) -> AssembledContext {
    let parts = rows
        .iter()
        .map(|row| (serde_json::Value::Object(row.clone()).to_string(), None));
    let ctx = pack(Modality::Query, parts, budget, tokenizer);
    tracing::debug!(stats = ?ctx.stats, "assembled query context");
    ctx
}

/// Answer prompt for the vector channel.
pub fn vector_answer_prompt(question: &str, context: &AssembledContext) -> String {
    format!(
        "TASK: You are an AI assistant. Respond in paragraph using only the context provided, \
         giving more relevance to the one with the higher score.\n\
         QUESTION: {question}\n\
         CONTEXT: {}",
        context.render()
    )
}

/// Answer prompt for the query channel.
pub fn query_answer_prompt(question: &str, context: &AssembledContext) -> String {
    format!(
        "TASK: You are an AI assistant. Respond in paragraph using only the context provided, \
         ignoring the 'embedding'.\n\
         QUESTION: {question}\n\
         CONTEXT: {}",
        context.render()
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn approx_tokenizer_counts_quarters() {
        let tk = ApproxCharTokenizer;
        assert_eq!(tk.count(""), 0);
        assert_eq!(tk.count("abcd"), 1);
        assert_eq!(tk.count("abcde"), 2);
    }

    #[test]
    fn trim_respects_budget() {
        let tk = ApproxCharTokenizer;
        let (t, truncated) = trim_text_to_tokens("abcdefghij", 2, &tk);
        assert!(truncated);
        assert_eq!(t, "abcdefgh");
        let (t, truncated) = trim_text_to_tokens("abc", 2, &tk);
        assert!(!truncated);
        assert_eq!(t, "abc");
    }

    #[test]
    fn vector_parts_keep_rank_order_and_scores() {
        let mut copper = CandidateRecord::named("Copper", 0.9);
        copper.node_type = Some("drug".into());
        let zinc = CandidateRecord::named("Zinc", 0.7);
        let ctx = assemble_vector_context(
            &[copper, zinc],
            &ContextBudget::default(),
            &ApproxCharTokenizer,
        );
        assert_eq!(ctx.modality, Modality::Vector);
        assert_eq!(ctx.stats.parts, 2);
        assert_eq!(ctx.parts[0].score, Some(0.9));
        assert!(ctx.parts[0].text.contains("\"name\":\"Copper\""));
        assert!(ctx.parts[0].text.contains("\"node_type\":\"drug\""));
        // absent attributes are omitted rather than rendered as null
        assert!(!ctx.parts[0].text.contains("half_life"));
        assert!(ctx.render().starts_with("[{"));
    }

    #[test]
    fn budget_drops_trailing_parts() {
        let rows: Vec<QueryResultRow> = (0..4)
            .map(|i| {
                let mut row = serde_json::Map::new();
                row.insert("name".into(), json!(format!("node-{i}-padding-padding")));
                row
            })
            .collect();
        let budget = ContextBudget {
            max_total: 20,
            per_part_max: 9,
        };
        let ctx = assemble_query_context(&rows, &budget, &ApproxCharTokenizer);
        assert!(ctx.stats.total_tokens <= 20);
        assert!(ctx.stats.dropped >= 1);
        assert_eq!(ctx.stats.parts + ctx.stats.dropped, 4);
        assert!(ctx.parts[0].text.starts_with("{\"name\":\"node-0"));
    }

    #[test]
    fn prompts_follow_task_question_context_layout() {
        let ctx = AssembledContext::empty(Modality::Query);
        let p = query_answer_prompt("Tell me about Copper", &ctx);
        assert!(p.starts_with("TASK: You are an AI assistant."));
        assert!(p.contains("\nQUESTION: Tell me about Copper\n"));
        assert!(p.ends_with("CONTEXT: []"));

        let v = vector_answer_prompt("q", &AssembledContext::empty(Modality::Vector));
        assert!(v.contains("giving more relevance to the one with the higher score"));
    }
}
