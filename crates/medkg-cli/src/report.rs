//! Plain-text rendering of a [`HybridReport`].
use std::fmt::Write;

use medkg_rag::{HybridReport, NoQueryReason, QueryOutcome, RagError};

fn answer_text(answer: &Result<String, RagError>) -> String {
    match answer {
        Ok(text) => text.trim().to_string(),
        Err(e) => format!("[no answer] {e}"),
    }
}

pub fn render(report: &HybridReport) -> String {
    let mut out = String::new();
    let query = &report.query;
    let vector = &report.vector;

    // Writing to a String cannot fail.
    let _ = writeln!(out, "Question: {}", report.question);

    let _ = writeln!(out, "\nGenerated query:");
    match &query.generated {
        Some(q) => {
            let _ = writeln!(out, "{q}");
        }
        None => {
            let _ = writeln!(out, "<none>");
        }
    }

    let _ = writeln!(out, "\nQuery results:");
    match &query.outcome {
        Some(QueryOutcome::Rows(rows)) if rows.is_empty() => {
            let _ = writeln!(out, "<no rows>");
        }
        Some(QueryOutcome::Rows(rows)) => {
            for row in &rows.rows {
                let _ = writeln!(out, "{}", serde_json::Value::Object(row.clone()));
            }
        }
        Some(QueryOutcome::NoQuery(NoQueryReason::Empty)) => {
            let _ = writeln!(out, "<model produced no query>");
        }
        Some(QueryOutcome::NoQuery(NoQueryReason::Unsafe { keyword })) => {
            let _ = writeln!(out, "<query refused: contains `{keyword}`>");
        }
        None => {
            let _ = writeln!(out, "<not run>");
        }
    }
    if let Some(failure) = &query.failure {
        let _ = writeln!(out, "({failure})");
    }

    let _ = writeln!(out, "\nTop vector matches:");
    if vector.top_matches.is_empty() {
        let _ = writeln!(out, "<none>");
    }
    for (i, m) in vector.top_matches.iter().enumerate() {
        let _ = writeln!(out, "{:>2}. {} (score {:.4})", i + 1, m.name, m.score);
    }

    let _ = writeln!(out, "\nQuery channel answer:\n{}", answer_text(&query.answer));
    let _ = writeln!(out, "\nVector channel answer:\n{}", answer_text(&vector.answer));
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use medkg_core::QueryResult;
    use medkg_llm::LlmError;
    use medkg_rag::{translate::QUESTION_MARKER, RagConfig, RagService};
    use medkg_test_utils::{
        fakes::{CountingStore, FakeEmbedder, ScriptedGenerator, StaticIndex},
        fixture::axis,
    };
    use serde_json::json;

    use super::*;

    async fn sample(generator: ScriptedGenerator) -> HybridReport {
        let mut row = serde_json::Map::new();
        row.insert("name".into(), json!("Copper"));
        row.insert("category".into(), json!("Metal"));
        let rows = QueryResult {
            headers: vec!["name".into(), "category".into()],
            rows: vec![row],
        };
        RagService::new(
            Arc::new(FakeEmbedder::fixed(axis(0))),
            Arc::new(StaticIndex::with_scores(&[0.25, 0.75])),
            Arc::new(CountingStore::new(rows)),
            Arc::new(generator),
            RagConfig::default(),
        )
        .answer("Tell me about Copper")
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn shows_query_rows_matches_and_both_answers() {
        let generator = ScriptedGenerator::new("Copper is a metal.\n")
            .reply_when(QUESTION_MARKER, "?[name, category] := *node{node_name: name, category}");
        let text = render(&sample(generator).await);

        assert!(text.contains("?[name, category] := *node{node_name: name, category}"));
        assert!(text.contains(r#"{"name":"Copper","category":"Metal"}"#));
        assert!(text.contains(" 1. c1 (score 0.7500)\n 2. c0 (score 0.2500)"));
        assert!(text.contains("Query channel answer:\nCopper is a metal.\n"));
        assert!(text.contains("Vector channel answer:\nCopper is a metal.\n"));
    }

    #[tokio::test]
    async fn failures_are_spelled_out() {
        let generator = ScriptedGenerator::new("fine").fail_when(
            QUESTION_MARKER,
            LlmError::Invocation {
                status: Some(1),
                stderr: "model not found".into(),
            },
        );
        let text = render(&sample(generator).await);
        assert!(text.contains("Generated query:\n<none>"));
        assert!(text.contains("<not run>"));
        assert!(text.contains("model not found"));
    }
}
