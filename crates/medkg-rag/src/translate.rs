//! Natural language to CozoScript translation.
//!
//! The model is shown the graph schema, a handful of rules and worked examples, then the
//! question. Whatever comes back is normalised into a [`GeneratedQuery`]; it is not trusted
//! and goes through the read-only guard before execution.

use std::{sync::Arc, time::Duration};

use medkg_core::{schema, GeneratedQuery};
use medkg_llm::Generator;
use tracing::instrument;

use crate::error::RagError;

/// Marks the end of the translation prompt. The question follows it verbatim.
pub const QUESTION_MARKER: &str = "The question is:";

const INSTRUCTIONS: &str = "\
Task: Generate a CozoScript query to retrieve data from a graph database.
Instructions:
Use only the provided relations and properties in the schema. Do not use any other relations or properties that are not provided.
Database Schema:";

const RULES: &str = "\
Note: Do not include any explanations or apologies in your responses.
Do not respond to any questions that might ask anything else than for you to construct a CozoScript query.
Do not include any text except the generated CozoScript query.
In the query head, don't return the entire node, but only its attributes.
The query must only read data. Never write, update or remove anything.";

const EXAMPLES: &str = r#"Examples: Here are a few examples of generated CozoScript queries for particular questions:
# What's associated with "malaria" AND "duodenal ulcer"
?[name, category, pharmacodynamics, group, indication, mechanism_of_action, state, node_index, mayo_complications, mayo_risk_factors, mayo_symptoms, mondo_definition] :=
    *node{node_index: a, node_name: a_name},
    str_includes(a_name, "malaria"),
    *relation{src: a, dst: node_index},
    *node{node_index, node_name: name, category, pharmacodynamics, group, indication, mechanism_of_action, state, mayo_complications, mayo_risk_factors, mayo_symptoms, mondo_definition},
    *relation{src: node_index, dst: c},
    *node{node_index: c, node_name: c_name},
    str_includes(c_name, "duodenal ulcer")
:limit 3

# Out of the given list, which Gene is associated with Takayasu arteritis and cancer. Given list is: SHTN1, HLA-B, SLC14A2, BTBD9, DTNB
?[name, node_type] :=
    *node{node_index: r, node_name: r_name},
    str_includes(r_name, "cancer"),
    *relation{src: r, dst: n},
    *node{node_index: n, node_name: name, node_type},
    name in ["SHTN1", "HLA-B", "SLC14A2", "BTBD9", "DTNB"],
    *relation{src: n, dst: m},
    *node{node_index: m, node_name: m_name},
    str_includes(m_name, "Takayasu arteritis")
:limit 3

# What are the causes of cancer?
?[name, category, pharmacodynamics, group, indication, mechanism_of_action, state, node_index, mayo_complications, mayo_risk_factors, mayo_symptoms, mondo_definition] :=
    *node{node_index, node_name: name, category, pharmacodynamics, group, indication, mechanism_of_action, state, mayo_complications, mayo_risk_factors, mayo_symptoms, mondo_definition},
    str_includes(name, "cancer")
:limit 3

# What are the symptoms of cancer?
?[name, category, pharmacodynamics, group, indication, mechanism_of_action, state, node_index, mayo_complications, mayo_risk_factors, mayo_symptoms, mondo_definition] :=
    *node{node_index, node_name: name, category, pharmacodynamics, group, indication, mechanism_of_action, state, mayo_complications, mayo_risk_factors, mayo_symptoms, mondo_definition},
    str_includes(name, "cancer")
:limit 3

# Tell me about Copper
?[name, category, pharmacodynamics, group, indication, mechanism_of_action, state, node_index, mayo_complications, mayo_risk_factors, mayo_symptoms, mondo_definition] :=
    *node{node_index, node_name: name, category, pharmacodynamics, group, indication, mechanism_of_action, state, mayo_complications, mayo_risk_factors, mayo_symptoms, mondo_definition},
    str_includes(name, "Copper")
:limit 3"#;

/// Full translation prompt for `question`.
pub fn translation_prompt(question: &str) -> String {
    format!(
        "{INSTRUCTIONS}\n{schema}\n\n{RULES}\n\n{EXAMPLES}\n\n{QUESTION_MARKER}{question}",
        schema = schema::describe_for_prompt(),
    )
}

#[derive(Debug, Clone)]
pub struct QueryTranslator {
    generator: Arc<dyn Generator>,
}

impl QueryTranslator {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Ask the model for a query answering `question`, giving it `limit` to respond. Blank
    /// output is `GeneratedQuery::Empty`.
    #[instrument(skip_all, fields(question_len = question.len(), limit_secs = limit.as_secs()))]
    pub async fn translate(
        &self,
        question: &str,
        limit: Duration,
    ) -> Result<GeneratedQuery, RagError> {
        let raw = self
            .generator
            .generate_within(&translation_prompt(question), limit)
            .await
            .map_err(|e| RagError::TranslationFailure(e.to_string()))?;
        let query = GeneratedQuery::from_model_output(&raw);
        tracing::debug!(%query, "translated question");
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use medkg_test_utils::fakes::{model_not_found, ScriptedGenerator};

    use super::*;

    const LIMIT: Duration = Duration::from_secs(45);

    #[test]
    fn prompt_has_schema_rules_examples_then_question() {
        let question = "What drugs treat acne?";
        let prompt = translation_prompt(question);

        let schema_at = prompt.find("node {node_index: Int =>").unwrap();
        let rules_at = prompt.find("don't return the entire node").unwrap();
        let examples_at = prompt.find("# Tell me about Copper").unwrap();
        assert!(schema_at < rules_at && rules_at < examples_at);
        assert!(prompt.contains("relation {src: Int, dst: Int, relation: String => display_relation: String}"));
        assert!(prompt.ends_with(&format!("{QUESTION_MARKER}{question}")));
    }

    #[test]
    fn examples_only_use_declared_properties() {
        for p in schema::STORE_ONLY_PROPERTIES {
            assert!(!EXAMPLES.contains(p.name), "{} is not offered to the model", p.name);
        }
    }

    #[test]
    fn examples_pass_the_guard() {
        for block in EXAMPLES.split("\n\n") {
            assert!(medkg_db::guard::validate_read_only(block).is_ok(), "{block}");
        }
    }

    #[tokio::test]
    async fn fenced_output_is_unwrapped() {
        let generator = Arc::new(ScriptedGenerator::new(
            "```\n?[name] := *node{node_name: name}\n```",
        ));
        let translator = QueryTranslator::new(generator.clone());
        let q = translator.translate("list nodes", LIMIT).await.unwrap();
        assert_eq!(q.as_str(), Some("?[name] := *node{node_name: name}"));
        assert_eq!(generator.calls(), 1);
        assert!(generator.prompts()[0].ends_with("list nodes"));
    }

    #[tokio::test]
    async fn blank_output_is_empty() {
        let translator = QueryTranslator::new(Arc::new(ScriptedGenerator::new("  \n ")));
        assert!(translator.translate("anything", LIMIT).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn generator_failure_keeps_diagnostic() {
        let generator = ScriptedGenerator::new("unused").fail_when(QUESTION_MARKER, model_not_found());
        let translator = QueryTranslator::new(Arc::new(generator));
        match translator.translate("q", LIMIT).await.unwrap_err() {
            RagError::TranslationFailure(msg) => assert!(msg.contains("model not found"), "{msg}"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
