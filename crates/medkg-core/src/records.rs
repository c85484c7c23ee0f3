use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Dense vector for one question, produced by the embedder.
///
/// The values are shared behind an `Arc` so the vector channel can hand the embedding to a
/// blocking store call without copying it; there is no way to mutate it once built.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionEmbedding(Arc<[f32]>);

impl QuestionEmbedding {
    pub fn new(values: Vec<f32>) -> Result<Self, CoreError> {
        if values.is_empty() {
            return Err(CoreError::EmptyEmbedding);
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(CoreError::NonFiniteEmbedding(pos));
        }
        Ok(Self(values.into()))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dims(&self) -> usize {
        self.0.len()
    }
}

/// One graph node returned by the vector index, with its similarity score.
///
/// Attribute names follow the vector projection in [`crate::schema::CANDIDATE_FIELDS`].
/// Optional attributes are absent when the node does not carry them (a drug has no
/// `mayo_symptoms`, a disease has no `half_life`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pharmacodynamics: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub half_life: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indication: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanism_of_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_binding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mayo_causes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mayo_complications: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mayo_risk_factors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mayo_symptoms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mondo_definition: Option<String>,
    pub score: f32,
}

impl CandidateRecord {
    /// A record carrying only a name and a score.
    pub fn named(name: impl Into<String>, score: f32) -> Self {
        Self {
            name: name.into(),
            category: None,
            pharmacodynamics: None,
            group: None,
            half_life: None,
            indication: None,
            mechanism_of_action: None,
            protein_binding: None,
            state: None,
            node_index: None,
            node_type: None,
            node_source: None,
            mayo_causes: None,
            mayo_complications: None,
            mayo_risk_factors: None,
            mayo_symptoms: None,
            mondo_definition: None,
            score,
        }
    }
}
