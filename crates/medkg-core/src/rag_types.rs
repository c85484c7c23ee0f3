use serde::{Deserialize, Serialize};

/// Which retrieval channel a context came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Vector,
    Query,
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Modality::Vector => f.write_str("vector"),
            Modality::Query => f.write_str("query"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextPart {
    /// JSON rendering of one record or row.
    pub text: String,
    /// Similarity score, only present for vector-channel parts.
    pub score: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextStats {
    pub total_tokens: usize,
    pub parts: usize,
    pub truncated_parts: usize,
    /// Parts left out because the total budget was exhausted.
    pub dropped: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledContext {
    pub modality: Modality,
    pub parts: Vec<ContextPart>,
    pub stats: ContextStats,
}

impl AssembledContext {
    pub fn empty(modality: Modality) -> Self {
        Self {
            modality,
            parts: Vec::new(),
            stats: ContextStats::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Render as a JSON array literal for inclusion in a prompt.
    pub fn render(&self) -> String {
        let body = self
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!("[{body}]")
    }
}
