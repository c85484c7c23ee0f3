use serde::{Deserialize, Serialize};

/// A structured query produced by the generative model, or nothing usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneratedQuery {
    Query(String),
    Empty,
}

impl GeneratedQuery {
    /// Normalize raw model output into a query.
    ///
    /// Surrounding whitespace and one leading markdown code fence (with or without a language
    /// tag) are stripped, along with any text after its closing fence. An unterminated fence
    /// keeps everything after the opening line. Blank output, or a bare fence, becomes
    /// [`GeneratedQuery::Empty`]. The body of the query is otherwise kept byte for byte.
    pub fn from_model_output(raw: &str) -> Self {
        let trimmed = raw.trim();
        let body = strip_code_fence(trimmed).unwrap_or(trimmed).trim();
        if body.is_empty() {
            GeneratedQuery::Empty
        } else {
            GeneratedQuery::Query(body.to_string())
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            GeneratedQuery::Query(q) => Some(q.as_str()),
            GeneratedQuery::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, GeneratedQuery::Empty)
    }
}

impl std::fmt::Display for GeneratedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratedQuery::Query(q) => f.write_str(q),
            GeneratedQuery::Empty => f.write_str("<empty>"),
        }
    }
}

fn strip_code_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("```")?;
    // Anything after the closing fence is commentary, not query text.
    let fenced = rest.find("```").map_or(rest, |close| &rest[..close]);
    // Drop the info string (e.g. "cozo") on the opening fence line.
    match fenced.find('\n') {
        Some(newline) => Some(&fenced[newline + 1..]),
        None => Some(fenced),
    }
}

/// One row of a query result: requested field name to value, in request order.
pub type QueryResultRow = serde_json::Map<String, serde_json::Value>;

/// Rows returned by the graph store for a generated query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub headers: Vec<String>,
    pub rows: Vec<QueryResultRow>,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
