//! Graph schema shared by the store and the query translator.
//!
//! The store creates its relations from these tables and the translator renders the same
//! tables into its prompt, so the model is only ever told about properties that exist.

/// Relation holding the graph nodes.
pub const NODE_RELATION: &str = "node";
/// Relation holding the (single) relationship type between nodes.
pub const EDGE_RELATION: &str = "relation";
/// Name of the HNSW index over node embeddings.
pub const VECTOR_INDEX: &str = "fullindex";
/// Node field holding the embedding vector.
pub const EMBEDDING_FIELD: &str = "embedding";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropType {
    Int,
    String,
}

impl PropType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropType::Int => "Int",
            PropType::String => "String",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Property {
    pub name: &'static str,
    pub ty: PropType,
}

const fn int(name: &'static str) -> Property {
    Property {
        name,
        ty: PropType::Int,
    }
}

const fn string(name: &'static str) -> Property {
    Property {
        name,
        ty: PropType::String,
    }
}

/// Key of the node relation.
pub const NODE_KEY: Property = int("node_index");

/// Node properties the query translator may use, in prompt order (excluding the key).
pub const NODE_PROPERTIES: &[Property] = &[
    int("node_id"),
    string("node_name"),
    string("node_source"),
    string("node_type"),
    string("atc_1"),
    string("atc_2"),
    string("atc_3"),
    string("atc_4"),
    string("category"),
    string("description"),
    string("group"),
    string("indication"),
    string("mechanism_of_action"),
    string("pharmacodynamics"),
    string("state"),
    string("mondo_definition"),
    string("orphanet_definition"),
    string("umls_description"),
    string("mayo_complications"),
    string("mayo_prevention"),
    string("mayo_risk_factors"),
    string("mayo_symptoms"),
];

/// Node properties stored for the vector projection but not offered to the translator.
pub const STORE_ONLY_PROPERTIES: &[Property] = &[
    string("half_life"),
    string("protein_binding"),
    string("mayo_causes"),
];

/// Relationship key columns: source and destination `node_index`, plus the relation kind.
pub const EDGE_KEYS: &[Property] = &[int("src"), int("dst"), string("relation")];

/// Relationship value columns.
pub const EDGE_PROPERTIES: &[Property] = &[string("display_relation")];

/// Columns of the vector projection, in [`crate::CandidateRecord`] order (score excluded).
///
/// `name` is bound from `node_name`; every other column shares its node property name.
pub const CANDIDATE_FIELDS: &[&str] = &[
    "name",
    "category",
    "pharmacodynamics",
    "group",
    "half_life",
    "indication",
    "mechanism_of_action",
    "protein_binding",
    "state",
    "node_index",
    "node_type",
    "node_source",
    "mayo_causes",
    "mayo_complications",
    "mayo_risk_factors",
    "mayo_symptoms",
    "mondo_definition",
];

/// Render the schema block shown to the query translator.
pub fn describe_for_prompt() -> String {
    let node_props = NODE_PROPERTIES
        .iter()
        .map(|p| format!("{}: {}", p.name, p.ty.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let edge_keys = EDGE_KEYS
        .iter()
        .map(|p| format!("{}: {}", p.name, p.ty.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let edge_props = EDGE_PROPERTIES
        .iter()
        .map(|p| format!("{}: {}", p.name, p.ty.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Node relation:\n    {NODE_RELATION} {{{key}: {key_ty} => {node_props}}}\n\n\
         Relationship relation:\n    {EDGE_RELATION} {{{edge_keys} => {edge_props}}}\n    \
         `src` and `dst` hold the `{key}` of the connected nodes; edges are directed from `src` to `dst`.",
        key = NODE_KEY.name,
        key_ty = NODE_KEY.ty.as_str(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_schema_lists_every_declared_property() {
        let block = describe_for_prompt();
        for p in NODE_PROPERTIES.iter().chain(EDGE_PROPERTIES) {
            assert!(block.contains(&format!("{}: {}", p.name, p.ty.as_str())), "{}", p.name);
        }
        assert!(block.contains("node_index: Int"));
        assert!(block.contains("src: Int, dst: Int, relation: String"));
        for p in STORE_ONLY_PROPERTIES {
            assert!(!block.contains(p.name), "{} leaked into prompt schema", p.name);
        }
    }

    #[test]
    fn projection_columns_exist_on_node() {
        for field in CANDIDATE_FIELDS.iter().filter(|f| **f != "name") {
            let known = *field == NODE_KEY.name
                || NODE_PROPERTIES.iter().any(|p| p.name == *field)
                || STORE_ONLY_PROPERTIES.iter().any(|p| p.name == *field);
            assert!(known, "{field} is not a node property");
        }
    }
}
