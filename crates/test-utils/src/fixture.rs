//! A six-node biomedical graph with hand-picked 4-dimensional embeddings.
//!
//! Embeddings are chosen so that nearest neighbours are obvious: each node sits on or next to
//! one axis, and [`axis`] gives the query vector that lands on it.

use std::{collections::BTreeMap, sync::Arc};

use cozo::DataValue;
use lazy_static::lazy_static;
use medkg_core::schema::{EMBEDDING_FIELD, NODE_KEY, NODE_PROPERTIES, STORE_ONLY_PROPERTIES};
use medkg_db::{schema, Database, DbError};

pub const FIXTURE_DIMS: usize = 4;

pub struct FixtureNode {
    pub node_index: i64,
    pub name: &'static str,
    pub props: &'static [(&'static str, &'static str)],
    pub embedding: [f32; FIXTURE_DIMS],
}

pub struct FixtureEdge {
    pub src: i64,
    pub dst: i64,
    pub relation: &'static str,
    pub display_relation: &'static str,
}

pub const NODES: &[FixtureNode] = &[
    FixtureNode {
        node_index: 0,
        name: "Copper",
        props: &[
            ("node_type", "drug"),
            ("node_source", "DrugBank"),
            ("category", "Metal"),
            ("group", "approved"),
            ("state", "solid"),
            ("indication", "For use in the supplementation of total parenteral nutrition."),
        ],
        embedding: [1.0, 0.0, 0.0, 0.0],
    },
    FixtureNode {
        node_index: 1,
        name: "Zinc",
        props: &[
            ("node_type", "drug"),
            ("node_source", "DrugBank"),
            ("category", "Metal"),
            ("half_life", "3 hours"),
        ],
        embedding: [0.9, 0.1, 0.0, 0.0],
    },
    FixtureNode {
        node_index: 2,
        name: "cancer",
        props: &[
            ("node_type", "disease"),
            ("node_source", "MONDO"),
            ("mondo_definition", "A tumor composed of atypical neoplastic cells."),
            ("mayo_symptoms", "Fatigue, lump, weight changes."),
            ("mayo_causes", "Mutations in the DNA within cells."),
            ("mayo_risk_factors", "Age, habits, family history."),
        ],
        embedding: [0.0, 1.0, 0.0, 0.0],
    },
    FixtureNode {
        node_index: 3,
        name: "lung cancer",
        props: &[
            ("node_type", "disease"),
            ("node_source", "MONDO"),
            ("mayo_symptoms", "A new cough that doesn't go away."),
        ],
        embedding: [0.0, 0.9, 0.1, 0.0],
    },
    FixtureNode {
        node_index: 4,
        name: "acne",
        props: &[
            ("node_type", "disease"),
            ("node_source", "MONDO"),
            ("mayo_complications", "Scars, skin changes."),
        ],
        embedding: [0.0, 0.0, 1.0, 0.0],
    },
    FixtureNode {
        node_index: 5,
        name: "Isotretinoin",
        props: &[
            ("node_type", "drug"),
            ("node_source", "DrugBank"),
            ("indication", "Treatment of severe recalcitrant nodular acne."),
            ("mechanism_of_action", "Inhibits sebaceous gland function."),
        ],
        embedding: [0.0, 0.0, 0.2, 1.0],
    },
];

pub const EDGES: &[FixtureEdge] = &[
    FixtureEdge {
        src: 5,
        dst: 4,
        relation: "indication",
        display_relation: "indication",
    },
    FixtureEdge {
        src: 2,
        dst: 3,
        relation: "disease_disease",
        display_relation: "parent-child",
    },
    FixtureEdge {
        src: 0,
        dst: 3,
        relation: "contraindication",
        display_relation: "contraindication",
    },
];

/// Unit vector along axis `i`.
pub fn axis(i: usize) -> Vec<f32> {
    let mut v = vec![0.0; FIXTURE_DIMS];
    v[i % FIXTURE_DIMS] = 1.0;
    v
}

fn node_params(node: &FixtureNode) -> BTreeMap<String, DataValue> {
    let mut params: BTreeMap<String, DataValue> = NODE_PROPERTIES
        .iter()
        .chain(STORE_ONLY_PROPERTIES)
        .map(|p| (p.name.to_string(), DataValue::Null))
        .collect();
    params.insert(NODE_KEY.name.to_string(), DataValue::from(node.node_index));
    params.insert("node_id".to_string(), DataValue::from(node.node_index + 1000));
    params.insert("node_name".to_string(), DataValue::from(node.name));
    for (k, v) in node.props {
        params.insert(k.to_string(), DataValue::from(*v));
    }
    params.insert(
        EMBEDDING_FIELD.to_string(),
        DataValue::List(
            node.embedding
                .iter()
                .map(|f| DataValue::from(*f as f64))
                .collect(),
        ),
    );
    params
}

fn edge_params(edge: &FixtureEdge) -> BTreeMap<String, DataValue> {
    BTreeMap::from([
        ("src".to_string(), DataValue::from(edge.src)),
        ("dst".to_string(), DataValue::from(edge.dst)),
        ("relation".to_string(), DataValue::from(edge.relation)),
        (
            "display_relation".to_string(),
            DataValue::from(edge.display_relation),
        ),
    ])
}

/// Fresh in-memory store holding the fixture graph and its vector index.
pub fn fixture_db() -> Result<Database, DbError> {
    let db = Database::init_mem()?;
    db.init_schema(FIXTURE_DIMS)?;
    let put_node = schema::put_node_script();
    for node in NODES {
        db.raw_query_mut(&put_node, node_params(node))?;
    }
    let put_edge = schema::put_edge_script();
    for edge in EDGES {
        db.raw_query_mut(&put_edge, edge_params(edge))?;
    }
    tracing::debug!(nodes = NODES.len(), edges = EDGES.len(), "seeded fixture graph");
    Ok(db)
}

lazy_static! {
    /// Shared read-only fixture store. Tests that write must build their own with
    /// [`fixture_db`].
    pub static ref TEST_DB: Result<Arc<Database>, DbError> = fixture_db().map(Arc::new);
}
