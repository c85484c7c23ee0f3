//! CozoScript definitions for the graph relations, derived from [`medkg_core::schema`].

use medkg_core::schema::{
    Property, EDGE_KEYS, EDGE_PROPERTIES, EDGE_RELATION, EMBEDDING_FIELD, NODE_KEY,
    NODE_PROPERTIES, NODE_RELATION, STORE_ONLY_PROPERTIES, VECTOR_INDEX,
};

fn column(p: &Property, nullable: bool) -> String {
    let ty = p.ty.as_str();
    if nullable {
        format!("{}: {ty}?", p.name)
    } else {
        format!("{}: {ty}", p.name)
    }
}

/// `:create node { node_index: Int => ..., embedding: <F32; dims>? }`
///
/// `node_name` is required; every other property may be null.
pub fn create_node_relation(dims: usize) -> String {
    let mut values: Vec<String> = NODE_PROPERTIES
        .iter()
        .chain(STORE_ONLY_PROPERTIES)
        .map(|p| column(p, p.name != "node_name"))
        .collect();
    values.push(format!("{EMBEDDING_FIELD}: <F32; {dims}>?"));
    format!(
        ":create {NODE_RELATION} {{ {} => {} }}",
        column(&NODE_KEY, false),
        values.join(", ")
    )
}

/// `:create relation { src: Int, dst: Int, relation: String => display_relation: String? }`
pub fn create_edge_relation() -> String {
    let keys = EDGE_KEYS
        .iter()
        .map(|p| column(p, false))
        .collect::<Vec<_>>()
        .join(", ");
    let values = EDGE_PROPERTIES
        .iter()
        .map(|p| column(p, true))
        .collect::<Vec<_>>()
        .join(", ");
    format!(":create {EDGE_RELATION} {{ {keys} => {values} }}")
}

/// Cosine HNSW index over the node embedding field.
pub fn create_vector_index(dims: usize) -> String {
    format!(
        "::hnsw create {NODE_RELATION}:{VECTOR_INDEX} {{ \
            dim: {dims}, m: 50, dtype: F32, fields: [{EMBEDDING_FIELD}], \
            distance: Cosine, ef_construction: 20 }}"
    )
}

/// Parameterised `:put` for a single node row. Parameters share the column names, plus
/// `$embedding` as a list of floats.
pub fn put_node_script() -> String {
    let mut cols: Vec<&str> = vec![NODE_KEY.name];
    cols.extend(NODE_PROPERTIES.iter().chain(STORE_ONLY_PROPERTIES).map(|p| p.name));
    cols.push(EMBEDDING_FIELD);
    let params = cols
        .iter()
        .map(|c| {
            if *c == EMBEDDING_FIELD {
                format!("vec(${c})")
            } else {
                format!("${c}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "?[{cols}] <- [[{params}]]\n:put {NODE_RELATION} {{ {key} => {vals} }}",
        cols = cols.join(", "),
        key = NODE_KEY.name,
        vals = cols[1..].join(", "),
    )
}

/// Parameterised `:put` for a single relationship row.
pub fn put_edge_script() -> String {
    let cols: Vec<&str> = EDGE_KEYS
        .iter()
        .chain(EDGE_PROPERTIES)
        .map(|p| p.name)
        .collect();
    let keys: Vec<&str> = EDGE_KEYS.iter().map(|p| p.name).collect();
    let vals: Vec<&str> = EDGE_PROPERTIES.iter().map(|p| p.name).collect();
    let params = cols
        .iter()
        .map(|c| format!("${c}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "?[{}] <- [[{params}]]\n:put {EDGE_RELATION} {{ {} => {} }}",
        cols.join(", "),
        keys.join(", "),
        vals.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_relation_marks_only_name_required() {
        let script = create_node_relation(384);
        assert!(script.starts_with(":create node { node_index: Int => "));
        assert!(script.contains("node_name: String,"));
        assert!(script.contains("node_id: Int?"));
        assert!(script.contains("mayo_causes: String?"));
        assert!(script.ends_with("embedding: <F32; 384>? }"));
    }

    #[test]
    fn edge_relation_keys_on_endpoints_and_kind() {
        assert_eq!(
            create_edge_relation(),
            ":create relation { src: Int, dst: Int, relation: String => display_relation: String? }"
        );
    }

    #[test]
    fn put_node_binds_every_column() {
        let script = put_node_script();
        assert!(script.contains("$node_index"));
        assert!(script.contains("$mondo_definition"));
        assert!(script.contains("vec($embedding)"));
        assert!(script.contains(":put node { node_index => node_id,"));
    }
}
