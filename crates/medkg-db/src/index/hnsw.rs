use std::collections::BTreeMap;

use cozo::{DataValue, NamedRows, Num, ScriptMutability};
use itertools::Itertools;
use medkg_core::{
    schema::{CANDIDATE_FIELDS, NODE_RELATION, VECTOR_INDEX},
    CandidateRecord,
};
use tracing::instrument;

use crate::{
    result::{get_pos, to_f32, to_opt_int, to_opt_string},
    Database, DbError,
};

fn arr_to_float(arr: &[f32]) -> DataValue {
    DataValue::List(
        arr.iter()
            .map(|f| if f.is_subnormal() { 0.0 } else { *f as f64 })
            .map(|f| DataValue::Num(Num::Float(f)))
            .collect_vec(),
    )
}

pub struct SimilarArgs<'a> {
    pub db: &'a Database,
    pub vector_query: &'a [f32],
    pub k: usize,
    pub ef: usize,
}

/// Index bindings for the vector projection. `name` is read from `node_name`.
fn projection_bindings() -> String {
    CANDIDATE_FIELDS
        .iter()
        .map(|f| match *f {
            "name" => "node_name: name".to_string(),
            other => other.to_string(),
        })
        .join(", ")
}

fn similarity_script() -> String {
    let head = CANDIDATE_FIELDS.iter().join(", ");
    format!(
        r#"
    ?[{head}, score] :=
        ~{NODE_RELATION}:{VECTOR_INDEX}{{ {bindings} |
            query: vec($vector_query),
            k: $k,
            ef: $ef,
            bind_distance: distance
        }},
        score = 1.0 - distance
    :sort -score
    "#,
        bindings = projection_bindings(),
    )
}

/// Nearest nodes to `vector_query` under cosine similarity, best first.
///
/// Scores are `1 - cosine distance`, so higher means more similar. At most `k` records come
/// back; fewer when the graph holds fewer embedded nodes.
#[instrument(skip_all, fields(k = args.k, ef = args.ef))]
pub fn search_similar(args: SimilarArgs) -> Result<Vec<CandidateRecord>, DbError> {
    let SimilarArgs {
        db,
        vector_query,
        k,
        ef,
    } = args;
    if k == 0 {
        return Ok(Vec::new());
    }
    let mut params = BTreeMap::new();
    params.insert("k".to_string(), DataValue::from(k as i64));
    params.insert("ef".to_string(), DataValue::from(ef.max(k) as i64));
    params.insert("vector_query".to_string(), arr_to_float(vector_query));

    let script = similarity_script();
    tracing::trace!("script for similarity search is: {}", script);
    let rows = db
        .run_script(&script, params, ScriptMutability::Immutable)
        .inspect_err(|e| tracing::error!("{e}"))
        .map_err(|e| DbError::IndexUnavailable(e.to_string()))?;

    let mut records = rows_to_candidates(rows)?;
    records.truncate(k);
    Ok(records)
}

fn rows_to_candidates(rows: NamedRows) -> Result<Vec<CandidateRecord>, DbError> {
    let h = &rows.headers;
    let name = get_pos(h, "name")?;
    let category = get_pos(h, "category")?;
    let pharmacodynamics = get_pos(h, "pharmacodynamics")?;
    let group = get_pos(h, "group")?;
    let half_life = get_pos(h, "half_life")?;
    let indication = get_pos(h, "indication")?;
    let mechanism_of_action = get_pos(h, "mechanism_of_action")?;
    let protein_binding = get_pos(h, "protein_binding")?;
    let state = get_pos(h, "state")?;
    let node_index = get_pos(h, "node_index")?;
    let node_type = get_pos(h, "node_type")?;
    let node_source = get_pos(h, "node_source")?;
    let mayo_causes = get_pos(h, "mayo_causes")?;
    let mayo_complications = get_pos(h, "mayo_complications")?;
    let mayo_risk_factors = get_pos(h, "mayo_risk_factors")?;
    let mayo_symptoms = get_pos(h, "mayo_symptoms")?;
    let mondo_definition = get_pos(h, "mondo_definition")?;
    let score = get_pos(h, "score")?;

    let s = |row: &[DataValue], i: usize, col: &str| to_opt_string(&row[i], col);

    rows.rows
        .iter()
        .map(|row| {
            let row = row.as_slice();
            Ok(CandidateRecord {
                name: s(row, name, "name")?.unwrap_or_default(),
                category: s(row, category, "category")?,
                pharmacodynamics: s(row, pharmacodynamics, "pharmacodynamics")?,
                group: s(row, group, "group")?,
                half_life: s(row, half_life, "half_life")?,
                indication: s(row, indication, "indication")?,
                mechanism_of_action: s(row, mechanism_of_action, "mechanism_of_action")?,
                protein_binding: s(row, protein_binding, "protein_binding")?,
                state: s(row, state, "state")?,
                node_index: to_opt_int(&row[node_index], "node_index")?,
                node_type: s(row, node_type, "node_type")?,
                node_source: s(row, node_source, "node_source")?,
                mayo_causes: s(row, mayo_causes, "mayo_causes")?,
                mayo_complications: s(row, mayo_complications, "mayo_complications")?,
                mayo_risk_factors: s(row, mayo_risk_factors, "mayo_risk_factors")?,
                mayo_symptoms: s(row, mayo_symptoms, "mayo_symptoms")?,
                mondo_definition: s(row, mondo_definition, "mondo_definition")?,
                score: to_f32(&row[score], "score")?,
            })
        })
        .collect()
}
