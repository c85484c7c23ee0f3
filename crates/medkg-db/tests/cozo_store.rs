use std::sync::Arc;

use medkg_core::QuestionEmbedding;
use medkg_db::{Database, DbError, GraphStore, VectorIndex};
use medkg_test_utils::{
    fixture::{axis, fixture_db, FIXTURE_DIMS, TEST_DB},
    init_test_tracing,
};

fn test_db() -> Arc<Database> {
    init_test_tracing(tracing::Level::ERROR);
    TEST_DB.clone().expect("fixture db builds")
}

#[tokio::test]
async fn nearest_nodes_come_back_projected_and_scored() -> Result<(), DbError> {
    let db = test_db();
    let q = QuestionEmbedding::new(axis(0)).unwrap();
    let records = db.search(&q, 2).await?;

    assert_eq!(records.len(), 2);
    let copper = records.iter().find(|r| r.name == "Copper").expect("Copper is nearest");
    assert!((copper.score - 1.0).abs() < 1e-4, "score {}", copper.score);
    assert_eq!(copper.node_type.as_deref(), Some("drug"));
    assert_eq!(copper.category.as_deref(), Some("Metal"));
    assert_eq!(copper.node_index, Some(0));
    assert_eq!(copper.mayo_symptoms, None);
    assert!(records.iter().any(|r| r.name == "Zinc"));
    Ok(())
}

#[tokio::test]
async fn k_larger_than_graph_returns_everything_embedded() -> Result<(), DbError> {
    let db = test_db();
    let q = QuestionEmbedding::new(axis(1)).unwrap();
    let records = db.search(&q, 50).await?;
    assert_eq!(records.len(), medkg_test_utils::fixture::NODES.len());
    for r in &records {
        assert!(r.score <= 1.0 + 1e-4);
    }
    Ok(())
}

#[tokio::test]
async fn wrong_dimension_is_index_unavailable() {
    let db = test_db();
    let q = QuestionEmbedding::new(vec![1.0; FIXTURE_DIMS + 1]).unwrap();
    let err = db.search(&q, 3).await.unwrap_err();
    assert!(matches!(err, DbError::IndexUnavailable(_)), "{err:?}");
}

#[tokio::test]
async fn read_query_returns_requested_headers_only() -> Result<(), DbError> {
    let db = test_db();
    let result = db
        .run_read_query(
            r#"?[drug, disease] :=
                *node{node_index: a, node_name: drug},
                *relation{src: a, dst: b, relation: "indication"},
                *node{node_index: b, node_name: disease}"#,
        )
        .await?;
    assert_eq!(result.headers, vec!["drug", "disease"]);
    assert_eq!(result.len(), 1);
    let row = &result.rows[0];
    assert_eq!(row.keys().collect::<Vec<_>>(), vec!["drug", "disease"]);
    assert_eq!(row["drug"], "Isotretinoin");
    assert_eq!(row["disease"], "acne");
    Ok(())
}

#[tokio::test]
async fn substring_lookup_over_attributes() -> Result<(), DbError> {
    let db = test_db();
    let result = db
        .run_read_query(
            r#"?[name, mayo_symptoms] :=
                *node{node_name: name, mayo_symptoms},
                str_includes(name, "cancer"),
                !is_null(mayo_symptoms)
               :limit 3"#,
        )
        .await?;
    assert_eq!(result.len(), 2);
    Ok(())
}

#[tokio::test]
async fn empty_result_is_not_an_error() -> Result<(), DbError> {
    let db = test_db();
    let result = db
        .run_read_query(r#"?[name] := *node{node_name: name}, name == "Unobtainium""#)
        .await?;
    assert!(result.is_empty());
    assert_eq!(result.headers, vec!["name"]);
    Ok(())
}

#[tokio::test]
async fn invalid_query_is_execution_error() {
    let db = test_db();
    let err = db
        .run_read_query("?[x] := *no_such_relation{x}")
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::QueryExecution(_)), "{err:?}");
}

#[tokio::test]
async fn mutation_never_reaches_the_store() -> Result<(), DbError> {
    let db = Arc::new(fixture_db()?);
    let err = db
        .run_read_query(r#"?[node_index, node_name] <- [[99, "Mallory"]] :put node {node_index => node_name}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::UnsafeQuery { ref keyword } if keyword == ":put"));

    let check = db
        .run_read_query(r#"?[n] := *node{node_index: 99, node_name: n}"#)
        .await?;
    assert!(check.is_empty());
    Ok(())
}

#[tokio::test]
async fn glued_mutation_is_refused_before_the_store() -> Result<(), DbError> {
    let db = Arc::new(fixture_db()?);
    let err = db
        .run_read_query(r#"?[node_index, node_name] <- [[97, "Trudy"]]:put node {node_index => node_name}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::UnsafeQuery { ref keyword } if keyword == ":put"), "{err:?}");

    let check = db
        .run_read_query(r#"?[n] := *node{node_index: 97, node_name: n}"#)
        .await?;
    assert!(check.is_empty());
    Ok(())
}

#[test]
fn immutable_execution_rejects_writes_the_guard_cannot_see() -> Result<(), DbError> {
    // Bypasses the guard: the store itself refuses to write in immutable mode.
    let db = fixture_db()?;
    let res = db.raw_query(r#"?[node_index, node_name] <- [[98, "Eve"]] :put node {node_index => node_name}"#);
    assert!(res.is_err());
    let check = db.raw_query(r#"?[n] := *node{node_index: 98, node_name: n}"#)?;
    assert!(check.rows.is_empty());
    Ok(())
}
