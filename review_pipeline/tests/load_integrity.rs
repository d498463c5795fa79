//! Bulk-load behavior against a real SQLite store: referential integrity,
//! exclusions, idempotent re-provisioning, and batch-abort semantics.

mod common;

use common::{enriched, setup_store};
use review_pipeline::{
    db::provision::provision,
    store::{self, queries},
};

#[test]
fn load_inserts_dimension_then_facts() {
    let (_dir, mut conn) = setup_store();

    let mut rows = Vec::new();
    for i in 0..6 {
        rows.push(enriched(&format!("a{i}"), "Bank A"));
    }
    for i in 0..4 {
        rows.push(enriched(&format!("b{i}"), "Bank B"));
    }

    let outcome = store::load(&mut conn, &rows, 500).unwrap();
    assert!(outcome.complete());
    assert_eq!(outcome.banks_inserted, 2);
    assert_eq!(outcome.reviews_inserted, 10);
    assert_eq!(outcome.batches_committed, 1);

    let counts = queries::read_counts(&mut conn).unwrap();
    assert_eq!(counts.total_reviews, 10);
    assert_eq!(counts.unique_banks, 2);
    assert_eq!(counts.per_bank["Bank A"], 6);
    assert_eq!(counts.per_bank["Bank B"], 4);
}

#[test]
fn reprovision_and_reload_is_idempotent() {
    let (_dir, mut conn) = setup_store();
    let rows = vec![enriched("r1", "Bank A"), enriched("r2", "Bank B")];

    store::load(&mut conn, &rows, 500).unwrap();

    // A second full run replaces the store rather than doubling it or
    // tripping the primary key.
    provision(&mut conn).unwrap();
    let outcome = store::load(&mut conn, &rows, 500).unwrap();
    assert!(outcome.complete());

    let counts = queries::read_counts(&mut conn).unwrap();
    assert_eq!(counts.total_reviews, 2);
    assert_eq!(counts.unique_banks, 2);
}

#[test]
fn blank_bank_rows_are_excluded_as_dangling() {
    let (_dir, mut conn) = setup_store();
    let rows = vec![enriched("r1", "Bank A"), enriched("r2", "   ")];

    let outcome = store::load(&mut conn, &rows, 500).unwrap();
    assert!(outcome.complete());
    assert_eq!(outcome.dangling_excluded, 1);
    assert_eq!(outcome.reviews_inserted, 1);

    let counts = queries::read_counts(&mut conn).unwrap();
    assert_eq!(counts.total_reviews, 1);
}

#[test]
fn unparseable_dates_are_excluded() {
    let (_dir, mut conn) = setup_store();
    let mut bad = enriched("r2", "Bank A");
    bad.date = "June 1st, 2024".to_string();
    let rows = vec![enriched("r1", "Bank A"), bad];

    let outcome = store::load(&mut conn, &rows, 500).unwrap();
    assert!(outcome.complete());
    assert_eq!(outcome.bad_date_excluded, 1);
    assert_eq!(outcome.reviews_inserted, 1);
}

#[test]
fn failed_batch_aborts_but_keeps_committed_rows() {
    let (_dir, mut conn) = setup_store();

    // Batch 1: r1, r2. Batch 2: r3 plus a duplicate of r1, which violates
    // the primary key and fails the whole statement.
    let rows = vec![
        enriched("r1", "Bank A"),
        enriched("r2", "Bank A"),
        enriched("r3", "Bank A"),
        enriched("r1", "Bank A"),
    ];

    let outcome = store::load(&mut conn, &rows, 2).unwrap();
    assert!(!outcome.complete());
    assert!(outcome.error.is_some());
    assert_eq!(outcome.batches_committed, 1);
    assert_eq!(outcome.reviews_inserted, 2);

    let counts = queries::read_counts(&mut conn).unwrap();
    assert_eq!(counts.total_reviews, 2);
}

#[test]
fn empty_dataset_loads_nothing_without_error() {
    let (_dir, mut conn) = setup_store();
    let outcome = store::load(&mut conn, &[], 500).unwrap();
    assert!(outcome.complete());
    assert_eq!(outcome.banks_inserted, 0);
    assert_eq!(outcome.reviews_inserted, 0);
}
