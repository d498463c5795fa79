//! Shared setup for the integration tests: a provisioned store on a temp dir.

use diesel::SqliteConnection;
use review_pipeline::{db::connection::connect_sqlite, db::provision::provision, records::EnrichedReview};
use tempfile::TempDir;

/// Opens a fresh provisioned store backed by a temp directory.
///
/// The [`TempDir`] must stay alive as long as the connection; dropping it
/// removes the database file.
pub fn setup_store() -> (TempDir, SqliteConnection) {
    let dir = TempDir::new().expect("create temp dir");
    let db_path = dir.path().join("store.db");
    let mut conn = connect_sqlite(&db_path.to_string_lossy()).expect("open store");
    provision(&mut conn).expect("provision store");
    (dir, conn)
}

/// A fully enriched review row with sensible defaults.
#[allow(dead_code)]
pub fn enriched(id: &str, bank: &str) -> EnrichedReview {
    EnrichedReview {
        review_id: id.to_string(),
        bank: bank.to_string(),
        review_text: "Works fine for transfers".to_string(),
        cleaned_text: "works fine for transfers".to_string(),
        rating: 4,
        date: "2024-06-01".to_string(),
        source: "Google Play Store".to_string(),
        sentiment_label: "POSITIVE".to_string(),
        sentiment_score: 0.8,
        theme: "Functionality".to_string(),
    }
}
