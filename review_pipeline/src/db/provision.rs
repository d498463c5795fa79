//! Schema provisioning for the review store.

use diesel::{SqliteConnection, connection::SimpleConnection};

/// DDL applied on every run. Drop order matters: `reviews` references
/// `banks`, so the dependent table goes first.
const PROVISION_SQL: &str = r#"
DROP TABLE IF EXISTS reviews;
DROP TABLE IF EXISTS banks;

CREATE TABLE banks (
    bank_id   INTEGER PRIMARY KEY NOT NULL,
    bank_name TEXT NOT NULL UNIQUE,
    source    TEXT
);

CREATE TABLE reviews (
    review_id       TEXT PRIMARY KEY NOT NULL,
    bank_id         INTEGER NOT NULL REFERENCES banks(bank_id) ON DELETE CASCADE,
    review_text     TEXT NOT NULL,
    rating          INTEGER NOT NULL,
    sentiment_label TEXT,
    sentiment_score DOUBLE,
    theme           TEXT,
    date            TEXT
);

CREATE INDEX idx_reviews_bank_id ON reviews(bank_id);
CREATE INDEX idx_reviews_rating ON reviews(rating);
CREATE INDEX idx_reviews_sentiment ON reviews(sentiment_label);
CREATE INDEX idx_reviews_date ON reviews(date);
"#;

/// Provisions the schema, replacing any prior tables and their contents.
///
/// Safe to invoke against an already-provisioned store; this is the
/// full-replace load policy, so a re-run never trips the `review_id`
/// uniqueness constraint.
pub fn provision(conn: &mut SqliteConnection) -> anyhow::Result<()> {
    conn.batch_execute(PROVISION_SQL)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use diesel::{Connection, SqliteConnection, connection::SimpleConnection};

    use super::*;

    #[test]
    fn provision_applies_on_temp_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let path = temp.path().to_string_lossy().to_string();

        let mut conn = SqliteConnection::establish(&path).unwrap();
        provision(&mut conn).expect("provision run");

        conn.batch_execute(
            "INSERT INTO banks (bank_id, bank_name, source) VALUES (1, 'Bank A', 'Google Play Store')",
        )
        .unwrap();
    }

    #[test]
    fn provision_twice_replaces_contents() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let path = temp.path().to_string_lossy().to_string();

        let mut conn = SqliteConnection::establish(&path).unwrap();
        provision(&mut conn).unwrap();
        conn.batch_execute("INSERT INTO banks (bank_id, bank_name) VALUES (1, 'Bank A')")
            .unwrap();

        // Second provisioning wipes the store rather than failing on the
        // existing tables.
        provision(&mut conn).unwrap();
        conn.batch_execute("INSERT INTO banks (bank_id, bank_name) VALUES (1, 'Bank A')")
            .unwrap();
    }
}
