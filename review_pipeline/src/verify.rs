//! Integrity verification: source dataset vs. stored aggregates.
//!
//! The verifier is a read-only, happens-after consumer of the store. It
//! recomputes the aggregates the storage layer should reflect (total rows,
//! unique banks, per-bank, per-label, per-theme, and per-rating counts)
//! directly from the enriched dataset, queries the store for the same
//! numbers, and diffs the two. Every mismatched dimension is itemized by
//! name with both values and the signed difference; the report only claims
//! verified integrity at zero mismatches.

use std::{collections::BTreeMap, fmt};

use diesel::SqliteConnection;

use crate::{
    records::EnrichedReview,
    store::queries::{self, StoreCounts},
};

/// Aggregate counts recomputed from the source dataset alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceCounts {
    /// Total rows in the dataset.
    pub total_reviews: i64,
    /// Distinct non-blank bank names.
    pub unique_banks: i64,
    /// Row count per bank name.
    pub per_bank: BTreeMap<String, i64>,
    /// Row count per sentiment label.
    pub per_label: BTreeMap<String, i64>,
    /// Row count per theme.
    pub per_theme: BTreeMap<String, i64>,
    /// Row count per rating value (keys "1".."5").
    pub per_rating: BTreeMap<String, i64>,
}

/// Recomputes the aggregates from the dataset, independently of the store.
pub fn source_counts(rows: &[EnrichedReview]) -> SourceCounts {
    let mut c = SourceCounts {
        total_reviews: rows.len() as i64,
        ..Default::default()
    };

    for r in rows {
        let bank = r.bank.trim();
        if !bank.is_empty() {
            *c.per_bank.entry(bank.to_string()).or_default() += 1;
        }
        *c.per_label.entry(r.sentiment_label.clone()).or_default() += 1;
        *c.per_theme.entry(r.theme.clone()).or_default() += 1;
        *c.per_rating.entry(r.rating.to_string()).or_default() += 1;
    }
    c.unique_banks = c.per_bank.len() as i64;

    c
}

/// One mismatched dimension between store and source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountMismatch {
    /// Dimension name, e.g. `total reviews` or `bank 'Dashen Bank'`.
    pub dimension: String,
    /// Value as stored.
    pub database: i64,
    /// Value recomputed from the source dataset.
    pub source: i64,
}

impl CountMismatch {
    /// Signed difference, store minus source.
    pub fn difference(&self) -> i64 {
        self.database - self.source
    }
}

/// The itemized verification result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    /// Aggregates as stored.
    pub database: StoreCounts,
    /// Aggregates recomputed from the source dataset.
    pub source: SourceCounts,
    /// Every dimension where the two disagree.
    pub mismatches: Vec<CountMismatch>,
}

impl VerificationReport {
    /// True only when no dimension mismatched.
    pub fn verified(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Compares the source dataset against the store and itemizes every
/// divergence.
pub fn verify(
    rows: &[EnrichedReview],
    conn: &mut SqliteConnection,
) -> anyhow::Result<VerificationReport> {
    let database = queries::read_counts(conn)?;
    let source = source_counts(rows);

    let mut mismatches = Vec::new();

    push_if_differs(
        &mut mismatches,
        "total reviews",
        database.total_reviews,
        source.total_reviews,
    );
    push_if_differs(
        &mut mismatches,
        "unique banks",
        database.unique_banks,
        source.unique_banks,
    );
    compare_maps(&mut mismatches, "bank", &database.per_bank, &source.per_bank);
    compare_maps(
        &mut mismatches,
        "sentiment",
        &database.per_label,
        &source.per_label,
    );
    compare_maps(&mut mismatches, "theme", &database.per_theme, &source.per_theme);
    compare_maps(
        &mut mismatches,
        "rating",
        &database.per_rating,
        &source.per_rating,
    );

    Ok(VerificationReport {
        database,
        source,
        mismatches,
    })
}

fn push_if_differs(out: &mut Vec<CountMismatch>, dimension: &str, database: i64, source: i64) {
    if database != source {
        out.push(CountMismatch {
            dimension: dimension.to_string(),
            database,
            source,
        });
    }
}

fn compare_maps(
    out: &mut Vec<CountMismatch>,
    kind: &str,
    database: &BTreeMap<String, i64>,
    source: &BTreeMap<String, i64>,
) {
    // Union of keys: a dimension missing on either side compares as zero.
    let keys: std::collections::BTreeSet<&String> =
        database.keys().chain(source.keys()).collect();
    for key in keys {
        let db = database.get(key).copied().unwrap_or(0);
        let src = source.get(key).copied().unwrap_or(0);
        push_if_differs(out, &format!("{kind} '{key}'"), db, src);
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = "Verification Report";
        writeln!(f, "{title}")?;
        for _ in 0..title.len() {
            write!(f, "-")?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "database: {} reviews across {} banks",
            self.database.total_reviews, self.database.unique_banks
        )?;
        writeln!(
            f,
            "source:   {} reviews across {} banks",
            self.source.total_reviews, self.source.unique_banks
        )?;

        if self.verified() {
            write!(f, "integrity verified, no mismatches")
        } else {
            writeln!(f)?;
            let header = format!("Mismatches ({})", self.mismatches.len());
            writeln!(f, "{header}")?;
            for _ in 0..header.len() {
                write!(f, "-")?;
            }
            writeln!(f)?;
            for m in &self.mismatches {
                writeln!(
                    f,
                    "! {}  db={} source={} ({:+})",
                    m.dimension,
                    m.database,
                    m.source,
                    m.difference()
                )?;
            }
            write!(f, "integrity check FAILED")
        }
    }
}
