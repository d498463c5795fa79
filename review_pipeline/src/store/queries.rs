//! Aggregate read surface over the review store.
//!
//! The verifier and the report stage both consume these; nothing here
//! writes. Counts come back as plain ordered maps so they can be diffed
//! against the source dataset without touching diesel types.

use std::collections::BTreeMap;

use diesel::{
    QueryableByName, RunQueryDsl, SqliteConnection, sql_query,
    sql_types::{BigInt, Double, Nullable, Text},
};

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    n: i64,
}

#[derive(QueryableByName)]
struct NamedCountRow {
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = BigInt)]
    n: i64,
}

#[derive(QueryableByName)]
struct SummaryRow {
    #[diesel(sql_type = BigInt)]
    total_reviews: i64,
    #[diesel(sql_type = BigInt)]
    unique_banks: i64,
    #[diesel(sql_type = Nullable<Double>)]
    avg_rating: Option<f64>,
    #[diesel(sql_type = Nullable<Text>)]
    earliest: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    latest: Option<String>,
}

#[derive(QueryableByName)]
struct BankSummaryRow {
    #[diesel(sql_type = Text)]
    bank_name: String,
    #[diesel(sql_type = BigInt)]
    review_count: i64,
    #[diesel(sql_type = Nullable<Double>)]
    avg_rating: Option<f64>,
    #[diesel(sql_type = Nullable<Double>)]
    positive_pct: Option<f64>,
}

/// Aggregate counts as stored, mirroring what the verifier recomputes from
/// the source dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreCounts {
    /// Total persisted review rows.
    pub total_reviews: i64,
    /// Rows in the bank dimension.
    pub unique_banks: i64,
    /// Review count per bank name.
    pub per_bank: BTreeMap<String, i64>,
    /// Review count per sentiment label.
    pub per_label: BTreeMap<String, i64>,
    /// Review count per theme.
    pub per_theme: BTreeMap<String, i64>,
    /// Review count per rating value (keys "1".."5").
    pub per_rating: BTreeMap<String, i64>,
}

/// Reads every aggregate the verifier compares.
pub fn read_counts(conn: &mut SqliteConnection) -> anyhow::Result<StoreCounts> {
    let total: CountRow = sql_query("SELECT COUNT(*) AS n FROM reviews").get_result(conn)?;
    let banks: CountRow = sql_query("SELECT COUNT(*) AS n FROM banks").get_result(conn)?;

    let per_bank = named_counts(
        conn,
        "SELECT b.bank_name AS name, COUNT(r.review_id) AS n
         FROM reviews r JOIN banks b ON r.bank_id = b.bank_id
         GROUP BY b.bank_name",
    )?;
    let per_label = named_counts(
        conn,
        "SELECT COALESCE(sentiment_label, '') AS name, COUNT(*) AS n
         FROM reviews GROUP BY sentiment_label",
    )?;
    let per_theme = named_counts(
        conn,
        "SELECT COALESCE(theme, '') AS name, COUNT(*) AS n
         FROM reviews GROUP BY theme",
    )?;
    let per_rating = named_counts(
        conn,
        "SELECT CAST(rating AS TEXT) AS name, COUNT(*) AS n
         FROM reviews GROUP BY rating",
    )?;

    Ok(StoreCounts {
        total_reviews: total.n,
        unique_banks: banks.n,
        per_bank,
        per_label,
        per_theme,
        per_rating,
    })
}

fn named_counts(conn: &mut SqliteConnection, query: &str) -> anyhow::Result<BTreeMap<String, i64>> {
    let rows: Vec<NamedCountRow> = sql_query(query).load(conn)?;
    Ok(rows.into_iter().map(|r| (r.name, r.n)).collect())
}

/// Per-bank roll-up used by the rendered summary.
#[derive(Debug, Clone, PartialEq)]
pub struct BankSummary {
    /// Institution name.
    pub bank_name: String,
    /// Persisted review count for this bank.
    pub review_count: i64,
    /// Mean rating, when any rows exist.
    pub avg_rating: Option<f64>,
    /// Share of POSITIVE reviews in percent.
    pub positive_pct: Option<f64>,
}

/// Store-wide summary statistics for the final report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryStats {
    /// Total persisted review rows.
    pub total_reviews: i64,
    /// Distinct banks referenced by persisted reviews.
    pub unique_banks: i64,
    /// Mean rating across all rows.
    pub avg_rating: Option<f64>,
    /// Earliest review date.
    pub earliest: Option<String>,
    /// Latest review date.
    pub latest: Option<String>,
    /// Per-bank roll-ups, best-rated first.
    pub per_bank: Vec<BankSummary>,
}

/// Computes the summary statistics the report stage renders.
pub fn summary(conn: &mut SqliteConnection) -> anyhow::Result<SummaryStats> {
    let row: SummaryRow = sql_query(
        "SELECT
            COUNT(*) AS total_reviews,
            COUNT(DISTINCT bank_id) AS unique_banks,
            AVG(rating) AS avg_rating,
            MIN(date) AS earliest,
            MAX(date) AS latest
         FROM reviews",
    )
    .get_result(conn)?;

    let per_bank: Vec<BankSummaryRow> = sql_query(
        "SELECT
            b.bank_name AS bank_name,
            COUNT(r.review_id) AS review_count,
            AVG(r.rating) AS avg_rating,
            SUM(CASE WHEN r.sentiment_label = 'POSITIVE' THEN 1 ELSE 0 END) * 100.0
                / COUNT(*) AS positive_pct
         FROM reviews r
         JOIN banks b ON r.bank_id = b.bank_id
         GROUP BY b.bank_name
         ORDER BY avg_rating DESC",
    )
    .load(conn)?;

    Ok(SummaryStats {
        total_reviews: row.total_reviews,
        unique_banks: row.unique_banks,
        avg_rating: row.avg_rating,
        earliest: row.earliest,
        latest: row.latest,
        per_bank: per_bank
            .into_iter()
            .map(|r| BankSummary {
                bank_name: r.bank_name,
                review_count: r.review_count,
                avg_rating: r.avg_rating,
                positive_pct: r.positive_pct,
            })
            .collect(),
    })
}
