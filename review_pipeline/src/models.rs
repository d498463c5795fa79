//! Diesel models mapping to the database schema.
//!
//! These types mirror the two tables in [`crate::schema`]:
//! - [`crate::schema::banks`]: normalized dimension of distinct institutions
//! - [`crate::schema::reviews`]: one fact row per persisted review, keyed by
//!   the externally-sourced `review_id` and referencing its bank via FK
//!
//! Surrogate `bank_id`s are assigned by the load (first-seen order, starting
//! at 1), not by the database, so the insertable bank form carries the id.

use diesel::prelude::*;

/// A row in [`crate::schema::banks`]: one distinct institution.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = crate::schema::banks, check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(primary_key(bank_id))]
pub struct Bank {
    /// Surrogate id assigned at load time.
    pub bank_id: i32,
    /// Institution name (unique).
    pub bank_name: String,
    /// Provenance of the institution's reviews (e.g., "Google Play Store").
    pub source: Option<String>,
}

/// Insertable form of [`Bank`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::banks)]
pub struct NewBank<'a> {
    /// Surrogate id assigned at load time, starting at 1.
    pub bank_id: i32,
    /// Institution name (unique).
    pub bank_name: &'a str,
    /// Provenance of the institution's reviews.
    pub source: Option<&'a str>,
}

/// A row in [`crate::schema::reviews`]: one persisted review fact.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = crate::schema::reviews, check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(primary_key(review_id))]
#[diesel(belongs_to(Bank, foreign_key = bank_id))]
pub struct ReviewRow {
    /// Externally-assigned review identifier (primary key).
    pub review_id: String,
    /// FK to [`Bank::bank_id`].
    pub bank_id: i32,
    /// Raw review body.
    pub review_text: String,
    /// Star rating in `[1,5]`.
    pub rating: i32,
    /// Coarse polarity label.
    pub sentiment_label: Option<String>,
    /// Confidence associated with the label.
    pub sentiment_score: Option<f64>,
    /// Assigned theme.
    pub theme: Option<String>,
    /// Validated authoring date, `%Y-%m-%d`.
    pub date: Option<String>,
}

/// Insertable form of [`ReviewRow`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::reviews)]
pub struct NewReview<'a> {
    /// Externally-assigned review identifier (primary key).
    pub review_id: &'a str,
    /// FK to [`Bank::bank_id`].
    pub bank_id: i32,
    /// Raw review body.
    pub review_text: &'a str,
    /// Star rating in `[1,5]`.
    pub rating: i32,
    /// Coarse polarity label.
    pub sentiment_label: &'a str,
    /// Confidence associated with the label.
    pub sentiment_score: f64,
    /// Assigned theme.
    pub theme: &'a str,
    /// Validated authoring date, `%Y-%m-%d`.
    pub date: &'a str,
}
