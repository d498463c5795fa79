//! Bulk load of the enriched dataset into the review store.
//!
//! ## Load algorithm
//! 1. Derive the bank dimension from the dataset: distinct
//!    (`bank_name`, `source`) pairs in first-seen order, surrogate ids
//!    starting at 1.
//! 2. Insert the dimension first (referenced before referencing).
//! 3. Build a name→id lookup and attach `bank_id` to every review row;
//!    rows with no matching dimension entry are excluded and counted.
//! 4. Validate `date`; rows with an unparseable date are excluded and
//!    counted.
//! 5. Insert review rows in bounded-size batches with per-batch progress.
//!
//! ## Failure semantics
//! An insertion error aborts the remaining batches but does not roll back
//! already-committed ones. The store may end up partially loaded; the
//! [`LoadOutcome`] carries the error so the run report can surface it.

pub mod queries;

use anyhow::bail;
use chrono::NaiveDate;
use diesel::{RunQueryDsl, SqliteConnection, insert_into};
use indexmap::IndexMap;
use tracing::{info, warn};

use crate::{
    models::{NewBank, NewReview},
    records::EnrichedReview,
    schema::{banks, reviews},
};

/// Date format accepted by the load; anything else is an anomaly.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Result of one bulk load.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Distinct banks inserted into the dimension.
    pub banks_inserted: usize,
    /// Review rows committed to the store.
    pub reviews_inserted: usize,
    /// Batches that committed before the load finished or aborted.
    pub batches_committed: usize,
    /// Rows excluded because their bank has no dimension entry.
    pub dangling_excluded: usize,
    /// Rows excluded because their date failed to parse.
    pub bad_date_excluded: usize,
    /// First insertion error, if the load aborted early.
    pub error: Option<String>,
}

impl LoadOutcome {
    /// True when every surviving row was committed and no batch failed.
    pub fn complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Derives the bank dimension: first-seen distinct names with ids from 1.
///
/// Blank bank names never become dimension rows; reviews carrying one are
/// excluded later as dangling.
fn derive_banks(rows: &[EnrichedReview]) -> IndexMap<String, (i32, String)> {
    let mut dim: IndexMap<String, (i32, String)> = IndexMap::new();
    for r in rows {
        let name = r.bank.trim();
        if name.is_empty() {
            continue;
        }
        let next_id = dim.len() as i32 + 1;
        dim.entry(name.to_string())
            .or_insert_with(|| (next_id, r.source.clone()));
    }
    dim
}

/// Loads the enriched dataset into a provisioned store.
///
/// `batch_size` bounds each insert statement; it must be at least 1 (a zero
/// batch size is a caller bug, not an input anomaly).
pub fn load(
    conn: &mut SqliteConnection,
    rows: &[EnrichedReview],
    batch_size: usize,
) -> anyhow::Result<LoadOutcome> {
    if batch_size == 0 {
        bail!("load invoked with batch_size = 0");
    }

    let mut outcome = LoadOutcome::default();
    if rows.is_empty() {
        warn!("load invoked with an empty dataset, nothing to do");
        return Ok(outcome);
    }

    // 1-2. Dimension first, in dependency order.
    let dim = derive_banks(rows);
    let bank_rows: Vec<NewBank<'_>> = dim
        .iter()
        .map(|(name, (id, source))| NewBank {
            bank_id: *id,
            bank_name: name,
            source: Some(source),
        })
        .collect();
    outcome.banks_inserted = insert_into(banks::table).values(&bank_rows).execute(conn)?;
    info!(banks = outcome.banks_inserted, "bank dimension inserted");

    // 3-4. Attach bank_id and validate dates; exclusions are counted, never
    // coerced.
    let mut review_rows: Vec<NewReview<'_>> = Vec::with_capacity(rows.len());
    for r in rows {
        let Some((bank_id, _)) = dim.get(r.bank.trim()) else {
            warn!(review_id = %r.review_id, bank = %r.bank, "no dimension row for bank, excluding review");
            outcome.dangling_excluded += 1;
            continue;
        };
        if NaiveDate::parse_from_str(&r.date, DATE_FORMAT).is_err() {
            warn!(review_id = %r.review_id, date = %r.date, "unparseable date, excluding review");
            outcome.bad_date_excluded += 1;
            continue;
        }
        review_rows.push(NewReview {
            review_id: &r.review_id,
            bank_id: *bank_id,
            review_text: &r.review_text,
            rating: r.rating,
            sentiment_label: &r.sentiment_label,
            sentiment_score: r.sentiment_score,
            theme: &r.theme,
            date: &r.date,
        });
    }

    // 5. Bounded batches; a failed batch aborts the rest but keeps what
    // already committed.
    let total_batches = review_rows.len().div_ceil(batch_size);
    for (i, chunk) in review_rows.chunks(batch_size).enumerate() {
        match insert_into(reviews::table).values(chunk).execute(conn) {
            Ok(n) => {
                outcome.reviews_inserted += n;
                outcome.batches_committed += 1;
                info!(batch = i + 1, of = total_batches, rows = n, "review batch committed");
            }
            Err(e) => {
                warn!(batch = i + 1, of = total_batches, error = %e, "insertion failed, aborting remaining batches");
                outcome.error = Some(e.to_string());
                break;
            }
        }
    }

    Ok(outcome)
}
