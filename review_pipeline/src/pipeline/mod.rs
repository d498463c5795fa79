//! The batch pipeline orchestrator.
//!
//! One run walks the stages in a fixed order: collect, clean, classify
//! sentiment, assign theme, persist, visualize. Each stage consumes exactly
//! the previous stage's output and snapshots its own to CSV before handing
//! over. A stage failure marks the rest of the run skipped rather than
//! aborting the process; the [`RunReport`] carries the full accounting either
//! way.

pub mod report;

use std::{fmt::Write as _, fs, path::PathBuf, time::Duration};

use diesel::SqliteConnection;
use review_ingestor::{
    collect::collect_reviews,
    models::review::RawReview,
    providers::ReviewProvider,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    config::PipelineConfig,
    db::provision::provision,
    records::{EnrichedReview, clean_reviews},
    sentiment::SentimentAnalyzer,
    snapshot::{
        CLEAN_SNAPSHOT, FINAL_SNAPSHOT, RAW_SNAPSHOT, SCORED_SNAPSHOT, load_snapshot,
        save_snapshot,
    },
    store::{self, queries},
    themes::apply_themes,
    verify,
};

pub use report::{Anomaly, RunReport, RunStatus, Stage, StageOutcome, StageStatus};

/// File name of the rendered plain-text summary.
pub const SUMMARY_REPORT: &str = "summary_report.txt";

/// Owns the configured components and drives one run at a time.
pub struct Pipeline {
    config: PipelineConfig,
    provider: Box<dyn ReviewProvider>,
    analyzer: SentimentAnalyzer,
}

impl Pipeline {
    /// Assembles a pipeline from its configured parts.
    pub fn new(
        config: PipelineConfig,
        provider: Box<dyn ReviewProvider>,
        analyzer: SentimentAnalyzer,
    ) -> Self {
        Self {
            config,
            provider,
            analyzer,
        }
    }

    /// Runs the whole pipeline once against an open store connection.
    ///
    /// Never returns an error: every failure mode is folded into the
    /// returned [`RunReport`].
    pub async fn run(&self, conn: &mut SqliteConnection) -> RunReport {
        let mut report = RunReport::default();

        // Collect.
        let Some(raw) = self.collect(&mut report).await else {
            skip_after(&mut report, Stage::Collect);
            return report;
        };
        self.snapshot(&mut report, Stage::Collect, RAW_SNAPSHOT, &raw);

        // Clean.
        let cleaned = clean_reviews(raw);
        if cleaned.duplicates_dropped > 0 {
            report.add_anomaly(
                Stage::Clean,
                "duplicate review ids dropped, first occurrence kept",
                cleaned.duplicates_dropped,
            );
        }
        if cleaned.missing_dropped > 0 {
            report.add_anomaly(
                Stage::Clean,
                "reviews dropped for missing id, text, or rating",
                cleaned.missing_dropped,
            );
        }
        if cleaned.invalid_rating_dropped > 0 {
            report.add_anomaly(
                Stage::Clean,
                "reviews dropped for a rating outside 1..=5",
                cleaned.invalid_rating_dropped,
            );
        }
        if cleaned.rows.is_empty() {
            report.record_failure(Stage::Clean, "no reviews survived cleaning");
            skip_after(&mut report, Stage::Clean);
            return report;
        }
        report.record_success(Stage::Clean, format!("{} reviews kept", cleaned.rows.len()));
        self.snapshot(&mut report, Stage::Clean, CLEAN_SNAPSHOT, &cleaned.rows);

        // Classify sentiment.
        let (scored, fallbacks) = self.analyzer.score_reviews(cleaned.rows).await;
        if fallbacks > 0 {
            report.add_anomaly(
                Stage::ClassifySentiment,
                "model failures substituted with the neutral fallback",
                fallbacks,
            );
        }
        report.record_success(
            Stage::ClassifySentiment,
            format!("{} reviews scored", scored.len()),
        );
        self.snapshot(&mut report, Stage::ClassifySentiment, SCORED_SNAPSHOT, &scored);

        // Assign theme.
        let (enriched, unthemed) = apply_themes(scored, &self.config.themes);
        if unthemed > 0 {
            report.add_anomaly(
                Stage::AssignTheme,
                "reviews matched no keyword group, assigned 'Other'",
                unthemed,
            );
        }
        report.record_success(
            Stage::AssignTheme,
            format!("{} reviews themed", enriched.len()),
        );
        self.snapshot(&mut report, Stage::AssignTheme, FINAL_SNAPSHOT, &enriched);

        // Persist.
        if !self.persist(&mut report, conn, &enriched) {
            skip_after(&mut report, Stage::Persist);
            return report;
        }

        // Visualize.
        match self.visualize(conn) {
            Ok(path) => {
                report.record_success(Stage::Visualize, format!("report at {}", path.display()))
            }
            Err(e) => report.record_failure(Stage::Visualize, e.to_string()),
        }

        info!(status = %report.status(), "pipeline run finished");
        report
    }

    /// Collect stage. Returns `None` when the stage failed (already recorded).
    async fn collect(&self, report: &mut RunReport) -> Option<Vec<RawReview>> {
        let listings = self.config.listings();
        let per_listing_timeout = Duration::from_millis(self.config.collect.timeout_ms);
        let collected = collect_reviews(self.provider.as_ref(), &listings, per_listing_timeout).await;

        for f in &collected.failures {
            report.add_anomaly(
                Stage::Collect,
                format!("listing '{}' failed: {}", f.bank, f.reason),
                1,
            );
        }

        if !collected.reviews.is_empty() {
            report.record_success(
                Stage::Collect,
                format!(
                    "{} reviews from {} of {} listings",
                    collected.reviews.len(),
                    listings.len() - collected.failures.len(),
                    listings.len()
                ),
            );
            return Some(collected.reviews);
        }

        // Nothing came back. A prior raw snapshot keeps the run alive with
        // stale data; without one the stage fails.
        match load_snapshot::<RawReview>(&self.config.data_dir, RAW_SNAPSHOT) {
            Ok(rows) if !rows.is_empty() => {
                warn!(rows = rows.len(), "collection came back empty, recovered prior raw snapshot");
                report.add_anomaly(
                    Stage::Collect,
                    "collection came back empty, recovered prior raw snapshot",
                    rows.len(),
                );
                report.record_success(
                    Stage::Collect,
                    format!("{} reviews from prior snapshot", rows.len()),
                );
                Some(rows)
            }
            _ => {
                report.record_failure(
                    Stage::Collect,
                    "collection returned no reviews and no prior snapshot exists",
                );
                None
            }
        }
    }

    /// Persist stage. Returns whether the downstream stage may run.
    fn persist(
        &self,
        report: &mut RunReport,
        conn: &mut SqliteConnection,
        rows: &[EnrichedReview],
    ) -> bool {
        let outcome = match provision(conn)
            .and_then(|()| store::load(conn, rows, self.config.load_batch_size))
        {
            Ok(outcome) => outcome,
            Err(e) => {
                report.record_failure(Stage::Persist, e.to_string());
                return false;
            }
        };

        if outcome.dangling_excluded > 0 {
            report.add_anomaly(
                Stage::Persist,
                "reviews excluded for referencing no bank dimension row",
                outcome.dangling_excluded,
            );
        }
        if outcome.bad_date_excluded > 0 {
            report.add_anomaly(
                Stage::Persist,
                "reviews excluded for an unparseable date",
                outcome.bad_date_excluded,
            );
        }
        if let Some(err) = &outcome.error {
            report.add_anomaly(
                Stage::Persist,
                format!(
                    "load aborted after {} committed batches ({} rows kept)",
                    outcome.batches_committed, outcome.reviews_inserted
                ),
                1,
            );
            report.record_failure(Stage::Persist, err.clone());
            return false;
        }

        // Read-only integrity check against what was just stored.
        match verify::verify(rows, conn) {
            Ok(verification) if verification.verified() => {}
            Ok(verification) => {
                // Exclusions above already explain most divergence; the count
                // still belongs in the accounting.
                report.add_anomaly(
                    Stage::Persist,
                    "stored aggregates diverge from the source dataset",
                    verification.mismatches.len(),
                );
            }
            Err(e) => {
                report.record_failure(Stage::Persist, format!("integrity check failed: {e}"));
                return false;
            }
        }

        report.record_success(
            Stage::Persist,
            format!(
                "{} reviews across {} banks",
                outcome.reviews_inserted, outcome.banks_inserted
            ),
        );
        true
    }

    /// Visualize stage: renders the stored aggregates as plain text.
    fn visualize(&self, conn: &mut SqliteConnection) -> anyhow::Result<PathBuf> {
        let stats = queries::summary(conn)?;
        let counts = queries::read_counts(conn)?;
        let rendered = render_summary(&stats, &counts.per_theme);

        fs::create_dir_all(&self.config.reports_dir)?;
        let path = self.config.reports_dir.join(SUMMARY_REPORT);
        fs::write(&path, rendered)?;
        Ok(path)
    }

    fn snapshot<T: Serialize>(
        &self,
        report: &mut RunReport,
        stage: Stage,
        name: &str,
        rows: &[T],
    ) {
        if let Err(e) = save_snapshot(&self.config.data_dir, name, rows) {
            warn!(snapshot = name, error = %e, "snapshot save failed, run continues");
            report.add_anomaly(stage, format!("snapshot {name} could not be saved: {e}"), 1);
        }
    }
}

fn skip_after(report: &mut RunReport, failed: Stage) {
    let idx = Stage::ALL.iter().position(|s| *s == failed).unwrap_or(0);
    for stage in &Stage::ALL[idx + 1..] {
        report.record_skipped(*stage);
    }
}

/// Renders the summary statistics as the plain-text report body.
fn render_summary(
    stats: &queries::SummaryStats,
    per_theme: &std::collections::BTreeMap<String, i64>,
) -> String {
    let mut out = String::new();
    let title = "Review Store Summary";
    let _ = writeln!(out, "{title}");
    out.push_str(&"-".repeat(title.len()));
    out.push('\n');

    let _ = writeln!(out, "total reviews: {}", stats.total_reviews);
    let _ = writeln!(out, "unique banks:  {}", stats.unique_banks);
    if let Some(avg) = stats.avg_rating {
        let _ = writeln!(out, "avg rating:    {avg:.2}");
    }
    if let (Some(earliest), Some(latest)) = (&stats.earliest, &stats.latest) {
        let _ = writeln!(out, "date range:    {earliest} to {latest}");
    }

    if !stats.per_bank.is_empty() {
        out.push('\n');
        let header = "Per Bank (best rated first)";
        let _ = writeln!(out, "{header}");
        out.push_str(&"-".repeat(header.len()));
        out.push('\n');
        for b in &stats.per_bank {
            let avg = b.avg_rating.unwrap_or(0.0);
            let pos = b.positive_pct.unwrap_or(0.0);
            let _ = writeln!(
                out,
                "{}: {} reviews, avg {:.2}, {:.1}% positive",
                b.bank_name, b.review_count, avg, pos
            );
        }
    }

    if !per_theme.is_empty() {
        out.push('\n');
        let header = "Theme Distribution";
        let _ = writeln!(out, "{header}");
        out.push_str(&"-".repeat(header.len()));
        out.push('\n');
        for (theme, n) in per_theme {
            let _ = writeln!(out, "{theme}: {n}");
        }
    }

    out
}
