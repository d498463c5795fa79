//! Per-stage CSV snapshots with timestamped backups.
//!
//! Every stage persists its output as a flat CSV under the configured data
//! directory. Before a file is replaced, the previous version is renamed to
//! a timestamped backup, so a bad run never destroys the prior dataset. The
//! newest snapshot with the canonical name is always the authoritative one.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use snafu::{Backtrace, ResultExt, Snafu};
use tracing::info;

/// Canonical file name for the Collect stage output.
pub const RAW_SNAPSHOT: &str = "raw_reviews.csv";
/// Canonical file name for the Clean stage output.
pub const CLEAN_SNAPSHOT: &str = "cleaned_reviews.csv";
/// Canonical file name for the sentiment stage output.
pub const SCORED_SNAPSHOT: &str = "analyzed_reviews.csv";
/// Canonical file name for the fully enriched dataset.
pub const FINAL_SNAPSHOT: &str = "final_analyzed_reviews.csv";

/// Errors that can occur while saving or loading a stage snapshot.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SnapshotError {
    /// Failed to serialize rows into the CSV file.
    #[snafu(display("Failed to write snapshot {name}: {source}"))]
    Write {
        /// Snapshot file name.
        name: String,
        /// Underlying CSV error.
        source: csv::Error,
        /// Captured backtrace.
        backtrace: Backtrace,
    },

    /// Failed to read rows back from the CSV file.
    #[snafu(display("Failed to read snapshot {name}: {source}"))]
    Read {
        /// Snapshot file name.
        name: String,
        /// Underlying CSV error.
        source: csv::Error,
        /// Captured backtrace.
        backtrace: Backtrace,
    },

    /// A filesystem operation failed (directory creation, backup rename).
    #[snafu(display("I/O error: {source}"))]
    Io {
        /// Underlying I/O error.
        source: std::io::Error,
        /// Captured backtrace.
        backtrace: Backtrace,
    },
}

/// Builds the timestamped backup name for `name`, e.g.
/// `raw_reviews_20240601120000.csv`.
pub fn backup_name(name: &str, at: DateTime<Utc>) -> String {
    let stamp = at.format("%Y%m%d%H%M%S");
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{stamp}.{ext}"),
        None => format!("{name}_{stamp}"),
    }
}

/// Picks a backup path that does not exist yet. Two saves within the same
/// second would otherwise compute the same timestamped name and the rename
/// would clobber the older backup.
fn unique_backup_path(dir: &Path, name: &str, at: DateTime<Utc>) -> PathBuf {
    let base = backup_name(name, at);
    let mut path = dir.join(&base);
    let mut attempt = 1u32;
    while path.exists() {
        attempt += 1;
        let candidate = match base.rsplit_once('.') {
            Some((stem, ext)) => format!("{stem}_{attempt}.{ext}"),
            None => format!("{base}_{attempt}"),
        };
        path = dir.join(candidate);
    }
    path
}

/// Saves `rows` as `dir/name`, backing up any prior file with that name.
///
/// Returns the path written to.
pub fn save_snapshot<T: Serialize>(
    dir: &Path,
    name: &str,
    rows: &[T],
) -> Result<PathBuf, SnapshotError> {
    fs::create_dir_all(dir).context(IoSnafu)?;
    let path = dir.join(name);

    if path.exists() {
        let backup = unique_backup_path(dir, name, Utc::now());
        fs::rename(&path, &backup).context(IoSnafu)?;
        info!(from = %path.display(), to = %backup.display(), "backed up prior snapshot");
    }

    let mut writer = csv::Writer::from_path(&path).context(WriteSnafu { name })?;
    for row in rows {
        writer.serialize(row).context(WriteSnafu { name })?;
    }
    writer.flush().context(IoSnafu)?;

    info!(path = %path.display(), rows = rows.len(), "snapshot saved");
    Ok(path)
}

/// Loads all rows from `dir/name`.
pub fn load_snapshot<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Vec<T>, SnapshotError> {
    let path = dir.join(name);
    let mut reader = csv::Reader::from_path(&path).context(ReadSnafu { name })?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row.context(ReadSnafu { name })?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use review_ingestor::models::review::RawReview;
    use tempfile::TempDir;

    use super::*;

    fn sample(id: &str) -> RawReview {
        RawReview {
            review_id: id.to_string(),
            bank: "Bank A".to_string(),
            review_text: "works, mostly".to_string(),
            rating: Some(3),
            date: "2024-06-01".to_string(),
            source: "Google Play Store".to_string(),
        }
    }

    #[test]
    fn round_trips_rows() {
        let dir = TempDir::new().unwrap();
        let rows = vec![sample("r1"), sample("r2")];

        save_snapshot(dir.path(), RAW_SNAPSHOT, &rows).unwrap();
        let loaded: Vec<RawReview> = load_snapshot(dir.path(), RAW_SNAPSHOT).unwrap();

        assert_eq!(loaded, rows);
    }

    #[test]
    fn prior_file_is_backed_up_not_lost() {
        let dir = TempDir::new().unwrap();

        save_snapshot(dir.path(), RAW_SNAPSHOT, &[sample("old")]).unwrap();
        save_snapshot(dir.path(), RAW_SNAPSHOT, &[sample("new")]).unwrap();

        let files: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(files.len(), 2, "expected snapshot + backup, got {files:?}");
        assert!(files.iter().any(|f| f == RAW_SNAPSHOT));
        assert!(
            files
                .iter()
                .any(|f| f.starts_with("raw_reviews_") && f.ends_with(".csv"))
        );

        // The canonical name holds the latest rows.
        let loaded: Vec<RawReview> = load_snapshot(dir.path(), RAW_SNAPSHOT).unwrap();
        assert_eq!(loaded[0].review_id, "new");
    }

    #[test]
    fn rapid_saves_keep_every_backup() {
        let dir = TempDir::new().unwrap();

        // Three saves back to back land within the same second, so the
        // second and third backups need distinct names.
        save_snapshot(dir.path(), RAW_SNAPSHOT, &[sample("v1")]).unwrap();
        save_snapshot(dir.path(), RAW_SNAPSHOT, &[sample("v2")]).unwrap();
        save_snapshot(dir.path(), RAW_SNAPSHOT, &[sample("v3")]).unwrap();

        let files: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            files.len(),
            3,
            "expected snapshot + two backups, got {files:?}"
        );

        let loaded: Vec<RawReview> = load_snapshot(dir.path(), RAW_SNAPSHOT).unwrap();
        assert_eq!(loaded[0].review_id, "v3");
    }

    #[test]
    fn backup_name_embeds_timestamp_before_extension() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(
            backup_name("raw_reviews.csv", at),
            "raw_reviews_20240601120000.csv"
        );
        assert_eq!(backup_name("nodotname", at), "nodotname_20240601120000");
    }

    #[test]
    fn loading_a_missing_snapshot_errors() {
        let dir = TempDir::new().unwrap();
        let res: Result<Vec<RawReview>, _> = load_snapshot(dir.path(), "absent.csv");
        assert!(res.is_err());
    }
}
