//! Pipeline configuration: parsing, normalization, and loading.
//!
//! This module defines a TOML-backed configuration that describes:
//! - App listings (institution name -> marketplace package id + fetch knobs)
//! - Theme keyword groups, in declaration order (the order is the tie-break
//!   rule for theme assignment, so groups live in an `IndexMap`)
//! - Store connection, data directory, and batch/bound settings
//!
//! Key behaviors:
//! - Normalization trims institution and theme names, lowercases and
//!   de-duplicates keywords while preserving order, and rejects empties and
//!   duplicates.
//! - The theme name `Other` is reserved for unclassified reviews and cannot
//!   be configured.
//!
//! Entrypoints:
//! - Parse + normalize from a TOML string: [`load_config_str`]
//! - Parse + normalize from a file path: [`load_config_path`]

use std::{collections::HashSet, mem, path::PathBuf};

use anyhow::{Context, bail};
use indexmap::IndexMap;
use review_ingestor::models::review::AppListing;
use serde::{Deserialize, Serialize};
use toml::from_str;

use crate::themes::OTHER_THEME;

/// Top-level pipeline configuration, built once at startup and passed to each
/// component that needs it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// SQLite database path or URL.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Directory for the per-stage CSV snapshots.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory for rendered plain-text reports.
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,

    /// Number of review rows inserted per batch during the bulk load.
    #[serde(default = "default_load_batch_size")]
    pub load_batch_size: usize,

    /// Collection-stage bounds.
    #[serde(default)]
    pub collect: CollectCfg,

    /// Classification-stage bounds.
    #[serde(default)]
    pub classify: ClassifyCfg,

    /// Map of institution name -> app listing configuration.
    ///
    /// Keys are trimmed during normalization; order is preserved.
    #[serde(default)]
    pub apps: IndexMap<String, AppCfg>,

    /// Theme keyword groups in declaration order.
    ///
    /// Defaults to the built-in banking-review groups when absent.
    #[serde(default = "default_themes")]
    pub themes: IndexMap<String, Vec<String>>,
}

/// One app listing entry under `[apps]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppCfg {
    /// Marketplace package id (e.g., "com.dashen.dashensuperapp").
    pub app_id: String,
    /// Review language filter.
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Country code the reviews are fetched for.
    #[serde(default = "default_country")]
    pub country: String,
    /// Maximum number of reviews to collect for this listing.
    #[serde(default = "default_count")]
    pub count: u32,
}

/// Bounds for the collection stage.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CollectCfg {
    /// Per-listing fetch timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for CollectCfg {
    fn default() -> Self {
        Self { timeout_ms: 30_000 }
    }
}

/// Bounds for the sentiment-classification stage.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifyCfg {
    /// Input texts are truncated to this many bytes before classification.
    pub truncate_bytes: usize,
    /// Per-record classification timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ClassifyCfg {
    fn default() -> Self {
        Self {
            truncate_bytes: 512,
            timeout_ms: 10_000,
        }
    }
}

fn default_database_url() -> String {
    "fintech_reviews.db".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_load_batch_size() -> usize {
    500
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_country() -> String {
    "et".to_string()
}

fn default_count() -> u32 {
    500
}

/// Built-in theme keyword groups, matching the categories the analysts use
/// for banking-app reviews. Declaration order doubles as tie-break priority.
pub fn default_themes() -> IndexMap<String, Vec<String>> {
    let mut themes = IndexMap::new();
    themes.insert(
        "UI/UX".to_string(),
        ["interface", "design", "layout", "screen", "button", "menu", "navigation"]
            .map(String::from)
            .to_vec(),
    );
    themes.insert(
        "Performance".to_string(),
        ["slow", "fast", "speed", "loading", "lag", "crash", "freeze"]
            .map(String::from)
            .to_vec(),
    );
    themes.insert(
        "Functionality".to_string(),
        ["transfer", "payment", "login", "password", "account", "balance"]
            .map(String::from)
            .to_vec(),
    );
    themes.insert(
        "Security".to_string(),
        ["secure", "safe", "pin", "password", "authentication", "fingerprint"]
            .map(String::from)
            .to_vec(),
    );
    themes.insert(
        "Support".to_string(),
        ["support", "help", "service", "response", "contact", "complaint"]
            .map(String::from)
            .to_vec(),
    );
    themes
}

/// Summary of changes performed during normalization.
#[derive(Debug, Default)]
pub struct NormalizationReport {
    /// Number of institution keys that changed when trimming.
    pub banks_renamed: usize,
    /// Number of theme keys that changed when trimming.
    pub themes_renamed: usize,
    /// Count of removed duplicate keywords after normalization.
    pub keywords_deduped: usize,
}

/// Normalize a configuration in-place.
///
/// What normalization does:
/// - Trim institution keys; reject empties and duplicates after trimming
/// - Trim app ids; reject empties
/// - Trim theme keys; reject empties, duplicates, and the reserved `Other`
/// - Lowercase + trim keywords, de-duplicate preserving first occurrence,
///   reject groups that end up empty
pub fn normalize_config(cfg: &mut PipelineConfig) -> anyhow::Result<NormalizationReport> {
    let mut report = NormalizationReport::default();

    if cfg.load_batch_size == 0 {
        bail!("load_batch_size must be at least 1");
    }

    // Rebuild the apps map with trimmed keys.
    let mut rebuilt: IndexMap<String, AppCfg> = IndexMap::new();
    let old = mem::take(&mut cfg.apps);
    for (raw_name, mut app) in old {
        let name = raw_name.trim().to_string();
        if name.is_empty() {
            bail!("institution name cannot be empty after trimming");
        }
        if name != raw_name {
            report.banks_renamed += 1;
        }
        if rebuilt.contains_key(&name) {
            bail!("duplicate institution name after normalization: {name}");
        }
        app.app_id = app.app_id.trim().to_string();
        if app.app_id.is_empty() {
            bail!("app_id cannot be empty for institution {name}");
        }
        rebuilt.insert(name, app);
    }
    cfg.apps = rebuilt;

    // Rebuild the theme groups with trimmed keys and normalized keywords.
    let mut themes: IndexMap<String, Vec<String>> = IndexMap::new();
    let old = mem::take(&mut cfg.themes);
    for (raw_name, keywords) in old {
        let name = raw_name.trim().to_string();
        if name.is_empty() {
            bail!("theme name cannot be empty after trimming");
        }
        if name == OTHER_THEME {
            bail!("theme name '{OTHER_THEME}' is reserved for unclassified reviews");
        }
        if name != raw_name {
            report.themes_renamed += 1;
        }
        if themes.contains_key(&name) {
            bail!("duplicate theme name after normalization: {name}");
        }

        let before_len = keywords.len();
        let mut seen = HashSet::new();
        let mut normed = Vec::with_capacity(before_len);
        for kw in keywords {
            let kw = kw.trim().to_lowercase();
            if kw.is_empty() {
                bail!("keyword cannot be empty after trimming (theme {name})");
            }
            if seen.insert(kw.clone()) {
                normed.push(kw);
            }
        }
        report.keywords_deduped += before_len.saturating_sub(normed.len());
        if normed.is_empty() {
            bail!("theme {name} has no keywords");
        }
        themes.insert(name, normed);
    }
    if themes.is_empty() {
        bail!("at least one theme group must be configured");
    }
    cfg.themes = themes;

    Ok(report)
}

impl PipelineConfig {
    /// Builds the collection listings from the `[apps]` table, in
    /// declaration order.
    pub fn listings(&self) -> Vec<AppListing> {
        self.apps
            .iter()
            .map(|(bank, app)| AppListing {
                bank: bank.clone(),
                app_id: app.app_id.clone(),
                lang: app.lang.clone(),
                country: app.country.clone(),
                count: app.count,
            })
            .collect()
    }
}

/// Parse and normalize a configuration from a TOML string.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<PipelineConfig> {
    let mut cfg: PipelineConfig = from_str(toml_str).context("failed to parse pipeline TOML")?;
    let _report = normalize_config(&mut cfg).context("normalize_config failed")?;
    Ok(cfg)
}

/// Read a configuration TOML file from disk, parse, and normalize it.
pub fn load_config_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<PipelineConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read config file {}", path.as_ref().display()))?;
    load_config_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk() -> PipelineConfig {
        let mut apps = IndexMap::new();
        apps.insert(
            " Dashen Bank ".to_string(),
            AppCfg {
                app_id: " com.dashen.dashensuperapp ".to_string(),
                lang: "en".to_string(),
                country: "et".to_string(),
                count: 500,
            },
        );
        let mut themes = IndexMap::new();
        themes.insert(
            "Performance".to_string(),
            vec!["Slow".to_string(), "slow".to_string(), " crash ".to_string()],
        );
        PipelineConfig {
            database_url: default_database_url(),
            data_dir: default_data_dir(),
            reports_dir: default_reports_dir(),
            load_batch_size: default_load_batch_size(),
            collect: CollectCfg::default(),
            classify: ClassifyCfg::default(),
            apps,
            themes,
        }
    }

    #[test]
    fn normalizes_names_and_dedupes_keywords() {
        let mut cfg = mk();
        let rep = normalize_config(&mut cfg).unwrap();

        let (bank, app) = cfg.apps.first().unwrap();
        assert_eq!(bank, "Dashen Bank");
        assert_eq!(app.app_id, "com.dashen.dashensuperapp");
        assert_eq!(rep.banks_renamed, 1);

        assert_eq!(cfg.themes["Performance"], vec!["slow", "crash"]);
        assert_eq!(rep.keywords_deduped, 1);
    }

    #[test]
    fn duplicate_institution_collision_errors() {
        let mut cfg = mk();
        cfg.apps.insert(
            "Dashen Bank".to_string(),
            cfg.apps.get_index(0).unwrap().1.clone(),
        );
        let err = normalize_config(&mut cfg).unwrap_err();
        assert!(err.to_string().contains("duplicate institution"));
    }

    #[test]
    fn reserved_theme_name_is_rejected() {
        let mut cfg = mk();
        cfg.themes
            .insert("Other".to_string(), vec!["misc".to_string()]);
        let err = normalize_config(&mut cfg).unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn minimal_toml_gets_defaults() {
        let cfg = load_config_str(
            r#"
            [apps."Bank of Abyssinia"]
            app_id = "com.boa.boaMobileBanking"
        "#,
        )
        .unwrap();

        assert_eq!(cfg.load_batch_size, 500);
        assert_eq!(cfg.collect.timeout_ms, 30_000);
        assert_eq!(cfg.classify.truncate_bytes, 512);
        assert_eq!(cfg.apps["Bank of Abyssinia"].lang, "en");
        // Built-in theme groups apply when the file declares none.
        assert_eq!(cfg.themes.get_index(0).unwrap().0, "UI/UX");
        assert!(cfg.themes.contains_key("Support"));
        // "password" belongs to both Functionality and Security; a keyword
        // may appear in more than one group.
        assert!(cfg.themes["Functionality"].contains(&"password".to_string()));
        assert!(cfg.themes["Security"].contains(&"password".to_string()));
    }

    #[test]
    fn declaration_order_is_preserved() {
        let cfg = load_config_str(
            r#"
            [apps.A]
            app_id = "com.a"
            [themes]
            Zeta = ["z"]
            Alpha = ["a"]
        "#,
        )
        .unwrap();
        let order: Vec<&String> = cfg.themes.keys().collect();
        assert_eq!(order, ["Zeta", "Alpha"]);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn keywords_lowercased_and_unique(
            kws in proptest::collection::vec("[a-zA-Z ]{1,8}", 1..8),
        ) {
            let mut cfg = mk();
            cfg.themes.insert("Fuzz".to_string(), kws);

            if normalize_config(&mut cfg).is_ok() {
                let normed = &cfg.themes["Fuzz"];
                prop_assert!(normed.iter().all(|k| k.chars().all(|c| !c.is_uppercase())));
                let unique: HashSet<&String> = normed.iter().collect();
                prop_assert_eq!(unique.len(), normed.len());
            }
        }
    }
}
