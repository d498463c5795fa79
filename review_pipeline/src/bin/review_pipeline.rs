use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use shared_utils::env::env_var_or;
use tracing_subscriber::EnvFilter;

use review_pipeline::{
    config::{self, PipelineConfig},
    db::{connection::connect_sqlite, provision::provision},
    pipeline::{Pipeline, RunStatus},
    records::EnrichedReview,
    sentiment::{SentimentAnalyzer, lexicon::LexiconModel},
    snapshot::{FINAL_SNAPSHOT, load_snapshot},
    verify,
};

#[derive(Parser)]
#[command(version, about = "Banking-app review enrichment pipeline")]
struct Cli {
    /// Path to the pipeline TOML configuration. Defaults apply when omitted.
    #[arg(long, short, value_name = "FILE", global = true)]
    config: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run the full pipeline once: collect through visualize.
    Run,
    /// Provision (or re-provision) the store schema, wiping prior contents.
    Provision,
    /// Check the stored aggregates against an enriched snapshot.
    Verify {
        /// Snapshot file name under the data directory.
        #[arg(long, value_name = "FILE")]
        snapshot: Option<String>,
    },
    /// Parse and normalize the configuration, reporting what changed.
    CheckConfig,
}

fn load_config(path: Option<&str>) -> Result<PipelineConfig> {
    match path {
        Some(path) => config::load_config_path(path),
        // No file: built-in defaults, normalized the same way.
        None => config::load_config_str(""),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref())?;
    let database_url = env_var_or("DATABASE_URL", &cfg.database_url);

    match cli.cmd {
        Cmd::Run => {
            let provider = review_ingestor::providers::play_store::PlayStoreProvider::new()?;
            let analyzer = SentimentAnalyzer::new(Box::new(LexiconModel::new()), &cfg.classify);
            let pipeline = Pipeline::new(cfg, Box::new(provider), analyzer);

            let mut conn = connect_sqlite(&database_url)?;
            let report = pipeline.run(&mut conn).await;
            println!("{report}");

            if report.status() == RunStatus::Partial {
                bail!("pipeline run finished with status PARTIAL");
            }
        }
        Cmd::Provision => {
            let mut conn = connect_sqlite(&database_url)?;
            provision(&mut conn)?;
            println!("store provisioned at {database_url}");
        }
        Cmd::Verify { snapshot } => {
            let name = snapshot.as_deref().unwrap_or(FINAL_SNAPSHOT);
            let rows: Vec<EnrichedReview> = load_snapshot(&cfg.data_dir, name)?;

            let mut conn = connect_sqlite(&database_url)?;
            let report = verify::verify(&rows, &mut conn)?;
            println!("{report}");

            if !report.verified() {
                bail!("{} aggregate(s) diverged", report.mismatches.len());
            }
        }
        Cmd::CheckConfig => {
            let Some(path) = cli.config.as_deref() else {
                bail!("check-config needs --config <FILE>");
            };
            let text = std::fs::read_to_string(path)?;
            let mut cfg: PipelineConfig = toml::from_str(&text)?;
            let report = config::normalize_config(&mut cfg)?;
            println!(
                "config ok: {} apps, {} theme groups ({} keys trimmed, {} keywords deduped)",
                cfg.apps.len(),
                cfg.themes.len(),
                report.banks_renamed + report.themes_renamed,
                report.keywords_deduped
            );
        }
    }

    Ok(())
}
