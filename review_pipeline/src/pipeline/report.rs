//! Per-run accounting: stage outcomes, anomalies, and the final verdict.

use std::fmt;

/// Reasons recorded for a failed stage are bounded to this many characters.
const MAX_REASON_CHARS: usize = 200;

/// The pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Fetch raw reviews from the marketplace.
    Collect,
    /// Validate, de-duplicate, and normalize.
    Clean,
    /// Attach a sentiment label and score.
    ClassifySentiment,
    /// Attach a keyword-group theme.
    AssignTheme,
    /// Provision the store and bulk-load the enriched dataset.
    Persist,
    /// Render the summary report from the stored aggregates.
    Visualize,
}

impl Stage {
    /// Every stage, in execution order.
    pub const ALL: [Stage; 6] = [
        Stage::Collect,
        Stage::Clean,
        Stage::ClassifySentiment,
        Stage::AssignTheme,
        Stage::Persist,
        Stage::Visualize,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Collect => "collect",
            Stage::Clean => "clean",
            Stage::ClassifySentiment => "classify-sentiment",
            Stage::AssignTheme => "assign-theme",
            Stage::Persist => "persist",
            Stage::Visualize => "visualize",
        };
        f.write_str(s)
    }
}

/// How a stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    /// The stage ran to completion.
    Succeeded,
    /// The stage failed; the reason is bounded to 200 characters.
    Failed(String),
    /// The stage never ran because an upstream stage failed.
    Skipped,
}

/// One stage's recorded outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    /// Which stage this records.
    pub stage: Stage,
    /// How it ended.
    pub status: StageStatus,
    /// Short human-readable summary, e.g. row counts.
    pub detail: String,
}

/// A counted oddity that did not fail its stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anomaly {
    /// Stage that observed the anomaly.
    pub stage: Stage,
    /// What happened.
    pub description: String,
    /// How many records or events it covers.
    pub count: usize,
}

/// The run verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every stage succeeded. Anomalies may still be present.
    Success,
    /// At least one stage failed or was skipped.
    Partial,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => f.write_str("SUCCESS"),
            RunStatus::Partial => f.write_str("PARTIAL"),
        }
    }
}

/// Accumulated accounting for one pipeline run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Stage outcomes in execution order.
    pub stages: Vec<StageOutcome>,
    /// All anomalies observed, in the order recorded.
    pub anomalies: Vec<Anomaly>,
}

impl RunReport {
    /// Records a completed stage with a short detail line.
    pub fn record_success(&mut self, stage: Stage, detail: impl Into<String>) {
        self.stages.push(StageOutcome {
            stage,
            status: StageStatus::Succeeded,
            detail: detail.into(),
        });
    }

    /// Records a failed stage. The reason is truncated, never dropped.
    pub fn record_failure(&mut self, stage: Stage, reason: impl Into<String>) {
        let reason = truncate_reason(&reason.into());
        self.stages.push(StageOutcome {
            stage,
            status: StageStatus::Failed(reason),
            detail: String::new(),
        });
    }

    /// Records a stage that never ran because of an upstream failure.
    pub fn record_skipped(&mut self, stage: Stage) {
        self.stages.push(StageOutcome {
            stage,
            status: StageStatus::Skipped,
            detail: String::new(),
        });
    }

    /// Records a counted anomaly against a stage.
    pub fn add_anomaly(&mut self, stage: Stage, description: impl Into<String>, count: usize) {
        self.anomalies.push(Anomaly {
            stage,
            description: description.into(),
            count,
        });
    }

    /// The verdict: `SUCCESS` only when every stage succeeded.
    pub fn status(&self) -> RunStatus {
        let all_ok = self
            .stages
            .iter()
            .all(|s| s.status == StageStatus::Succeeded);
        if all_ok {
            RunStatus::Success
        } else {
            RunStatus::Partial
        }
    }
}

fn truncate_reason(reason: &str) -> String {
    if reason.chars().count() <= MAX_REASON_CHARS {
        return reason.to_string();
    }
    let cut: String = reason.chars().take(MAX_REASON_CHARS).collect();
    format!("{cut}...")
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = format!("Pipeline Run: {}", self.status());
        writeln!(f, "{title}")?;
        for _ in 0..title.len() {
            write!(f, "-")?;
        }
        writeln!(f)?;

        for s in &self.stages {
            match &s.status {
                StageStatus::Succeeded => {
                    if s.detail.is_empty() {
                        writeln!(f, "+ {}: ok", s.stage)?;
                    } else {
                        writeln!(f, "+ {}: ok ({})", s.stage, s.detail)?;
                    }
                }
                StageStatus::Failed(reason) => writeln!(f, "! {}: FAILED: {reason}", s.stage)?,
                StageStatus::Skipped => writeln!(f, "- {}: skipped", s.stage)?,
            }
        }

        if !self.anomalies.is_empty() {
            writeln!(f)?;
            let header = format!("Anomalies ({})", self.anomalies.len());
            writeln!(f, "{header}")?;
            for _ in 0..header.len() {
                write!(f, "-")?;
            }
            writeln!(f)?;
            for a in &self.anomalies {
                writeln!(f, "~ [{}] {} ({} records)", a.stage, a.description, a.count)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_stages_succeeded_is_success() {
        let mut report = RunReport::default();
        for stage in Stage::ALL {
            report.record_success(stage, "");
        }
        assert_eq!(report.status(), RunStatus::Success);
    }

    #[test]
    fn anomalies_alone_do_not_demote_the_verdict() {
        let mut report = RunReport::default();
        for stage in Stage::ALL {
            report.record_success(stage, "");
        }
        report.add_anomaly(Stage::Clean, "duplicate review ids dropped", 3);
        assert_eq!(report.status(), RunStatus::Success);
    }

    #[test]
    fn any_failed_or_skipped_stage_is_partial() {
        let mut report = RunReport::default();
        report.record_failure(Stage::Collect, "no reviews collected");
        for stage in &Stage::ALL[1..] {
            report.record_skipped(*stage);
        }
        assert_eq!(report.status(), RunStatus::Partial);
    }

    #[test]
    fn failure_reasons_are_bounded() {
        let mut report = RunReport::default();
        report.record_failure(Stage::Persist, "x".repeat(1_000));
        let StageStatus::Failed(reason) = &report.stages[0].status else {
            panic!("expected a failure");
        };
        assert_eq!(reason.chars().count(), 203);
        assert!(reason.ends_with("..."));
    }

    #[test]
    fn display_renders_stage_lines_and_anomalies() {
        let mut report = RunReport::default();
        report.record_success(Stage::Collect, "412 reviews");
        report.record_failure(Stage::Persist, "disk full");
        report.record_skipped(Stage::Visualize);
        report.add_anomaly(Stage::Collect, "listing 'Bank B' timed out", 1);

        let rendered = report.to_string();
        assert!(rendered.starts_with("Pipeline Run: PARTIAL"));
        assert!(rendered.contains("+ collect: ok (412 reviews)"));
        assert!(rendered.contains("! persist: FAILED: disk full"));
        assert!(rendered.contains("- visualize: skipped"));
        assert!(rendered.contains("~ [collect] listing 'Bank B' timed out (1 records)"));
    }
}
