// ============================================================
// Layer 6 — Report Store
// ============================================================
// Saves and restores evaluation results as JSON.
//
// What gets saved per ranking run:
//   1. {task}_{mode}[_{tag}].json         — the EvaluationReport
//                                           (per-fold scores + mean)
//   2. {task}_{mode}[_{tag}].config.json  — the RankConfig that
//                                           produced it
//
// The significance command reads two reports back and compares
// their per-fold scores, so a report is the unit of comparison
// between runs (e.g. URIEL distances vs. URIEL+ distances):
//
//   reports/
//     dep_all.json
//     dep_all.config.json
//     dep_all_urielplus.json
//     ...
//     folds.csv            ← see metrics.rs

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::rank_use_case::RankConfig;
use crate::domain::task::{FeatureMode, Task};
use crate::ml::evaluator::EvaluationReport;

/// Reads and writes report files under one directory.
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    /// Create the store, creating its directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create report directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `dep_all`, `mt_lang_urielplus`, ...
    pub fn stem(task: Task, mode: FeatureMode, tag: Option<&str>) -> String {
        match tag {
            Some(tag) if !tag.is_empty() => format!("{}_{}_{tag}", task.name(), mode.name()),
            _ => format!("{}_{}", task.name(), mode.name()),
        }
    }

    /// Write `report` to `{stem}.json` and return the path.
    pub fn save_report(&self, report: &EvaluationReport, tag: Option<&str>) -> Result<PathBuf> {
        let path = self
            .dir
            .join(format!("{}.json", Self::stem(report.task, report.mode, tag)));
        let json = serde_json::to_string_pretty(report)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write report to '{}'", path.display()))?;

        tracing::debug!("Saved report to '{}'", path.display());
        Ok(path)
    }

    /// Save the configuration a run used next to its report.
    pub fn save_config(&self, cfg: &RankConfig) -> Result<PathBuf> {
        let stem = Self::stem(cfg.task, cfg.mode, cfg.tag.as_deref());
        let path = self.dir.join(format!("{stem}.config.json"));
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved rank config to '{}'", path.display());
        Ok(path)
    }
}

/// Read a report written by [`ReportStore::save_report`].
pub fn load_report(path: impl AsRef<Path>) -> Result<EvaluationReport> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).with_context(|| {
        format!(
            "Cannot read report '{}'. Run 'rank' first to produce it.",
            path.display()
        )
    })?;

    serde_json::from_str(&json)
        .with_context(|| format!("'{}' is not an evaluation report", path.display()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::evaluator::FoldScore;

    fn report() -> EvaluationReport {
        EvaluationReport::new(
            Task::Mt,
            FeatureMode::Lang,
            3,
            vec![
                FoldScore { group: "deu".into(), n_train: 40, n_test: 5, ndcg: 0.75 },
                FoldScore { group: "fra".into(), n_train: 40, n_test: 5, ndcg: 0.25 },
            ],
        )
    }

    #[test]
    fn test_stem() {
        assert_eq!(ReportStore::stem(Task::Dep, FeatureMode::All, None), "dep_all");
        assert_eq!(ReportStore::stem(Task::Dep, FeatureMode::All, Some("")), "dep_all");
        assert_eq!(
            ReportStore::stem(Task::Mt, FeatureMode::Lang, Some("urielplus")),
            "mt_lang_urielplus"
        );
    }

    #[test]
    fn test_report_survives_save_and_load() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path().join("reports")).unwrap();

        let path = store.save_report(&report(), Some("v2")).unwrap();
        assert!(path.ends_with("mt_lang_v2.json"));
        assert_eq!(load_report(&path).unwrap(), report());
    }

    #[test]
    fn test_config_is_written_next_to_report() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path()).unwrap();
        let cfg   = RankConfig { task: Task::Dep, mode: FeatureMode::All, ..RankConfig::default() };

        let path = store.save_config(&cfg).unwrap();
        assert!(path.ends_with("dep_all.config.json"));

        let back: RankConfig = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_missing_or_malformed_report() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_report(dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("Run 'rank' first"));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{\"task\": \"dep\"}").unwrap();
        assert!(load_report(&bad).is_err());
    }
}
