// ============================================================
// Layer 2 — RankUseCase
// ============================================================
// Runs one ranking experiment end to end:
//
//   Step 1: Load csv_datasets/{task}.csv             (Layer 4 - data)
//   Step 2: Label relevance + pick feature columns   (Layer 4 - data)
//   Step 3: Leave-one-language-out LambdaMART        (Layer 5 - ml)
//   Step 4: Save report, config and fold log         (Layer 6 - infra)
//
// Printing the scores is left to the CLI layer.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{dataset::RankingDataset, loader::task_table_path, table::Table};
use crate::domain::task::{FeatureMode, Task};
use crate::infra::{metrics::MetricsLogger, report_store::ReportStore};
use crate::ml::{
    evaluator::{evaluate, EvaluationReport, NDCG_CUTOFF},
    lambdamart::{LambdaMart, LambdaMartConfig},
};

// ─── Rank Configuration ──────────────────────────────────────────────────────
// Saved next to the report so a run can be reproduced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankConfig {
    pub task:         Task,
    pub mode:         FeatureMode,
    pub datasets_dir: String,
    pub report_dir:   String,
    /// Optional run label, appended to the report file name
    pub tag:          Option<String>,
    pub ranker:       LambdaMartConfig,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            task:         Task::Dep,
            mode:         FeatureMode::All,
            datasets_dir: "csv_datasets".to_string(),
            report_dir:   "reports".to_string(),
            tag:          None,
            ranker:       LambdaMartConfig::for_task(Task::Dep),
        }
    }
}

pub struct RankUseCase {
    config: RankConfig,
}

impl RankUseCase {
    pub fn new(config: RankConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<EvaluationReport> {
        let cfg = &self.config;

        let preset = cfg.task.ranking().with_context(|| {
            format!("Task '{}' has no ranking experiment (use dep or mt)", cfg.task)
        })?;

        // ── Step 1: Load the merged dataset ──────────────────────────────────
        let path  = task_table_path(&cfg.datasets_dir, cfg.task);
        let table = Table::read_csv(&path)
            .with_context(|| format!("Cannot load {} dataset. Run 'merge' first.", cfg.task))?;
        tracing::info!("Loaded {} rows from '{}'", table.len(), path.display());

        // ── Step 2: Labels and features ──────────────────────────────────────
        let dataset = RankingDataset::from_table(&table, &preset, cfg.mode)?;
        ensure!(!dataset.is_empty(), "'{}' has no rows to rank", path.display());
        tracing::info!(
            "{} ({}): {} features, {} rows",
            cfg.task,
            cfg.mode.name(),
            dataset.feature_names.len(),
            dataset.len()
        );

        // ── Step 3: Leave-one-language-out evaluation ────────────────────────
        let mut ranker = LambdaMart::new(cfg.ranker.clone());
        let folds      = evaluate(&dataset, &mut ranker, NDCG_CUTOFF)?;
        let report     = EvaluationReport::new(cfg.task, cfg.mode, NDCG_CUTOFF, folds);
        tracing::info!("Evaluated {} folds", report.folds.len());

        // ── Step 4: Persist ──────────────────────────────────────────────────
        let store = ReportStore::new(&cfg.report_dir)?;
        let saved = store.save_report(&report, cfg.tag.as_deref())?;
        store.save_config(cfg)?;
        let logger = MetricsLogger::new(store.dir())?;
        logger.log(&report, cfg.tag.as_deref())?;
        tracing::info!(
            "Report saved to '{}', folds appended to '{}'",
            saved.display(),
            logger.csv_path().display()
        );

        Ok(report)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::distance::DistanceKind;
    use crate::infra::report_store::load_report;
    use std::{fs, path::Path};

    /// 4 source languages × 3 transfer languages, BLEU tracking GENETIC.
    fn write_mt_dataset(dir: &Path) {
        let langs = ["ara", "deu", "fra", "spa"];
        let mut csv = String::from("Source lang,Transfer lang,BLEU");
        for h in DistanceKind::headers() {
            csv.push(',');
            csv.push_str(h);
        }
        csv.push('\n');
        for s in langs {
            for (j, t) in langs.iter().enumerate().filter(|(_, t)| **t != s) {
                let bleu = 30 - 5 * j;
                csv.push_str(&format!("{s},{t},{bleu}"));
                for k in 0..6 {
                    csv.push_str(&format!(",{}", 0.1 * (j + k) as f64));
                }
                csv.push('\n');
            }
        }
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("mt.csv"), csv).unwrap();
    }

    fn config(root: &Path) -> RankConfig {
        RankConfig {
            task:         Task::Mt,
            mode:         FeatureMode::Lang,
            datasets_dir: root.join("datasets").display().to_string(),
            report_dir:   root.join("reports").display().to_string(),
            tag:          Some("test".to_string()),
            ranker:       LambdaMartConfig {
                n_estimators:     5,
                min_data_in_leaf: 1,
                ..LambdaMartConfig::for_task(Task::Mt)
            },
        }
    }

    #[test]
    fn test_runs_one_fold_per_source_language_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        write_mt_dataset(&dir.path().join("datasets"));

        let report = RankUseCase::new(config(dir.path())).execute().unwrap();
        let groups: Vec<&str> = report.folds.iter().map(|f| f.group.as_str()).collect();
        assert_eq!(groups, vec!["ara", "deu", "fra", "spa"]);
        assert!(report.folds.iter().all(|f| f.n_test == 3 && f.n_train == 9));
        assert!(report.mean >= 0.0 && report.mean <= 1.0 + 1e-9);

        let reports = dir.path().join("reports");
        let saved   = load_report(reports.join("mt_lang_test.json")).unwrap();
        assert_eq!(saved.folds.len(), 4);
        assert!((saved.mean - report.mean).abs() < 1e-12);
        assert!(reports.join("mt_lang_test.config.json").exists());
        assert!(reports.join("folds.csv").exists());
    }

    #[test]
    fn test_task_without_ranking_preset_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = RankUseCase::new(RankConfig { task: Task::Pos, ..config(dir.path()) })
            .execute()
            .unwrap_err();
        assert!(err.to_string().contains("no ranking experiment"));
    }

    #[test]
    fn test_header_only_dataset_is_rejected() {
        let dir      = tempfile::tempdir().unwrap();
        let datasets = dir.path().join("datasets");
        let mut csv  = String::from("Source lang,Transfer lang,BLEU");
        for h in DistanceKind::headers() {
            csv.push(',');
            csv.push_str(h);
        }
        csv.push('\n');
        fs::create_dir_all(&datasets).unwrap();
        fs::write(datasets.join("mt.csv"), csv).unwrap();

        let err = RankUseCase::new(config(dir.path())).execute().unwrap_err();
        assert!(err.to_string().contains("no rows to rank"));
    }

    #[test]
    fn test_all_mode_needs_engineered_columns() {
        let dir = tempfile::tempdir().unwrap();
        write_mt_dataset(&dir.path().join("datasets"));
        let result = RankUseCase::new(RankConfig { mode: FeatureMode::All, ..config(dir.path()) })
            .execute();
        assert!(result.is_err());
    }
}
