// ============================================================
// Layer 6 — Fold Metrics Logger
// ============================================================
// Appends one CSV row per evaluated fold, across every ranking
// run, so all runs can be compared in one sheet.
//
// Output file: reports/folds.csv
//
// Example CSV output:
//   task,mode,tag,fold,group,n_train,n_test,ndcg
//   dep,all,,1,af,812,29,0.8123
//   dep,all,,2,ar,812,29,0.5
//   mt,lang,urielplus,1,ara,1840,45,0.6612
//   ...
//
// The header is written only when the file is created; later
// runs append below it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use crate::ml::evaluator::EvaluationReport;

/// One row of the fold log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldRecord {
    pub task:    String,
    pub mode:    String,
    /// Free-form run label, empty when not given
    pub tag:     String,
    /// 1-based fold number in evaluation order
    pub fold:    usize,
    pub group:   String,
    pub n_train: usize,
    pub n_test:  usize,
    pub ndcg:    f64,
}

impl FoldRecord {
    /// One record per fold of `report`.
    pub fn from_report(report: &EvaluationReport, tag: Option<&str>) -> Vec<Self> {
        report
            .folds
            .iter()
            .enumerate()
            .map(|(i, f)| Self {
                task:    report.task.name().to_string(),
                mode:    report.mode.name().to_string(),
                tag:     tag.unwrap_or_default().to_string(),
                fold:    i + 1,
                group:   f.group.clone(),
                n_train: f.n_train,
                n_test:  f.n_test,
                ndcg:    f.ndcg,
            })
            .collect()
    }
}

/// Appends fold records to `{dir}/folds.csv`.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the logger, writing the CSV header if the file is new.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("folds.csv");

        if !csv_path.exists() {
            let mut w = csv::Writer::from_path(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            w.write_record(["task", "mode", "tag", "fold", "group", "n_train", "n_test", "ndcg"])?;
            w.flush()?;
            tracing::debug!("Created fold log: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append every fold of `report`.
    pub fn log(&self, report: &EvaluationReport, tag: Option<&str>) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;
        let mut w = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        let records = FoldRecord::from_report(report, tag);
        for r in &records {
            w.serialize(r)?;
        }
        w.flush()?;

        tracing::debug!(
            "Logged {} folds of {} ({}) to '{}'",
            records.len(),
            report.task,
            report.mode.name(),
            self.csv_path.display()
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::Table;
    use crate::domain::task::{FeatureMode, Task};
    use crate::ml::evaluator::FoldScore;

    fn report(task: Task) -> EvaluationReport {
        EvaluationReport::new(
            task,
            FeatureMode::All,
            3,
            vec![
                FoldScore { group: "af".into(), n_train: 58, n_test: 29, ndcg: 0.8123 },
                FoldScore { group: "ar".into(), n_train: 58, n_test: 29, ndcg: 0.5 },
            ],
        )
    }

    #[test]
    fn test_records_are_numbered_from_one() {
        let records = FoldRecord::from_report(&report(Task::Dep), None);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fold, 1);
        assert_eq!(records[1].group, "ar");
        assert_eq!(records[1].tag, "");
    }

    #[test]
    fn test_runs_append_below_a_single_header() {
        let dir = tempfile::tempdir().unwrap();

        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&report(Task::Dep), None).unwrap();
        // a second logger on the same directory must not rewrite the header
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&report(Task::Mt), Some("plus")).unwrap();

        let table = Table::read_csv(logger.csv_path()).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.column("task").unwrap(), vec!["dep", "dep", "mt", "mt"]);
        assert_eq!(table.column("tag").unwrap(), vec!["", "", "plus", "plus"]);
        assert_eq!(table.column("ndcg").unwrap()[0], "0.8123");
    }

    #[test]
    fn test_logged_rows_read_back_as_records() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&report(Task::Mt), Some("plus")).unwrap();

        let rows: Vec<FoldRecord> = csv::Reader::from_path(logger.csv_path())
            .unwrap()
            .deserialize()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows, FoldRecord::from_report(&report(Task::Mt), Some("plus")));
    }
}
