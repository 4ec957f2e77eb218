// ============================================================
// Layer 2 — SignificanceUseCase
// ============================================================
// Compares two paired score sets with the Wilcoxon signed-rank
// test. Each side comes either inline from the command line or
// from an evaluation report written by `rank`.
//
// When both sides are reports their folds must line up: same
// held-out languages in the same order, otherwise the pairing
// would be meaningless.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::infra::report_store::load_report;
use crate::ml::evaluator::EvaluationReport;
use crate::ml::significance::{wilcoxon_signed_rank, WilcoxonResult};

/// Where one side of the comparison comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    Inline(Vec<f64>),
    /// Path to an EvaluationReport JSON
    Report(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificanceConfig {
    pub baseline:  ScoreSource,
    pub candidate: ScoreSource,
}

pub struct SignificanceUseCase {
    config: SignificanceConfig,
}

impl SignificanceUseCase {
    pub fn new(config: SignificanceConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<WilcoxonResult> {
        let baseline  = resolve(&self.config.baseline)?;
        let candidate = resolve(&self.config.candidate)?;

        if let (Some(a), Some(b)) = (&baseline.report, &candidate.report) {
            ensure_same_folds(a, b)?;
        }

        tracing::info!(
            "Comparing {} baseline scores with {} candidate scores",
            baseline.scores.len(),
            candidate.scores.len()
        );
        let result = wilcoxon_signed_rank(&baseline.scores, &candidate.scores)?;
        tracing::debug!("{} non-zero differences, {:?} p-value", result.n, result.method);
        Ok(result)
    }
}

struct Resolved {
    scores: Vec<f64>,
    report: Option<EvaluationReport>,
}

fn resolve(source: &ScoreSource) -> Result<Resolved> {
    match source {
        ScoreSource::Inline(scores) => Ok(Resolved { scores: scores.clone(), report: None }),
        ScoreSource::Report(path) => {
            let report = load_report(path)?;
            Ok(Resolved { scores: report.scores(), report: Some(report) })
        }
    }
}

fn ensure_same_folds(a: &EvaluationReport, b: &EvaluationReport) -> Result<()> {
    let groups_a: Vec<&str> = a.folds.iter().map(|f| f.group.as_str()).collect();
    let groups_b: Vec<&str> = b.folds.iter().map(|f| f.group.as_str()).collect();
    ensure!(
        groups_a == groups_b,
        "Reports are not paired: {} ({}) has folds {:?}, {} ({}) has {:?}",
        a.task,
        a.mode.name(),
        groups_a,
        b.task,
        b.mode.name(),
        groups_b
    );
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::{FeatureMode, Task};
    use crate::infra::report_store::ReportStore;
    use crate::ml::evaluator::FoldScore;
    use crate::ml::significance::PValueMethod;

    fn report(groups: &[&str], scores: &[f64]) -> EvaluationReport {
        EvaluationReport::new(
            Task::Dep,
            FeatureMode::All,
            3,
            groups
                .iter()
                .zip(scores)
                .map(|(g, &ndcg)| FoldScore { group: g.to_string(), n_train: 10, n_test: 5, ndcg })
                .collect(),
        )
    }

    #[test]
    fn test_inline_scores() {
        let result = SignificanceUseCase::new(SignificanceConfig {
            baseline:  ScoreSource::Inline(vec![0.5, 0.5, 0.5, 0.5, 0.5]),
            candidate: ScoreSource::Inline(vec![0.6, 0.7, 0.8, 0.9, 1.0]),
        })
        .execute()
        .unwrap();
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.method, PValueMethod::Exact);
        assert!((result.p_value - 2.0 / 32.0).abs() < 1e-12);
    }

    #[test]
    fn test_reports_are_paired_by_fold() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path()).unwrap();
        let a = store.save_report(&report(&["af", "ar", "bg"], &[0.5, 0.25, 0.75]), Some("a")).unwrap();
        let b = store.save_report(&report(&["af", "ar", "bg"], &[0.75, 0.5, 0.5]), Some("b")).unwrap();
        let c = store.save_report(&report(&["af", "bg", "ar"], &[0.75, 0.5, 0.5]), Some("c")).unwrap();

        let paired = SignificanceUseCase::new(SignificanceConfig {
            baseline:  ScoreSource::Report(a.display().to_string()),
            candidate: ScoreSource::Report(b.display().to_string()),
        })
        .execute()
        .unwrap();
        assert_eq!(paired.n, 3);

        let err = SignificanceUseCase::new(SignificanceConfig {
            baseline:  ScoreSource::Report(a.display().to_string()),
            candidate: ScoreSource::Report(c.display().to_string()),
        })
        .execute()
        .unwrap_err();
        assert!(err.to_string().contains("not paired"));
    }

    #[test]
    fn test_mixed_sources_must_have_equal_length() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path()).unwrap();
        let a = store.save_report(&report(&["af", "ar"], &[0.5, 0.25]), None).unwrap();

        let result = SignificanceUseCase::new(SignificanceConfig {
            baseline:  ScoreSource::Report(a.display().to_string()),
            candidate: ScoreSource::Inline(vec![0.1, 0.2, 0.3]),
        })
        .execute();
        assert!(result.is_err());
    }
}
