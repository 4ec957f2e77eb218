// ============================================================
// Layer 5 — Ranking Evaluator
// ============================================================
// Leave-one-language-out evaluation of a ranker.
//
// For every fold (one held-out target/source language):
//   1. fit the ranker on the other languages' rows, grouped into
//      query lists by the task's group layout
//   2. score the held-out rows
//   3. NDCG@3 between the predicted order and the true labels
//
// The ranker instance is reused across folds; every `fit`
// replaces the previous model, so no fold sees another fold's
// training state.
//
// Reference: Burges (2010) LambdaMART, Järvelin & Kekäläinen (2002) NDCG

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::dataset::RankingDataset;
use crate::data::splitter::leave_one_group_out;
use crate::domain::task::{FeatureMode, Task};
use crate::domain::traits::Ranker;
use crate::ml::ndcg::ndcg_at_k;

/// Cut-off used for every reported score.
pub const NDCG_CUTOFF: usize = 3;

/// One fold's outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldScore {
    /// Held-out language
    pub group:   String,
    pub n_train: usize,
    pub n_test:  usize,
    pub ndcg:    f64,
}

/// Everything one evaluation run produced, serialisable for later
/// significance testing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub task:  Task,
    pub mode:  FeatureMode,
    pub k:     usize,
    pub folds: Vec<FoldScore>,
    /// Arithmetic mean over folds (0.0 when there are none)
    pub mean:  f64,
}

impl EvaluationReport {
    pub fn new(task: Task, mode: FeatureMode, k: usize, folds: Vec<FoldScore>) -> Self {
        let mean = if folds.is_empty() {
            0.0
        } else {
            folds.iter().map(|f| f.ndcg).sum::<f64>() / folds.len() as f64
        };
        Self { task, mode, k, folds, mean }
    }

    /// Per-fold scores in fold order.
    pub fn scores(&self) -> Vec<f64> {
        self.folds.iter().map(|f| f.ndcg).collect()
    }

    /// `[0.8123, 0.5, ...]`: every score rounded to four decimals.
    pub fn rounded_scores_line(&self) -> String {
        let parts: Vec<String> = self
            .folds
            .iter()
            .map(|f| format!("{:?}", round_to(f.ndcg, 4)))
            .collect();
        format!("[{}]", parts.join(", "))
    }

    /// `Average NDCG@3: 57.3`, the mean as a percentage, one decimal.
    pub fn average_line(&self) -> String {
        format!("Average NDCG@{}: {:.1}", self.k, self.mean * 100.0)
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Run leave-one-group-out cross-validation over `dataset`.
pub fn evaluate<R: Ranker + ?Sized>(
    dataset: &RankingDataset,
    ranker:  &mut R,
    k:       usize,
) -> Result<Vec<FoldScore>> {
    let folds  = leave_one_group_out(&dataset.groups);
    let total  = folds.len();
    let mut scores = Vec::with_capacity(total);

    for (i, fold) in folds.into_iter().enumerate() {
        let train_x = dataset.features_at(&fold.train);
        let train_y = dataset.labels_at(&fold.train);
        let sizes   = dataset
            .group_sizes(&fold.train)
            .with_context(|| format!("Fold '{}': cannot build query lists", fold.group))?;

        ranker
            .fit(&train_x, &train_y, &sizes)
            .with_context(|| format!("Fold '{}': training failed", fold.group))?;

        let test_x = dataset.features_at(&fold.test);
        let test_y = dataset.labels_at(&fold.test);
        let pred   = ranker
            .predict(&test_x)
            .with_context(|| format!("Fold '{}': prediction failed", fold.group))?;
        let ndcg   = ndcg_at_k(&test_y, &pred, k)?;

        tracing::debug!(
            "Fold {:>2}/{} held out '{}': train={} test={} ndcg@{}={:.4}",
            i + 1,
            total,
            fold.group,
            fold.train.len(),
            fold.test.len(),
            k,
            ndcg
        );

        scores.push(FoldScore {
            group:   fold.group,
            n_train: fold.train.len(),
            n_test:  fold.test.len(),
            ndcg,
        });
    }

    Ok(scores)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::Table;
    use crate::domain::distance::DistanceKind;
    use crate::domain::task::{GroupLayout, RankingPreset, TieBreak};
    use crate::ml::lambdamart::{LambdaMart, LambdaMartConfig};

    /// Ranks rows by the first feature; records the list sizes it was given.
    struct FirstFeatureRanker {
        seen_sizes: Vec<Vec<usize>>,
    }

    impl Ranker for FirstFeatureRanker {
        fn fit(&mut self, _: &[Vec<f64>], _: &[f64], group_sizes: &[usize]) -> Result<()> {
            self.seen_sizes.push(group_sizes.to_vec());
            Ok(())
        }

        fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>> {
            Ok(features.iter().map(|r| r[0]).collect())
        }
    }

    /// `langs` targets × `langs - 1` transfers; accuracy and GENETIC
    /// both decrease with the transfer language's index.
    fn table(langs: usize) -> Table {
        let names: Vec<String> = (0..langs).map(|i| format!("l{i:02}")).collect();
        let mut headers = vec!["Target lang", "Transfer lang", "Accuracy"];
        headers.extend(DistanceKind::headers());

        let mut rows = Vec::new();
        for t in &names {
            for (j, s) in names.iter().enumerate().filter(|(_, s)| *s != t) {
                let mut row = vec![t.clone(), s.clone(), format!("{}", 100 - j)];
                row.push(format!("{}", 100 - j)); // GENETIC tracks accuracy
                row.extend((0..5).map(|k| format!("{}", (j * 7 + k) % 11)));
                rows.push(row);
            }
        }
        Table::from_rows(headers, rows).unwrap()
    }

    fn preset(layout: GroupLayout) -> RankingPreset {
        RankingPreset {
            group_column:  "Target lang",
            metric_column: "Accuracy",
            tie_break:     TieBreak::Dense,
            layout,
            engineered:    &[],
        }
    }

    #[test]
    fn test_one_score_per_language_and_perfect_ranker_scores_one() {
        let ds = RankingDataset::from_table(
            &table(30),
            &preset(GroupLayout::Uniform { size: 29 }),
            FeatureMode::Lang,
        )
        .unwrap();
        let mut ranker = FirstFeatureRanker { seen_sizes: Vec::new() };
        let folds = evaluate(&ds, &mut ranker, NDCG_CUTOFF).unwrap();

        assert_eq!(folds.len(), 30);
        for f in &folds {
            assert_eq!(f.n_test, 29);
            assert_eq!(f.n_train, 29 * 29);
            assert!((f.ndcg - 1.0).abs() < 1e-12);
        }
        // 29 training languages × 29 candidates each
        assert!(ranker.seen_sizes.iter().all(|s| *s == vec![29; 29]));
    }

    #[test]
    fn test_count_layout_passes_counts_per_transfer_language() {
        let ds = RankingDataset::from_table(
            &table(4),
            &preset(GroupLayout::CountsBy { column: "Transfer lang" }),
            FeatureMode::Lang,
        )
        .unwrap();
        let mut ranker = FirstFeatureRanker { seen_sizes: Vec::new() };
        evaluate(&ds, &mut ranker, NDCG_CUTOFF).unwrap();

        // holding out l00: l00 still appears 3 times as a transfer language,
        // l01..l03 twice each (they can't transfer to themselves or to l00's rows)
        assert_eq!(ranker.seen_sizes[0], vec![3, 2, 2, 2]);
        assert!(ranker.seen_sizes.iter().all(|s| s.iter().sum::<usize>() == 9));
    }

    #[test]
    fn test_uniform_layout_mismatch_is_reported() {
        let ds = RankingDataset::from_table(
            &table(5),
            &preset(GroupLayout::Uniform { size: 29 }),
            FeatureMode::Lang,
        )
        .unwrap();
        let mut ranker = FirstFeatureRanker { seen_sizes: Vec::new() };
        let err = evaluate(&ds, &mut ranker, NDCG_CUTOFF).unwrap_err();
        assert!(format!("{err:#}").contains("cannot build query lists"));
    }

    #[test]
    fn test_lambdamart_scores_are_bounded() {
        let ds = RankingDataset::from_table(
            &table(6),
            &preset(GroupLayout::Uniform { size: 5 }),
            FeatureMode::Lang,
        )
        .unwrap();
        let cfg = LambdaMartConfig { n_estimators: 10, ..LambdaMartConfig::for_task(Task::Dep) };
        let mut ranker = LambdaMart::new(cfg);
        let folds = evaluate(&ds, &mut ranker, NDCG_CUTOFF).unwrap();

        assert_eq!(folds.len(), 6);
        assert!(folds.iter().all(|f| (0.0..=1.0 + 1e-12).contains(&f.ndcg)));
    }

    #[test]
    fn test_report_formatting() {
        let folds: Vec<FoldScore> = [0.81234, 0.5, 0.66666]
            .iter()
            .enumerate()
            .map(|(i, &ndcg)| FoldScore { group: format!("g{i}"), n_train: 2, n_test: 1, ndcg })
            .collect();
        let report = EvaluationReport::new(Task::Dep, FeatureMode::All, 3, folds.clone());
        assert_eq!(report.rounded_scores_line(), "[0.8123, 0.5, 0.6667]");
        assert_eq!(report.average_line(), "Average NDCG@3: 66.0");
        assert_eq!(report.scores().len(), 3);

        let single = EvaluationReport::new(Task::Dep, FeatureMode::All, 3, folds[1..2].to_vec());
        assert_eq!(single.rounded_scores_line(), "[0.5]");
        assert_eq!(single.average_line(), "Average NDCG@3: 50.0");

        let empty = EvaluationReport::new(Task::Mt, FeatureMode::Lang, 3, Vec::new());
        assert_eq!(empty.rounded_scores_line(), "[]");
        assert_eq!(empty.mean, 0.0);
    }
}
