// ============================================================
// Layer 4 — Relevance Labeler
// ============================================================
// Converts a raw task metric (accuracy, BLEU) into a graded
// relevance label between 0 and 10.
//
// Within each group (all rows sharing the same target/source
// language) the metric is ranked in DESCENDING order:
//
//   metric   0.9  0.7  0.7  0.5
//   dense     1    2    2    3
//   min       1    2    2    4
//
//   label = 11 - rank   if rank <= 10
//         = 0           otherwise
//
// So at most ten distinct ranks get a nonzero label and the best
// candidate(s) always get 10. Missing metrics (NaN) are unranked
// and keep label 0.

use anyhow::Result;
use std::collections::HashMap;

use crate::data::table::Table;
use crate::domain::task::TieBreak;

/// Labels strictly above this rank stay at 0.
pub const TOP_RANKS: usize = 10;

/// Relevance label for every row of `table`, in row order.
pub fn assign_relevance(
    table:         &Table,
    group_column:  &str,
    metric_column: &str,
    tie_break:     TieBreak,
) -> Result<Vec<u8>> {
    let groups  = table.column(group_column)?;
    let metrics = table.numeric_column(metric_column)?;

    // Row indices per group, in first-seen order
    let mut members: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, g) in groups.iter().enumerate() {
        members.entry(*g).or_default().push(i);
    }

    let mut labels = vec![0u8; table.len()];
    for rows in members.values() {
        let values: Vec<f64> = rows.iter().map(|&i| metrics[i]).collect();
        for (&row, rank) in rows.iter().zip(rank_descending(&values, tie_break)) {
            if let Some(rank) = rank.filter(|r| *r <= TOP_RANKS) {
                labels[row] = (TOP_RANKS + 1 - rank) as u8;
            }
        }
    }

    tracing::debug!(
        "Labelled {} rows in {} groups ({:?} ties)",
        labels.len(),
        members.len(),
        tie_break
    );
    Ok(labels)
}

/// Descending 1-based ranks; `None` for NaN values.
pub fn rank_descending(values: &[f64], tie_break: TieBreak) -> Vec<Option<usize>> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let mut unique = sorted.clone();
    unique.dedup();

    // Min counts every strictly better row, dense only every strictly better value
    let ladder = match tie_break {
        TieBreak::Min   => &sorted,
        TieBreak::Dense => &unique,
    };

    values
        .iter()
        .map(|&v| {
            if v.is_nan() {
                return None;
            }
            Some(1 + ladder.iter().take_while(|&&d| d > v).count())
        })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(&str, &str)]) -> Table {
        Table::from_rows(
            ["Target lang", "Accuracy"],
            rows.iter().map(|(g, m)| vec![g.to_string(), m.to_string()]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_two_row_group() {
        let t      = table(&[("en", "0.9"), ("en", "0.5")]);
        let labels = assign_relevance(&t, "Target lang", "Accuracy", TieBreak::Dense).unwrap();
        assert_eq!(labels, vec![10, 9]);
    }

    #[test]
    fn test_dense_vs_min_ties() {
        let values = [0.9, 0.7, 0.7, 0.5];
        assert_eq!(
            rank_descending(&values, TieBreak::Dense),
            vec![Some(1), Some(2), Some(2), Some(3)]
        );
        assert_eq!(
            rank_descending(&values, TieBreak::Min),
            vec![Some(1), Some(2), Some(2), Some(4)]
        );
    }

    #[test]
    fn test_groups_are_ranked_independently() {
        let t = table(&[("en", "10"), ("fr", "1"), ("en", "20"), ("fr", "2")]);
        let labels = assign_relevance(&t, "Target lang", "Accuracy", TieBreak::Min).unwrap();
        assert_eq!(labels, vec![9, 9, 10, 10]);
    }

    #[test]
    fn test_at_most_ten_nonzero_labels_per_group() {
        let rows: Vec<(String, String)> =
            (0..25).map(|i| ("en".to_string(), i.to_string())).collect();
        let refs: Vec<(&str, &str)> = rows.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
        let t = table(&refs);

        for tie in [TieBreak::Dense, TieBreak::Min] {
            let labels = assign_relevance(&t, "Target lang", "Accuracy", tie).unwrap();
            assert_eq!(labels.iter().filter(|&&l| l > 0).count(), 10);
            assert_eq!(*labels.iter().max().unwrap(), 10);
            // highest metric (24) gets 10, the 10th best (15) gets 1, 14 gets 0
            assert_eq!(labels[24], 10);
            assert_eq!(labels[15], 1);
            assert_eq!(labels[14], 0);
        }
    }

    #[test]
    fn test_dense_ties_can_label_more_than_ten_rows() {
        // eleven rows tied for first + more below: dense rank keeps the tie at 1
        let mut rows = vec![("en", "5"); 11];
        rows.push(("en", "4"));
        let t = table(&rows);

        let dense = assign_relevance(&t, "Target lang", "Accuracy", TieBreak::Dense).unwrap();
        assert_eq!(dense[..11], [10u8; 11]);
        assert_eq!(dense[11], 9);

        // min rank pushes the twelfth row to rank 12 → label 0
        let min = assign_relevance(&t, "Target lang", "Accuracy", TieBreak::Min).unwrap();
        assert_eq!(min[11], 0);
    }

    #[test]
    fn test_label_decreases_with_rank() {
        let t = table(&[("en", "3"), ("en", "1"), ("en", "2")]);
        let labels = assign_relevance(&t, "Target lang", "Accuracy", TieBreak::Dense).unwrap();
        assert!(labels[0] > labels[2] && labels[2] > labels[1]);
    }

    #[test]
    fn test_nan_metric_keeps_zero() {
        let t = table(&[("en", "NaN"), ("en", "0.4")]);
        let labels = assign_relevance(&t, "Target lang", "Accuracy", TieBreak::Min).unwrap();
        assert_eq!(labels, vec![0, 10]);
    }
}
