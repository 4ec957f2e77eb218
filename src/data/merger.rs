// ============================================================
// Layer 4 — Dataset Merger
// ============================================================
// Splices freshly computed distances into an experiment table.
//
// Rows are matched by KEY (the task's two language columns),
// never by position. Before anything is written we check both
// directions:
//   - every key in the distance table exists in the experiment table
//   - every key in the experiment table exists in the distance table
// A mismatch is a hard error that lists the first offending keys,
// so a stale or reordered distance file can never slip through.
//
// Only the six distance columns change. Every other cell, the
// column order and the row order of the experiment table are
// kept as they were.

use anyhow::{bail, Result};
use std::collections::{BTreeSet, HashMap};

use crate::data::table::Table;
use crate::domain::distance::DistanceKind;
use crate::domain::language::LanguagePair;
use crate::domain::task::Task;

/// How many missing keys to show in an error message.
const MAX_REPORTED_KEYS: usize = 5;

/// Overwrite (or append) the six distance columns of `experiments`
/// with the values from `distances`, joined on the task's pair columns.
pub fn merge_distances(experiments: &Table, distances: &Table, task: Task) -> Result<Table> {
    let (first_col, second_col) = task.pair_columns();
    let headers = DistanceKind::headers();

    // ── Index the distance table by key ──────────────────────────────────────
    let keys = pair_keys(distances, first_col, second_col)?;
    let cols = headers
        .iter()
        .map(|h| distances.column_index(h))
        .collect::<Result<Vec<_>>>()?;

    let mut by_key: HashMap<LanguagePair, Vec<String>> = HashMap::with_capacity(keys.len());
    for (key, row) in keys.into_iter().zip(distances.rows()) {
        let values: Vec<String> = cols.iter().map(|&c| row[c].clone()).collect();
        if let Some(existing) = by_key.get(&key) {
            if *existing != values {
                bail!("{task}: distance table has conflicting values for {key}");
            }
            continue;
        }
        by_key.insert(key, values);
    }

    // ── Both-way key check ───────────────────────────────────────────────────
    let exp_keys = pair_keys(experiments, first_col, second_col)?;
    let exp_set: BTreeSet<&LanguagePair> = exp_keys.iter().collect();

    let missing_in_distances: BTreeSet<&LanguagePair> =
        exp_set.iter().copied().filter(|k| !by_key.contains_key(*k)).collect();
    let mut missing_in_experiments: Vec<&LanguagePair> =
        by_key.keys().filter(|k| !exp_set.contains(k)).collect();
    missing_in_experiments.sort();

    if !missing_in_distances.is_empty() {
        bail!(
            "{task}: {} experiment key(s) have no distances, e.g. {}",
            missing_in_distances.len(),
            preview(missing_in_distances.into_iter())
        );
    }
    if !missing_in_experiments.is_empty() {
        bail!(
            "{task}: {} distance key(s) do not appear in the experiment table, e.g. {}",
            missing_in_experiments.len(),
            preview(missing_in_experiments.into_iter())
        );
    }

    // ── Overwrite the six columns ────────────────────────────────────────────
    let mut merged = experiments.clone();
    for (i, header) in headers.iter().enumerate() {
        let column: Vec<String> = exp_keys.iter().map(|k| by_key[k][i].clone()).collect();
        merged.set_column(header, column)?;
    }

    tracing::info!("{task}: merged distances into {} rows", merged.len());
    Ok(merged)
}

fn pair_keys(table: &Table, first_col: &str, second_col: &str) -> Result<Vec<LanguagePair>> {
    let firsts  = table.column(first_col)?;
    let seconds = table.column(second_col)?;
    Ok(firsts
        .into_iter()
        .zip(seconds)
        .map(|(a, b)| LanguagePair::new(a, b))
        .collect())
}

fn preview<'a>(keys: impl Iterator<Item = &'a LanguagePair>) -> String {
    keys.take(MAX_REPORTED_KEYS)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> String {
        v.to_string()
    }

    fn experiments() -> Table {
        let mut headers = vec!["Target lang", "Transfer lang", "Accuracy"];
        headers.extend(DistanceKind::headers());
        Table::from_rows(
            headers,
            vec![
                vec![s("en"), s("fr"), s("71.2"), s("1"), s("1"), s("1"), s("1"), s("1"), s("1")],
                vec![s("fr"), s("en"), s("64.0"), s("1"), s("1"), s("1"), s("1"), s("1"), s("1")],
            ],
        )
        .unwrap()
    }

    fn distances(pairs: &[(&str, &str, &str)]) -> Table {
        let mut headers = vec!["Target lang", "Transfer lang"];
        headers.extend(DistanceKind::headers());
        let rows = pairs
            .iter()
            .map(|(a, b, v)| {
                let mut row = vec![s(a), s(b)];
                row.extend(std::iter::repeat(s(v)).take(6));
                row
            })
            .collect();
        Table::from_rows(headers, rows).unwrap()
    }

    #[test]
    fn test_joins_by_key_not_position() {
        // distance table is in the opposite order
        let d      = distances(&[("fr", "en", "0.2"), ("en", "fr", "0.1")]);
        let merged = merge_distances(&experiments(), &d, Task::Dep).unwrap();

        assert_eq!(merged.column("GENETIC").unwrap(), vec!["0.1", "0.2"]);
        assert_eq!(merged.column("GEOGRAPHIC").unwrap(), vec!["0.1", "0.2"]);
        // untouched columns stay put
        assert_eq!(merged.column("Accuracy").unwrap(), vec!["71.2", "64.0"]);
        assert_eq!(merged.headers(), experiments().headers());
    }

    #[test]
    fn test_missing_experiment_key_fails() {
        let d   = distances(&[("en", "fr", "0.1")]);
        let err = merge_distances(&experiments(), &d, Task::Dep).unwrap_err().to_string();
        assert!(err.contains("(fr, en)"), "{err}");
    }

    #[test]
    fn test_extra_distance_key_fails() {
        let d = distances(&[("en", "fr", "0.1"), ("fr", "en", "0.2"), ("de", "en", "0.3")]);
        let err = merge_distances(&experiments(), &d, Task::Dep).unwrap_err().to_string();
        assert!(err.contains("(de, en)"), "{err}");
    }

    #[test]
    fn test_conflicting_duplicate_fails() {
        let d = distances(&[("en", "fr", "0.1"), ("fr", "en", "0.2"), ("en", "fr", "0.9")]);
        assert!(merge_distances(&experiments(), &d, Task::Dep).is_err());
    }

    #[test]
    fn test_appends_distance_columns_when_absent() {
        let exp = Table::from_rows(
            ["Source lang", "Transfer lang", "BLEU"],
            vec![vec![s("aze"), s("tur"), s("8.1")]],
        )
        .unwrap();
        let mut headers = vec!["Source lang", "Transfer lang"];
        headers.extend(DistanceKind::headers());
        let mut row = vec![s("aze"), s("tur")];
        row.extend(std::iter::repeat(s("0.3")).take(6));
        let d = Table::from_rows(headers, vec![row]).unwrap();

        let merged = merge_distances(&exp, &d, Task::Mt).unwrap();
        assert_eq!(merged.headers().len(), 9);
        assert_eq!(merged.numeric_column("INVENTORY").unwrap(), vec![0.3]);
    }
}
