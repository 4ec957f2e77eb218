// ============================================================
// Layer 4 — Leave-One-Group-Out Splitter
// ============================================================
// Builds the cross-validation folds for the Ranking Evaluator.
//
// One fold per distinct group value (one per language):
//   - test set:     every row whose group equals the held-out value
//   - training set: every other row
//
// With 29 target languages this yields exactly 29 folds, each
// trained on the rows of the other 28 languages. Nothing about a
// held-out language leaks into its own training set, which is
// what makes the score a measure of generalisation to unseen
// languages.
//
// Folds are produced in sorted group order so runs are
// reproducible and per-fold scores from two runs line up for the
// paired significance test. Row indices inside each set keep the
// table's original order.
//
// Reference: Rust Book §8 (Collections), §13 (Iterators)

use std::collections::BTreeMap;

/// Row indices for one leave-one-group-out fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    /// The held-out group value
    pub group: String,
    pub train: Vec<usize>,
    pub test:  Vec<usize>,
}

/// Split row indices into one fold per distinct group value.
pub fn leave_one_group_out<S: AsRef<str>>(groups: &[S]) -> Vec<Fold> {
    // BTreeMap keeps the group values sorted
    let mut members: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, g) in groups.iter().enumerate() {
        members.entry(g.as_ref()).or_default().push(i);
    }

    let folds: Vec<Fold> = members
        .iter()
        .map(|(group, test)| {
            let train = groups
                .iter()
                .enumerate()
                .filter(|(_, g)| g.as_ref() != *group)
                .map(|(i, _)| i)
                .collect();
            Fold {
                group: group.to_string(),
                train,
                test:  test.clone(),
            }
        })
        .collect();

    tracing::debug!("Leave-one-group-out: {} folds over {} rows", folds.len(), groups.len());
    folds
}
