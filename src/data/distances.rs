// ============================================================
// Layer 4 — Distance Table Builder
// ============================================================
// Turns a task's experiment table into a distance table:
//
//   Target lang,Transfer lang,...        Target lang,Transfer lang,GENETIC,...,GEOGRAPHIC
//   en,fr,...                      ──▶   en,fr,0.8,0.41,0.37,0.52,0.29,0.05
//
// For every row, in input order:
//   1. read the two language codes
//   2. normalise them (2-letter → ISO 639-3 → glottocode)
//   3. ask the engine for all six distances at once
//   4. print the six values (4 decimals) and append the row
//
// The output keeps the ORIGINAL codes in the two key columns so
// the Dataset Merger can join back onto the experiment table.
// No sorting, no de-duplication: row i of the output belongs to
// row i of the input.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::table::Table;
use crate::domain::distance::{DistanceKind, DistanceVector};
use crate::domain::language::{CodeNormalizer, LanguagePair};
use crate::domain::task::Task;
use crate::domain::traits::DistanceEngine;

/// What to do when the engine cannot resolve a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPairPolicy {
    /// Abort the whole table with the offending pair in the error.
    #[default]
    Fail,
    /// Leave the six cells empty, log a warning and keep going.
    Null,
}

/// A built distance table plus how many rows had to be null-filled.
#[derive(Debug, Clone)]
pub struct DistanceTable {
    pub table:       Table,
    pub null_filled: usize,
}

pub struct DistanceTableBuilder<'a, E: DistanceEngine + ?Sized> {
    engine:     &'a E,
    normalizer: &'a CodeNormalizer,
    policy:     MissingPairPolicy,
}

impl<'a, E: DistanceEngine + ?Sized> DistanceTableBuilder<'a, E> {
    pub fn new(engine: &'a E, normalizer: &'a CodeNormalizer, policy: MissingPairPolicy) -> Self {
        Self { engine, normalizer, policy }
    }

    /// Build the distance table for one task's experiment table.
    pub fn build(&self, input: &Table, task: Task) -> Result<DistanceTable> {
        let (first_col, second_col) = task.pair_columns();
        let firsts  = input.column(first_col)?;
        let seconds = input.column(second_col)?;

        let mut headers = vec![first_col, second_col];
        headers.extend(DistanceKind::headers());
        let mut out = Table::new(headers);

        let two_letter  = task.uses_two_letter_codes();
        let mut nulled  = 0usize;

        for (i, (first, second)) in firsts.into_iter().zip(seconds).enumerate() {
            let original = LanguagePair::new(first, second);
            let mapped   = self.normalizer.normalize_pair(&original, two_letter);

            let resolved = self
                .engine
                .distances(&DistanceKind::ALL, &mapped)
                .and_then(|values| DistanceVector::from_values(&values));

            let mut row = vec![original.first.clone(), original.second.clone()];
            match (resolved, self.policy) {
                (Ok(vector), _) => {
                    println!("{}", vector.progress_line());
                    row.extend(vector.0.iter().map(|v| v.to_string()));
                }
                (Err(e), MissingPairPolicy::Fail) => {
                    return Err(e).with_context(|| {
                        format!(
                            "{task}: row {} {original} (queried as {mapped}) could not be resolved",
                            i + 1
                        )
                    });
                }
                (Err(e), MissingPairPolicy::Null) => {
                    tracing::warn!("{task}: row {} {original} null-filled: {e:#}", i + 1);
                    row.extend(std::iter::repeat(String::new()).take(DistanceKind::ALL.len()));
                    nulled += 1;
                }
            }
            out.push_row(row)?;
        }

        Ok(DistanceTable { table: out, null_filled: nulled })
    }
}
