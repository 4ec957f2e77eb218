// ============================================================
// Layer 3 — Task Presets
// ============================================================
// Every experiment table belongs to one of four tasks. The task
// decides:
//   - which two columns hold the language pair
//   - whether those columns use 2-letter codes
//   - for the two ranked tasks (dep, mt): how relevance labels
//     are derived, how training rows are grouped for the
//     ranker, and which engineered features exist
//
// The dep and mt presets disagree on tie-breaking (dense vs.
// min ranking). That difference is inherited from the
// published experiments and kept as an explicit parameter so
// results stay reproducible; it is very likely accidental.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::domain::distance::DistanceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    /// Dependency parsing
    Dep,
    /// Entity linking
    El,
    /// Machine translation
    Mt,
    /// Part-of-speech tagging
    Pos,
}

impl Task {
    pub const ALL: [Task; 4] = [Task::Dep, Task::El, Task::Mt, Task::Pos];

    pub fn name(self) -> &'static str {
        match self {
            Task::Dep => "dep",
            Task::El  => "el",
            Task::Mt  => "mt",
            Task::Pos => "pos",
        }
    }

    /// The (target/source/task, transfer/aux) language columns.
    pub fn pair_columns(self) -> (&'static str, &'static str) {
        match self {
            Task::Dep | Task::El => ("Target lang", "Transfer lang"),
            Task::Mt             => ("Source lang", "Transfer lang"),
            Task::Pos            => ("Task lang", "Aux lang"),
        }
    }

    /// dep and pos tables use 2-letter codes; el and mt are already ISO 639-3.
    pub fn uses_two_letter_codes(self) -> bool {
        matches!(self, Task::Dep | Task::Pos)
    }

    /// Ranking preset for tasks with a ranking experiment.
    pub fn ranking(self) -> Option<RankingPreset> {
        match self {
            Task::Dep => Some(RankingPreset {
                group_column:  "Target lang",
                metric_column: "Accuracy",
                tie_break:     TieBreak::Dense,
                layout:        GroupLayout::Uniform { size: 29 },
                engineered:    &[
                    "Word overlap",
                    "Transfer lang dataset size",
                    "Target lang dataset size",
                    "Transfer over target size ratio",
                    "Transfer lang TTR",
                    "Target lang TTR",
                    "Transfer target TTR distance",
                ],
            }),
            Task::Mt => Some(RankingPreset {
                group_column:  "Source lang",
                metric_column: "BLEU",
                tie_break:     TieBreak::Min,
                layout:        GroupLayout::CountsBy { column: "Transfer lang" },
                engineered:    &[
                    "Overlap word-level",
                    "Overlap subword-level",
                    "Transfer lang dataset size",
                    "Target lang dataset size",
                    "Transfer over target size ratio",
                    "Transfer lang TTR",
                    "Target lang TTR",
                    "Transfer target TTR distance",
                ],
            }),
            Task::El | Task::Pos => None,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Task {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dep" => Ok(Task::Dep),
            "el"  => Ok(Task::El),
            "mt"  => Ok(Task::Mt),
            "pos" => Ok(Task::Pos),
            other => bail!("Unknown task '{other}' (expected dep, el, mt or pos)"),
        }
    }
}

// ─── Ranking presets ──────────────────────────────────────────────────────────

/// How tied metric values share a rank inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// Ties share a rank, the next distinct value takes rank + 1.
    Dense,
    /// Ties share the lowest rank, the next value skips past them.
    Min,
}

/// How training rows are partitioned into query lists for the ranker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupLayout {
    /// Consecutive lists of a fixed size.
    Uniform { size: usize },
    /// Row counts per distinct value of a column, in sorted value order.
    CountsBy { column: &'static str },
}

/// Which feature columns feed the ranker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureMode {
    /// The six distance columns only
    Lang,
    /// Engineered dataset features plus the six distances
    All,
}

impl FeatureMode {
    pub fn name(self) -> &'static str {
        match self {
            FeatureMode::Lang => "lang",
            FeatureMode::All  => "all",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingPreset {
    pub group_column:  &'static str,
    pub metric_column: &'static str,
    pub tie_break:     TieBreak,
    pub layout:        GroupLayout,
    /// Task-specific engineered features, used in `FeatureMode::All`.
    pub engineered:    &'static [&'static str],
}

impl RankingPreset {
    /// Column names for the chosen feature mode; distances come last.
    pub fn features(&self, mode: FeatureMode) -> Vec<String> {
        let mut cols: Vec<String> = match mode {
            FeatureMode::Lang => Vec::new(),
            FeatureMode::All  => self.engineered.iter().map(|c| c.to_string()).collect(),
        };
        cols.extend(DistanceKind::headers().into_iter().map(String::from));
        cols
    }
}
