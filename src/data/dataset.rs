// ============================================================
// Layer 4 — Ranking Dataset
// ============================================================
// The numeric view of a merged task table that the evaluator
// trains on: a row-major feature matrix, relevance labels, the
// leave-one-out group of every row and (for count-based layouts)
// the column whose value counts define the ranker's query lists.

use anyhow::{ensure, Result};
use std::collections::BTreeMap;

use crate::data::labeler::assign_relevance;
use crate::data::table::Table;
use crate::domain::task::{FeatureMode, GroupLayout, RankingPreset};

#[derive(Debug, Clone)]
pub struct RankingDataset {
    pub feature_names: Vec<String>,
    /// One inner Vec per row, columns in `feature_names` order
    pub features:      Vec<Vec<f64>>,
    pub labels:        Vec<f64>,
    /// Leave-one-group-out key per row (target/source language)
    pub groups:        Vec<String>,
    layout:            GroupLayout,
    layout_keys:       Vec<String>,
}

impl RankingDataset {
    /// Label the table and pull out the feature columns for `mode`.
    pub fn from_table(table: &Table, preset: &RankingPreset, mode: FeatureMode) -> Result<Self> {
        let feature_names = preset.features(mode);

        let columns = feature_names
            .iter()
            .map(|name| table.numeric_column(name))
            .collect::<Result<Vec<_>>>()?;
        let features = (0..table.len())
            .map(|row| columns.iter().map(|col| col[row]).collect())
            .collect();

        let labels = assign_relevance(
            table,
            preset.group_column,
            preset.metric_column,
            preset.tie_break,
        )?
        .into_iter()
        .map(f64::from)
        .collect();

        let groups = table
            .column(preset.group_column)?
            .into_iter()
            .map(str::to_string)
            .collect();

        let layout_keys = match preset.layout {
            GroupLayout::CountsBy { column } => table
                .column(column)?
                .into_iter()
                .map(str::to_string)
                .collect(),
            GroupLayout::Uniform { .. } => Vec::new(),
        };

        Ok(Self {
            feature_names,
            features,
            labels,
            groups,
            layout: preset.layout,
            layout_keys,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn features_at(&self, rows: &[usize]) -> Vec<Vec<f64>> {
        rows.iter().map(|&i| self.features[i].clone()).collect()
    }

    pub fn labels_at(&self, rows: &[usize]) -> Vec<f64> {
        rows.iter().map(|&i| self.labels[i]).collect()
    }

    /// Query-list sizes handed to the ranker for a set of training rows.
    ///
    /// * `Uniform { size }` – `rows.len() / size` lists of `size`; the
    ///   training set must divide evenly.
    /// * `CountsBy { .. }` – row count per distinct key among `rows`,
    ///   in sorted key order. The counts always sum to `rows.len()`, but
    ///   the lists do not follow the row order of the training set; that
    ///   is how the published mt experiment grouped its rows.
    pub fn group_sizes(&self, rows: &[usize]) -> Result<Vec<usize>> {
        match self.layout {
            GroupLayout::Uniform { size } => {
                ensure!(size > 0, "Uniform group size must be positive");
                ensure!(
                    rows.len() % size == 0,
                    "{} training rows cannot be split into lists of {size}",
                    rows.len()
                );
                Ok(vec![size; rows.len() / size])
            }
            GroupLayout::CountsBy { .. } => {
                let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
                for &i in rows {
                    *counts.entry(self.layout_keys[i].as_str()).or_default() += 1;
                }
                Ok(counts.into_values().collect())
            }
        }
    }
}
